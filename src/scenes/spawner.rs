use crate::config::GameConfig;
use crate::engine::hud::Hud;
use crate::engine::input::KeyState;
use crate::engine::motion::{Entity, World};
use crate::engine::pool::Pool;
use crate::engine::signals::{Counter, EventRecord, Signals, Telemetry};
use crate::engine::texture::{TextureCache, TextureSpec};
use crate::engine::timer::{Clock, TimerId};
use crate::engine::{Color, Renderer, Size, Vec2};
use crate::scenes::{keys, status_hud, Scene, SceneKind};
use rand::rngs::StdRng;
use rand::Rng;

const POOL_SIZE: usize = 10;
const SPAWN_INTERVAL_MS: f64 = 500.0;
const MIN_FALL_SPEED: f64 = 150.0;
const MAX_FALL_SPEED: f64 = 250.0;
const SPAWN_Y: f64 = -8.0;
const RECYCLE_MARGIN: f64 = 20.0;
// keep drops off the side walls
const SIDE_PADDING: f64 = 20.0;

const DROP_SIZE: Size = Size::new(12.0, 16.0);

/// Drops spawned on a loop timer, falling until recycled below the floor
pub struct Spawner {
    world: World,
    clock: Clock,
    telemetry: Telemetry,
    hud: Hud,
    rng: StdRng,
    drops: Pool<Entity>,
    spawn_timer: TimerId,
    paused: bool,
    total_spawned: Counter,
    recycled: Counter,
}

impl Spawner {
    pub fn new(config: &GameConfig, rng: StdRng) -> Self {
        Spawner::with_capacity(config, rng, POOL_SIZE)
    }

    fn with_capacity(config: &GameConfig, rng: StdRng, capacity: usize) -> Self {
        let mut clock = Clock::new();
        let spawn_timer = clock.add_loop(SPAWN_INTERVAL_MS);
        let mut scene = Spawner {
            world: config.world(),
            clock,
            telemetry: Telemetry::new(),
            hud: status_hud(),
            rng,
            drops: Pool::new(capacity, |_| Entity::parked(DROP_SIZE)),
            spawn_timer,
            paused: false,
            total_spawned: Counter::new(),
            recycled: Counter::new(),
        };
        scene.publish();
        scene
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.clock.set_paused(self.spawn_timer, self.paused);
        let event = if self.paused { "paused" } else { "resumed" };
        self.telemetry.emit(
            EventRecord::new(event, self.clock.now())
                .with("totalSpawned", self.total_spawned.get()),
        );
    }

    fn spawn(&mut self, at_ms: f64) {
        let max_x = (self.world.width - SIDE_PADDING).max(SIDE_PADDING + 1.0);
        let x = self.rng.gen_range(SIDE_PADDING..max_x);
        let speed = self.rng.gen_range(MIN_FALL_SPEED..MAX_FALL_SPEED);

        if self
            .drops
            .spawn(Vec2::new(x, SPAWN_Y), Vec2::new(0.0, speed))
            .is_some()
        {
            let total = self.total_spawned.increment();
            self.telemetry.emit(
                EventRecord::new("spawned", at_ms)
                    .with("totalSpawned", total)
                    .with("x", x.round())
                    .with("speed", speed.round()),
            );
        }
    }

    fn publish(&mut self) {
        let signals = &mut self.telemetry.signals;
        signals.set("totalSpawned", self.total_spawned);
        signals.set("active", self.drops.active_count());
        signals.set("capacity", self.drops.capacity());
        signals.set("recycled", self.recycled);
        signals.set("dropped", self.drops.dropped_count());
        signals.set("paused", self.paused);
        self.hud.sync(signals, hud_lines);
    }
}

fn hud_lines(signals: &Signals) -> Vec<String> {
    let number = |name| signals.number(name).unwrap_or(0.0);
    let mut lines = vec![
        format!("Spawned: {}", number("totalSpawned")),
        format!("Active: {}/{}", number("active"), number("capacity")),
        format!("Recycled: {}", number("recycled")),
        format!("Dropped: {}", number("dropped")),
    ];
    if signals.flag("paused") == Some(true) {
        lines.push("PAUSED (Space to resume)".to_string());
    } else {
        lines.push("Space to pause".to_string());
    }
    lines
}

impl Scene for Spawner {
    fn kind(&self) -> SceneKind {
        SceneKind::Spawner
    }

    fn textures(&self) -> Vec<TextureSpec> {
        vec![TextureSpec::new("drop", 12, 16)
            .fill_circle(Vec2::new(6.0, 10.0), 6.0, Color(0x3399ff))
            .fill_triangle(
                [Vec2::new(6.0, 0.0), Vec2::new(11.0, 9.0), Vec2::new(1.0, 9.0)],
                Color(0x3399ff),
            )]
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f64) {
        if keystate.just_pressed(keys::SPACE) {
            self.toggle_pause();
        }

        for fired in self.clock.advance(delta_ms) {
            if fired.id == self.spawn_timer {
                self.spawn(fired.at_ms);
            }
        }

        self.drops.integrate(delta_ms / 1000.0);
        for _ in self.drops.recycle_outside(&self.world, RECYCLE_MARGIN) {
            let recycled = self.recycled.increment();
            self.telemetry.emit(
                EventRecord::new("recycled", self.clock.now()).with("recycled", recycled),
            );
        }

        self.publish();
    }

    fn draw(&self, renderer: &Renderer, textures: &TextureCache) {
        for (_, drop) in self.drops.iter_active() {
            textures.draw(renderer, "drop", drop.position());
        }
        self.hud.draw(renderer);
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::{run, tap, STEP_MS};
    use rand::SeedableRng;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn two_seconds_spawn_four_drops() {
        let mut scene = Spawner::new(&GameConfig::default(), seeded());
        let mut keys = KeyState::new();

        run(&mut scene, &mut keys, 100, STEP_MS);

        assert_eq!(scene.total_spawned.get(), 4);
        assert_eq!(scene.telemetry.signals.number("totalSpawned"), Some(4.0));
        let stamps: Vec<f64> = scene
            .telemetry
            .events
            .iter()
            .filter(|record| record.event == "spawned")
            .map(|record| record.timestamp.round())
            .collect();
        assert_eq!(stamps, vec![500.0, 1000.0, 1500.0, 2000.0]);
    }

    #[test]
    fn drops_spawn_inside_the_world() {
        let mut scene = Spawner::new(&GameConfig::default(), seeded());
        let mut keys = KeyState::new();

        run(&mut scene, &mut keys, 100, STEP_MS);

        for (_, drop) in scene.drops.iter_active() {
            let position = drop.position();
            assert!((SIDE_PADDING..=780.0).contains(&position.x));
            assert!((MIN_FALL_SPEED..MAX_FALL_SPEED).contains(&drop.body.velocity.y));
        }
    }

    #[test]
    fn exhausted_pool_counts_every_firing() {
        let mut scene = Spawner::with_capacity(&GameConfig::default(), seeded(), 2);
        let mut keys = KeyState::new();

        run(&mut scene, &mut keys, 100, STEP_MS);

        assert_eq!(scene.total_spawned.get(), 2);
        assert_eq!(scene.drops.dropped_count(), 2);
        assert_eq!(scene.total_spawned.get() + scene.drops.dropped_count(), 4);
        assert_eq!(scene.telemetry.signals.number("capacity"), Some(2.0));
        assert_eq!(scene.hud.lines()[1], format!("Active: {}/2", scene.drops.active_count()));
    }

    #[test]
    fn pause_stops_spawning_until_resumed() {
        let mut scene = Spawner::new(&GameConfig::default(), seeded());
        let mut keys = KeyState::new();

        tap(&mut scene, &mut keys, keys::SPACE);
        run(&mut scene, &mut keys, 100, STEP_MS);
        assert_eq!(scene.total_spawned.get(), 0);
        assert_eq!(scene.telemetry.signals.flag("paused"), Some(true));

        // the resume step counts: 20 + 24 * 20 = 500
        tap(&mut scene, &mut keys, keys::SPACE);
        run(&mut scene, &mut keys, 24, STEP_MS);
        assert_eq!(scene.total_spawned.get(), 1);
        assert_eq!(scene.telemetry.signals.flag("paused"), Some(false));
    }

    #[test]
    fn drops_below_the_floor_are_recycled() {
        let mut scene = Spawner::new(&GameConfig::default(), seeded());
        let mut keys = KeyState::new();

        // slowest drop needs (600 + 20 + 8) / 150 s to leave
        run(&mut scene, &mut keys, 250, STEP_MS);

        assert!(scene.recycled.get() > 0);
        assert_eq!(
            scene.drops.active_count() as u64 + scene.recycled.get(),
            scene.total_spawned.get()
        );
    }
}
