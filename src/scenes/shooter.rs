use crate::config::GameConfig;
use crate::engine::hud::Hud;
use crate::engine::input::KeyState;
use crate::engine::motion::{self, BoundaryPolicy, Entity, World};
use crate::engine::pool::Pool;
use crate::engine::signals::{Counter, EventRecord, Signals, Telemetry};
use crate::engine::texture::{TextureCache, TextureSpec};
use crate::engine::timer::{Clock, TimerId};
use crate::engine::{Color, Rect, Renderer, Size, Vec2};
use crate::scenes::{keys, status_hud, Scene, SceneKind};

const POOL_SIZE: usize = 20;
const BULLET_SPEED: f64 = 500.0;
const FIRE_COOLDOWN_MS: f64 = 200.0;
const PLAYER_SPEED: f64 = 300.0;
const PLAYER_X: f64 = 60.0;
const RECYCLE_MARGIN: f64 = 20.0;
// bullets leave from the ship's nose
const MUZZLE_OFFSET: Vec2 = Vec2::new(20.0, 0.0);

const PLAYER_SIZE: Size = Size::new(32.0, 32.0);
const BULLET_SIZE: Size = Size::new(10.0, 4.0);

/// Ship on the left edge firing pooled bullets to the right
pub struct Shooter {
    world: World,
    clock: Clock,
    telemetry: Telemetry,
    hud: Hud,
    player: Entity,
    bullets: Pool<Entity>,
    cooldown: Option<TimerId>,
    fired: Counter,
    recycled: Counter,
}

impl Shooter {
    pub fn new(config: &GameConfig) -> Self {
        Shooter::with_capacity(config, POOL_SIZE)
    }

    fn with_capacity(config: &GameConfig, capacity: usize) -> Self {
        let world = config.world();
        let mut scene = Shooter {
            world,
            clock: Clock::new(),
            telemetry: Telemetry::new(),
            hud: status_hud(),
            player: Entity::new(Vec2::new(PLAYER_X, world.height * 0.5), PLAYER_SIZE),
            bullets: Pool::new(capacity, |_| Entity::parked(BULLET_SIZE)),
            cooldown: None,
            fired: Counter::new(),
            recycled: Counter::new(),
        };
        scene.publish();
        scene
    }

    fn can_fire(&self) -> bool {
        self.cooldown.is_none()
    }

    fn fire(&mut self) {
        // the cooldown covers attempts, an exhausted pool doesn't retry every step
        self.cooldown = Some(self.clock.delayed_call(FIRE_COOLDOWN_MS));

        let muzzle = self.player.position() + MUZZLE_OFFSET;
        if self
            .bullets
            .spawn(muzzle, Vec2::new(BULLET_SPEED, 0.0))
            .is_some()
        {
            let fired = self.fired.increment();
            self.telemetry.emit(
                EventRecord::new("bullet_fired", self.clock.now())
                    .with("fired", fired)
                    .with("active", self.bullets.active_count())
                    .with_position("position", muzzle),
            );
        }
    }

    fn publish(&mut self) {
        let signals = &mut self.telemetry.signals;
        signals.set("fired", self.fired);
        signals.set("recycled", self.recycled);
        signals.set("active", self.bullets.active_count());
        signals.set("capacity", self.bullets.capacity());
        signals.set("dropped", self.bullets.dropped_count());
        signals.set("canFire", self.cooldown.is_none());
        self.hud.sync(signals, hud_lines);
    }
}

fn hud_lines(signals: &Signals) -> Vec<String> {
    let number = |name| signals.number(name).unwrap_or(0.0);
    vec![
        format!("Fired: {}", number("fired")),
        format!("Active: {}/{}", number("active"), number("capacity")),
        format!("Recycled: {}", number("recycled")),
        format!("Dropped: {}", number("dropped")),
        "Up/Down to move, hold Space to fire".to_string(),
    ]
}

impl Scene for Shooter {
    fn kind(&self) -> SceneKind {
        SceneKind::Shooter
    }

    fn textures(&self) -> Vec<TextureSpec> {
        vec![
            TextureSpec::new("player", 32, 32).fill_triangle(
                [Vec2::new(0.0, 0.0), Vec2::new(32.0, 16.0), Vec2::new(0.0, 32.0)],
                Color(0x00ff88),
            ),
            TextureSpec::solid("bullet", 10, 4, Color(0xffff00)),
        ]
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f64) {
        let dt = delta_ms / 1000.0;

        for fired in self.clock.advance(delta_ms) {
            if self.cooldown == Some(fired.id) {
                self.cooldown = None;
            }
        }

        self.player.body.velocity = Vec2::new(0.0, keystate.direction().y * PLAYER_SPEED);
        motion::step(
            &mut self.player.body,
            dt,
            BoundaryPolicy::Clamp {
                inset: PLAYER_SIZE.height * 0.5,
            },
            &self.world,
        );
        // only the vertical axis moves
        self.player.body.position.x = PLAYER_X;

        if keystate.is_pressed(keys::SPACE) && self.can_fire() {
            self.fire();
        }

        self.bullets.integrate(dt);
        for _ in self.bullets.recycle_outside(&self.world, RECYCLE_MARGIN) {
            let recycled = self.recycled.increment();
            self.telemetry.emit(
                EventRecord::new("bullet_recycled", self.clock.now())
                    .with("recycled", recycled)
                    .with("active", self.bullets.active_count()),
            );
        }

        self.publish();
    }

    fn draw(&self, renderer: &Renderer, textures: &TextureCache) {
        textures.draw(renderer, "player", self.player.position());
        for (_, bullet) in self.bullets.iter_active() {
            textures.draw(renderer, "bullet", bullet.position());
        }
        renderer.stroke_rect(
            &Rect::from_xywh(0.0, 0.0, self.world.width, self.world.height),
            Color(0x333355),
            2.0,
        );
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
    use crate::scenes::testing::run;

    const STEP: f64 = 10.0;

    fn holding_space() -> KeyState {
        let mut keys = KeyState::new();
        keys.set_pressed(keys::SPACE);
        keys
    }

    #[test]
    fn held_fire_respects_cooldown() {
        let mut scene = Shooter::new(&GameConfig::default());
        let mut keys = holding_space();

        run(&mut scene, &mut keys, 100, STEP);

        // shots at 10, 210, 410, 610, 810 ms
        assert_eq!(scene.fired.get(), 5);
        assert_eq!(scene.telemetry.events.count("bullet_fired"), 5);
        assert_eq!(scene.telemetry.signals.number("fired"), Some(5.0));
    }

    #[test]
    fn bullets_past_the_right_edge_are_recycled() {
        let mut scene = Shooter::new(&GameConfig::default());
        let mut keys = holding_space();

        run(&mut scene, &mut keys, 200, STEP);

        assert_eq!(scene.fired.get(), 10);
        // first three bullets covered 80 -> 820+ within two seconds
        assert_eq!(scene.recycled.get(), 3);
        assert_eq!(
            scene.bullets.active_count() as u64 + scene.recycled.get(),
            scene.fired.get()
        );
        assert!(scene
            .bullets
            .iter_active()
            .all(|(_, bullet)| bullet.position().x <= 820.0));
    }

    #[test]
    fn exhausted_pool_drops_shots() {
        let mut scene = Shooter::with_capacity(&GameConfig::default(), 2);
        let mut keys = holding_space();

        run(&mut scene, &mut keys, 100, STEP);

        assert_eq!(scene.fired.get(), 2);
        assert_eq!(scene.bullets.active_count(), 2);
        assert_eq!(scene.bullets.dropped_count(), 3);
        assert_eq!(scene.telemetry.signals.number("dropped"), Some(3.0));
        assert_eq!(scene.hud.lines()[1], "Active: 2/2");
    }

    #[test]
    fn player_is_clamped_vertically() {
        let mut scene = Shooter::new(&GameConfig::default());
        let mut keys = KeyState::new();
        keys.set_pressed("ArrowUp");

        run(&mut scene, &mut keys, 200, STEP);

        assert_eq!(scene.player.position(), Vec2::new(PLAYER_X, 16.0));
        assert_eq!(scene.fired.get(), 0);
    }

    #[test]
    fn counters_never_decrease() {
        let mut scene = Shooter::with_capacity(&GameConfig::default(), 4);
        let mut keys = KeyState::new();
        let (mut fired, mut recycled) = (0, 0);

        for step in 0..600 {
            if step % 50 == 0 {
                keys.set_pressed(keys::SPACE);
            } else if step % 50 == 30 {
                keys.set_released(keys::SPACE);
            }
            scene.update(&keys, STEP);
            keys.end_frame();

            assert!(scene.fired.get() >= fired);
            assert!(scene.recycled.get() >= recycled);
            assert!(scene.bullets.active_count() <= scene.bullets.capacity());
            fired = scene.fired.get();
            recycled = scene.recycled.get();
        }
        assert!(recycled > 0);
    }
}
