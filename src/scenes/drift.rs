use crate::config::GameConfig;
use crate::engine::hud::Hud;
use crate::engine::input::KeyState;
use crate::engine::motion::{self, Body, BoundaryOutcome, BoundaryPolicy, Entity, World};
use crate::engine::signals::{Counter, EventRecord, Signals, Telemetry};
use crate::engine::texture::{TextureCache, TextureSpec};
use crate::engine::timer::Clock;
use crate::engine::{Color, Renderer, Size, Vec2};
use crate::scenes::{status_hud, Scene, SceneKind};
use rand::rngs::StdRng;
use rand::Rng;
use std::f64::consts::TAU;

const SHIP_SPEED: f64 = 240.0;
const ROCK_COUNT: usize = 8;
const MIN_ROCK_SPEED: f64 = 40.0;
const MAX_ROCK_SPEED: f64 = 120.0;
const WRAP: BoundaryPolicy = BoundaryPolicy::Wrap { margin: 32.0 };
// rocks never start on top of the ship
const SAFE_RADIUS: f64 = 150.0;

const SHIP_SIZE: Size = Size::new(28.0, 28.0);
const ROCK_SIZE: Size = Size::new(40.0, 40.0);

#[derive(Debug, Clone)]
struct Rock {
    entity: Entity,
    // overlap in the previous step, so a contact counts once
    touching: bool,
}

/// Ship and rocks on a torus: whatever leaves one edge comes back on the other
pub struct Drift {
    world: World,
    clock: Clock,
    telemetry: Telemetry,
    hud: Hud,
    ship: Entity,
    rocks: Vec<Rock>,
    wraps: Counter,
    collisions: Counter,
}

impl Drift {
    pub fn new(config: &GameConfig, mut rng: StdRng) -> Self {
        let world = config.world();
        let rocks = (0..ROCK_COUNT)
            .map(|_| random_rock(&mut rng, &world))
            .collect();
        Drift::with_rocks(config, rocks)
    }

    fn with_rocks(config: &GameConfig, rocks: Vec<Entity>) -> Self {
        let world = config.world();
        let mut scene = Drift {
            world,
            clock: Clock::new(),
            telemetry: Telemetry::new(),
            hud: status_hud(),
            ship: Entity::new(world.center(), SHIP_SIZE),
            rocks: rocks
                .into_iter()
                .map(|entity| Rock {
                    entity,
                    touching: false,
                })
                .collect(),
            wraps: Counter::new(),
            collisions: Counter::new(),
        };
        scene.publish();
        scene
    }

    fn publish(&mut self) {
        let touching = self.rocks.iter().filter(|rock| rock.touching).count();
        let signals = &mut self.telemetry.signals;
        signals.set("wraps", self.wraps);
        signals.set("collisions", self.collisions);
        signals.set("touching", touching);
        self.hud.sync(signals, hud_lines);
    }
}

fn random_rock(rng: &mut StdRng, world: &World) -> Entity {
    let center = world.center();
    let mut position = Vec2::new(
        rng.gen_range(0.0..world.width),
        rng.gen_range(0.0..world.height),
    );
    let offset = position - center;
    if offset.length() < SAFE_RADIUS {
        let away = if offset == Vec2::ZERO {
            Vec2::new(1.0, 0.0)
        } else {
            offset.normalized()
        };
        position = center + away * SAFE_RADIUS;
    }

    let angle = rng.gen_range(0.0..TAU);
    let speed = rng.gen_range(MIN_ROCK_SPEED..MAX_ROCK_SPEED);
    Entity {
        body: Body::new(position, Vec2::new(angle.cos(), angle.sin()) * speed),
        size: ROCK_SIZE,
        visible: true,
    }
}

fn hud_lines(signals: &Signals) -> Vec<String> {
    let number = |name| signals.number(name).unwrap_or(0.0);
    vec![
        format!("Wraps: {}", number("wraps")),
        format!("Collisions: {}", number("collisions")),
        "Arrows / WASD to steer".to_string(),
    ]
}

impl Scene for Drift {
    fn kind(&self) -> SceneKind {
        SceneKind::Drift
    }

    fn textures(&self) -> Vec<TextureSpec> {
        vec![
            TextureSpec::new("ship", 28, 28).fill_triangle(
                [Vec2::new(14.0, 0.0), Vec2::new(28.0, 28.0), Vec2::new(0.0, 28.0)],
                Color(0x00ffff),
            ),
            TextureSpec::new("rock", 40, 40)
                .fill_circle(Vec2::new(20.0, 20.0), 20.0, Color(0x8b7355))
                .fill_circle(Vec2::new(14.0, 14.0), 5.0, Color(0x6b5335)),
        ]
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f64) {
        let dt = delta_ms / 1000.0;
        self.clock.advance(delta_ms);

        // (body, rock index, landing point)
        let mut wrapped: Vec<(&str, Option<usize>, Vec2)> = Vec::new();

        self.ship.body.velocity = keystate.direction().normalized() * SHIP_SPEED;
        if motion::step(&mut self.ship.body, dt, WRAP, &self.world) == BoundaryOutcome::Wrapped {
            wrapped.push(("ship", None, self.ship.position()));
        }
        for (index, rock) in self.rocks.iter_mut().enumerate() {
            let outcome = motion::step(&mut rock.entity.body, dt, WRAP, &self.world);
            if outcome == BoundaryOutcome::Wrapped {
                wrapped.push(("rock", Some(index), rock.entity.position()));
            }
        }

        for (body, index, position) in wrapped {
            let wraps = self.wraps.increment();
            let mut record = EventRecord::new("wrapped", self.clock.now())
                .with("body", body)
                .with("wraps", wraps)
                .with_position("position", position);
            if let Some(index) = index {
                record = record.with("rock", index);
            }
            self.telemetry.emit(record);
        }

        let mut contacts = Vec::new();
        for (index, rock) in self.rocks.iter_mut().enumerate() {
            let overlapping = self.ship.overlaps(&rock.entity);
            if overlapping && !rock.touching {
                contacts.push(index);
            }
            rock.touching = overlapping;
        }
        for index in contacts {
            let collisions = self.collisions.increment();
            self.telemetry.emit(
                EventRecord::new("collision", self.clock.now())
                    .with("rock", index)
                    .with("collisions", collisions)
                    .with_position("position", self.ship.position()),
            );
        }

        self.publish();
    }

    fn draw(&self, renderer: &Renderer, textures: &TextureCache) {
        for rock in &self.rocks {
            textures.draw(renderer, "rock", rock.entity.position());
        }
        let ship_alpha = if self.rocks.iter().any(|rock| rock.touching) {
            0.5
        } else {
            1.0
        };
        textures.draw_with_alpha(renderer, "ship", self.ship.position(), ship_alpha);
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
    use crate::scenes::testing::{run, STEP_MS};
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn empty_field() -> Drift {
        Drift::with_rocks(&GameConfig::default(), Vec::new())
    }

    #[test]
    fn ship_wraps_from_right_edge_to_negative_margin() {
        let mut scene = empty_field();
        scene.ship.body.position = Vec2::new(799.0, 300.0);
        let mut keys = KeyState::new();
        keys.set_pressed("ArrowRight");

        // seventh step crosses 832
        run(&mut scene, &mut keys, 7, STEP_MS);
        assert_eq!(scene.ship.position().x, -32.0);
        assert_eq!(scene.wraps.get(), 1);

        run(&mut scene, &mut keys, 3, STEP_MS);
        assert_relative_eq!(scene.ship.position().x, -32.0 + 3.0 * 4.8, epsilon = 1e-9);
        assert_eq!(scene.wraps.get(), 1);
        assert_eq!(scene.telemetry.events.count("wrapped"), 1);
        assert_eq!(scene.telemetry.signals.number("wraps"), Some(1.0));
    }

    #[test]
    fn contact_counts_once_until_separated() {
        let rock = Entity::new(Vec2::new(500.0, 300.0), ROCK_SIZE);
        let mut scene = Drift::with_rocks(&GameConfig::default(), vec![rock]);
        scene.ship.body.position = Vec2::new(400.0, 300.0);
        let mut keys = KeyState::new();

        keys.set_pressed("ArrowRight");
        run(&mut scene, &mut keys, 60, STEP_MS);
        assert_eq!(scene.collisions.get(), 1);
        assert!(!scene.rocks[0].touching);

        keys.set_released("ArrowRight");
        keys.set_pressed("KeyA");
        run(&mut scene, &mut keys, 60, STEP_MS);
        assert_eq!(scene.collisions.get(), 2);
        assert_eq!(scene.telemetry.events.count("collision"), 2);
    }

    #[test]
    fn rocks_start_away_from_the_ship() {
        let scene = Drift::new(&GameConfig::default(), StdRng::seed_from_u64(42));
        assert_eq!(scene.rocks.len(), ROCK_COUNT);
        for rock in &scene.rocks {
            let distance = (rock.entity.position() - scene.ship.position()).length();
            assert!(distance >= SAFE_RADIUS - 1e-9);
            let speed = rock.entity.body.velocity.length();
            assert!(speed >= MIN_ROCK_SPEED - 1e-9 && speed <= MAX_ROCK_SPEED + 1e-9);
        }
    }

    #[test]
    fn every_wrap_is_logged_and_counted() {
        let mut scene = Drift::new(&GameConfig::default(), StdRng::seed_from_u64(7));
        let mut keys = KeyState::new();
        let mut last = 0;

        for _ in 0..50 {
            run(&mut scene, &mut keys, 20, STEP_MS);
            assert!(scene.wraps.get() >= last);
            last = scene.wraps.get();
        }

        // 20 s at 40+ px/s carries rocks past the edges
        assert!(last > 0);
        assert_eq!(scene.telemetry.events.count("wrapped") as u64, last);
        for rock in &scene.rocks {
            assert!(scene.world.contains(rock.entity.position(), 32.0));
        }
    }
}
