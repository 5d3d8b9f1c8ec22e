use crate::config::GameConfig;
use crate::engine::hud::Hud;
use crate::engine::input::{Direction, KeyState};
use crate::engine::motion::{BoundaryPolicy, Entity, World};
use crate::engine::signals::{Counter, EventRecord, Signals, Telemetry};
use crate::engine::texture::{TextureCache, TextureSpec};
use crate::engine::timer::Clock;
use crate::engine::{Color, Rect, Renderer, Size, TextStyle, Vec2};
use crate::scenes::{keys, status_hud, Scene, SceneKind};

const MOVE_SPEED: f64 = 220.0;
const JUMP_VELOCITY: f64 = -480.0; // negative because top left is origin
const MAX_JUMPS: u32 = 2;
const COIN_VALUE: u64 = 10;
const GROUND_HEIGHT: f64 = 40.0;
// a body resting on a platform sits exactly on its top, floats drift a hair
const LANDING_SLACK: f64 = 0.5;

const PLAYER_SIZE: Size = Size::new(28.0, 40.0);
const COIN_SIZE: Size = Size::new(20.0, 20.0);

const JUMP_KEYS: [&str; 3] = [keys::ARROW_UP, keys::KEY_W, keys::SPACE];

/// Where the player's feet are
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Footing {
    Grounded,
    Airborne { jumps_used: u32 },
}

#[derive(Debug, Clone)]
struct Coin {
    entity: Entity,
    collected: bool,
}

/// Gravity, one-way platforms, a double jump and coins to pick up
pub struct Platformer {
    world: World,
    clock: Clock,
    telemetry: Telemetry,
    hud: Hud,
    gravity: f64,
    player: Entity,
    footing: Footing,
    /// Ground first, then the floating platforms
    platforms: Vec<Rect>,
    coins: Vec<Coin>,
    score: Counter,
    jumps: Counter,
    collected: Counter,
    all_collected: bool,
}

impl Platformer {
    pub fn new(config: &GameConfig) -> Self {
        let world = config.world();
        let (w, h) = (world.width, world.height);
        let ground = Rect::from_xywh(0.0, h - GROUND_HEIGHT, w, GROUND_HEIGHT);
        let platforms = vec![
            ground,
            Rect::from_xywh(w * 0.15, h - 160.0, 160.0, 16.0),
            Rect::from_xywh(w * 0.45, h - 260.0, 160.0, 16.0),
            Rect::from_xywh(w * 0.70, h - 360.0, 160.0, 16.0),
        ];
        // one coin above every floating platform, two along the ground
        let mut coin_spots: Vec<Vec2> = platforms[1..]
            .iter()
            .map(|platform| Vec2::new(platform.center().x, platform.top() - 30.0))
            .collect();
        coin_spots.push(Vec2::new(w * 0.35, ground.top() - 30.0));
        coin_spots.push(Vec2::new(w * 0.9, ground.top() - 30.0));

        let spawn = Vec2::new(w * 0.1, ground.top() - PLAYER_SIZE.height * 0.5);
        let mut scene = Platformer {
            world,
            clock: Clock::new(),
            telemetry: Telemetry::new(),
            hud: status_hud().with_style(TextStyle {
                color: Color(0xffd700),
                ..TextStyle::default()
            }),
            gravity: config.gravity.y,
            player: Entity::new(spawn, PLAYER_SIZE),
            footing: Footing::Grounded,
            platforms,
            coins: coin_spots
                .into_iter()
                .map(|spot| Coin {
                    entity: Entity::new(spot, COIN_SIZE),
                    collected: false,
                })
                .collect(),
            score: Counter::new(),
            jumps: Counter::new(),
            collected: Counter::new(),
            all_collected: false,
        };
        scene.publish();
        scene
    }

    fn try_jump(&mut self) {
        let jump_number = match self.footing {
            Footing::Grounded => 1,
            Footing::Airborne { jumps_used } if jumps_used < MAX_JUMPS => jumps_used + 1,
            Footing::Airborne { .. } => return,
        };
        self.player.body.velocity.y = JUMP_VELOCITY;
        self.footing = Footing::Airborne {
            jumps_used: jump_number,
        };
        let jumps = self.jumps.increment();
        self.telemetry.emit(
            EventRecord::new("jump", self.clock.now())
                .with("jumps", jumps)
                .with("jumpNumber", jump_number)
                .with_position("position", self.player.position()),
        );
    }

    /// Lands on the first platform the feet crossed from above this step.
    /// Coming from below passes through.
    fn resolve_landing(&mut self, previous_bottom: f64) -> bool {
        if self.player.body.velocity.y < 0.0 {
            return false;
        }
        let bounds = self.player.bounds();
        let surface = self.platforms.iter().find(|platform| {
            bounds.right() > platform.left()
                && bounds.left() < platform.right()
                && previous_bottom <= platform.top() + LANDING_SLACK
                && bounds.bottom() >= platform.top()
        });
        match surface {
            Some(platform) => {
                self.player.body.position.y = platform.top() - self.player.size.height * 0.5;
                self.player.body.velocity.y = 0.0;
                true
            }
            None => false,
        }
    }

    fn collect_coins(&mut self) {
        let player = self.player.bounds();
        for coin in self.coins.iter_mut().filter(|coin| !coin.collected) {
            if !player.intersects(&coin.entity.bounds()) {
                continue;
            }
            coin.collected = true;
            coin.entity.visible = false;
            let score = self.score.add(COIN_VALUE);
            let collected = self.collected.increment();
            self.telemetry.emit(
                EventRecord::new("coin_collected", self.clock.now())
                    .with("score", score)
                    .with("collected", collected)
                    .with_position("position", coin.entity.position()),
            );
        }

        if !self.all_collected && self.coins.iter().all(|coin| coin.collected) {
            self.all_collected = true;
            self.telemetry.emit(
                EventRecord::new("all_collected", self.clock.now())
                    .with("score", self.score.get())
                    .with("jumps", self.jumps.get()),
            );
        }
    }

    fn is_grounded(&self) -> bool {
        self.footing == Footing::Grounded
    }

    fn publish(&mut self) {
        let grounded = self.is_grounded();
        let position = self.player.position();
        let signals = &mut self.telemetry.signals;
        signals.set("score", self.score);
        signals.set("jumps", self.jumps);
        signals.set("collected", self.collected);
        signals.set("grounded", grounded);
        signals.set("playerX", position.x.round());
        signals.set("playerY", position.y.round());
        self.hud.sync(signals, hud_lines);
    }
}

fn hud_lines(signals: &Signals) -> Vec<String> {
    let number = |name| signals.number(name).unwrap_or(0.0);
    vec![
        format!("Score: {}", number("score")),
        format!("Coins: {}", number("collected")),
        format!("Jumps: {}", number("jumps")),
        "Left/Right to move, Up/W/Space to jump (twice)".to_string(),
    ]
}

impl Scene for Platformer {
    fn kind(&self) -> SceneKind {
        SceneKind::Platformer
    }

    fn textures(&self) -> Vec<TextureSpec> {
        vec![
            TextureSpec::solid("player", 28, 40, Color(0x4488ff))
                .fill_rect(Rect::from_xywh(16.0, 8.0, 6.0, 6.0), Color::WHITE),
            TextureSpec::new("coin", 20, 20)
                .fill_circle(Vec2::new(10.0, 10.0), 10.0, Color(0xffd700))
                .fill_circle(Vec2::new(10.0, 10.0), 5.0, Color(0xffa500)),
        ]
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f64) {
        let dt = delta_ms / 1000.0;
        self.clock.advance(delta_ms);

        let mut run = 0.0;
        if keystate.is_held(Direction::Left) {
            run -= MOVE_SPEED;
        }
        if keystate.is_held(Direction::Right) {
            run += MOVE_SPEED;
        }
        self.player.body.velocity.x = run;

        if keystate.any_just_pressed(&JUMP_KEYS) {
            self.try_jump();
        }

        self.player.body.velocity.y += self.gravity * dt;
        let previous_bottom = self.player.bounds().bottom();
        self.player.body.integrate(dt);

        if self.resolve_landing(previous_bottom) {
            if let Footing::Airborne { jumps_used } = self.footing {
                self.telemetry.emit(
                    EventRecord::new("landed", self.clock.now())
                        .with("jumpsUsed", jumps_used)
                        .with_position("position", self.player.position()),
                );
            }
            self.footing = Footing::Grounded;
        } else if self.is_grounded() {
            // walked off a ledge, the fall takes the first jump
            self.footing = Footing::Airborne { jumps_used: 1 };
        }

        BoundaryPolicy::Clamp {
            inset: PLAYER_SIZE.width * 0.5,
        }
        .apply(&mut self.player.body, &self.world);

        self.collect_coins();
        self.publish();
    }

    fn draw(&self, renderer: &Renderer, textures: &TextureCache) {
        for (index, platform) in self.platforms.iter().enumerate() {
            let color = if index == 0 {
                Color(0x2e7d32)
            } else {
                Color(0x8d6e63)
            };
            renderer.fill_rect(platform, color);
        }
        for coin in self.coins.iter().filter(|coin| coin.entity.visible) {
            textures.draw(renderer, "coin", coin.entity.position());
        }
        textures.draw(renderer, "player", self.player.position());
        self.hud.draw(renderer);
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }
}
