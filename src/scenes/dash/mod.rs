use self::state::{
    direction_name, DashContext, DashState, IsCooling, IsDashing, COOLDOWN_MS, DASH_SPEED,
};
use crate::config::GameConfig;
use crate::engine::hud::{self, Hud};
use crate::engine::input::KeyState;
use crate::engine::motion::World;
use crate::engine::signals::{Counter, EventRecord, Signals, Telemetry};
use crate::engine::texture::{TextureCache, TextureSpec};
use crate::engine::timer::Clock;
use crate::engine::{Color, Rect, Renderer, Size, Vec2};
use crate::scenes::{status_hud, Scene, SceneKind};

mod state;

const PLAYER_SIZE: Size = Size::new(32.0, 32.0);

/// TABLE
/// ┌──────────────────── Dash cycle ─────────────────────┐
/// │                                                     │
/// │   Ready ──Dash(dir)──► Dashing ──200 ms──► Cooling  │
/// │     ▲                                        │      │
/// │     └────────────────── 500 ms ──────────────┘      │
/// │                                                     │
/// │  Dash(dir) outside Ready keeps the current state    │
/// └─────────────────────────────────────────────────────┘
pub enum Event {
    Dash(Vec2),
    Update { steer: Vec2, delta_ms: f64 },
}

#[derive(Debug, Copy, Clone)]
enum DashStateMachine {
    Ready(DashState<state::Ready>),
    Dashing(DashState<state::Dashing>),
    Cooling(DashState<state::Cooling>),
}

impl From<DashState<state::Ready>> for DashStateMachine {
    fn from(state: DashState<state::Ready>) -> Self {
        DashStateMachine::Ready(state)
    }
}

impl From<DashState<state::Dashing>> for DashStateMachine {
    fn from(state: DashState<state::Dashing>) -> Self {
        DashStateMachine::Dashing(state)
    }
}

impl From<DashState<state::Cooling>> for DashStateMachine {
    fn from(state: DashState<state::Cooling>) -> Self {
        DashStateMachine::Cooling(state)
    }
}

impl From<IsDashing> for DashStateMachine {
    fn from(is_dashing: IsDashing) -> Self {
        use IsDashing::*;
        match is_dashing {
            Done(cooling_state) => cooling_state.into(),
            InProgress(dashing_state) => dashing_state.into(),
        }
    }
}

impl From<IsCooling> for DashStateMachine {
    fn from(is_cooling: IsCooling) -> Self {
        use IsCooling::*;
        match is_cooling {
            Done(ready_state) => ready_state.into(),
            InProgress(cooling_state) => cooling_state.into(),
        }
    }
}

impl DashStateMachine {
    // consumes the old state, the machine is Copy so callers just reassign
    fn transition(self, event: Event) -> Self {
        use DashStateMachine::*;
        match (self, event) {
            (Ready(state), Event::Dash(steer)) if steer != Vec2::ZERO => state.dash(steer).into(),
            (Ready(state), Event::Update { steer, delta_ms }) => {
                state.update(steer, delta_ms).into()
            }
            (Dashing(state), Event::Update { delta_ms, .. }) => state.update(delta_ms).into(),
            (Cooling(state), Event::Update { steer, delta_ms }) => {
                state.update(steer, delta_ms).into()
            }
            _ => self,
        }
    }

    fn update(self, steer: Vec2, delta_ms: f64) -> Self {
        self.transition(Event::Update { steer, delta_ms })
    }

    fn context(&self) -> &DashContext {
        use DashStateMachine::*;
        match self {
            Ready(state) => state.context(),
            Dashing(state) => state.context(),
            Cooling(state) => state.context(),
        }
    }

    fn is_dashing(&self) -> bool {
        matches!(self, DashStateMachine::Dashing(_))
    }

    fn can_dash(&self) -> bool {
        matches!(self, DashStateMachine::Ready(_))
    }

    fn cooldown_remaining_ms(&self) -> f64 {
        match self {
            DashStateMachine::Cooling(state) => state.remaining_ms(),
            _ => 0.0,
        }
    }
}

/// Top-down mover with a short burst on every fresh direction press
pub struct Dash {
    world: World,
    clock: Clock,
    telemetry: Telemetry,
    hud: Hud,
    state: DashStateMachine,
    dash_count: Counter,
    last_direction: Option<&'static str>,
}

impl Dash {
    pub fn new(config: &GameConfig) -> Self {
        let world = config.world();
        let mut scene = Dash {
            world,
            clock: Clock::new(),
            telemetry: Telemetry::new(),
            hud: status_hud(),
            state: DashStateMachine::Ready(DashState::new(world.center(), PLAYER_SIZE, world)),
            dash_count: Counter::new(),
            last_direction: None,
        };
        scene.telemetry.emit(
            EventRecord::new("game_started", scene.clock.now())
                .with("dashSpeed", DASH_SPEED)
                .with("cooldown", COOLDOWN_MS),
        );
        scene.publish();
        scene
    }

    fn position(&self) -> Vec2 {
        self.state.context().body.position
    }

    /// Fill of the cooldown bar, 0 right after a dash, 1 when ready
    fn charge(&self) -> f64 {
        match self.state {
            DashStateMachine::Ready(_) => 1.0,
            DashStateMachine::Dashing(_) => 0.0,
            DashStateMachine::Cooling(_) => {
                1.0 - self.state.cooldown_remaining_ms() / COOLDOWN_MS
            }
        }
    }

    fn publish(&mut self) {
        let position = self.position();
        let signals = &mut self.telemetry.signals;
        signals.set("dashCount", self.dash_count);
        signals.set("isDashing", self.state.is_dashing());
        signals.set("canDash", self.state.can_dash());
        signals.set("playerX", position.x.round());
        signals.set("playerY", position.y.round());
        signals.set("lastDashDirection", self.last_direction);
        signals.set("cooldownRemaining", self.state.cooldown_remaining_ms().round());
        self.hud.sync(signals, hud_lines);
    }
}

fn hud_lines(signals: &Signals) -> Vec<String> {
    let number = |name| signals.number(name).unwrap_or(0.0);
    let status = if signals.flag("isDashing") == Some(true) {
        "DASHING!"
    } else if signals.flag("canDash") == Some(true) {
        "Ready"
    } else {
        "Cooling down..."
    };
    vec![
        format!("Status: {}", status),
        format!("Dash Count: {}", number("dashCount")),
        format!("Position: ({}, {})", number("playerX"), number("playerY")),
        format!("Cooldown: {} ms", number("cooldownRemaining")),
        "Controls: Arrow Keys or WASD to dash".to_string(),
    ]
}

impl Scene for Dash {
    fn kind(&self) -> SceneKind {
        SceneKind::Dash
    }

    fn textures(&self) -> Vec<TextureSpec> {
        vec![
            TextureSpec::solid("player", 32, 32, Color(0xffff00)),
            TextureSpec::solid("player-dash", 32, 32, Color(0xff8800)),
        ]
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f64) {
        use DashStateMachine::*;
        self.clock.advance(delta_ms);
        let steer = keystate.direction();

        if keystate.direction_just_pressed() {
            let before = self.state;
            self.state = self.state.transition(Event::Dash(steer));
            if let (Ready(_), Dashing(_)) = (before, self.state) {
                let dash_count = self.dash_count.increment();
                let direction = direction_name(steer.normalized());
                self.last_direction = Some(direction);
                self.telemetry.emit(
                    EventRecord::new("dash_started", self.clock.now())
                        .with("direction", direction)
                        .with("dashCount", dash_count)
                        .with_position("position", self.position()),
                );
            }
        }

        let before = self.state;
        self.state = self.state.update(steer, delta_ms);
        match (before, self.state) {
            (Dashing(_), Cooling(_)) => self.telemetry.emit(
                EventRecord::new("dash_ended", self.clock.now())
                    .with_position("position", self.position()),
            ),
            (Cooling(_), Ready(_)) => self.telemetry.emit(
                EventRecord::new("cooldown_complete", self.clock.now())
                    .with("totalDashes", self.dash_count.get()),
            ),
            _ => {}
        }

        self.publish();
    }

    fn draw(&self, renderer: &Renderer, textures: &TextureCache) {
        let key = if self.state.is_dashing() {
            "player-dash"
        } else {
            "player"
        };
        textures.draw(renderer, key, self.position());

        let fill = if self.state.can_dash() {
            Color(0x00ff00)
        } else {
            Color(0xff0000)
        };
        hud::draw_bar(
            renderer,
            &Rect::from_xywh(16.0, 130.0, 200.0, 20.0),
            self.charge(),
            fill,
            Color(0x333333),
        );
        renderer.stroke_rect(&self.world.bounds(), Color(0x555555), 2.0);
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
    use crate::engine::signals::SignalValue;
    use approx::assert_relative_eq;

    fn scene() -> Dash {
        Dash::new(&GameConfig::default())
    }

    #[test]
    fn announces_itself_on_start() {
        let scene = scene();
        let started = scene.telemetry.events.last("game_started").unwrap();
        assert_eq!(*started.field("dashSpeed").unwrap(), 1080.0);
        assert_eq!(*started.field("cooldown").unwrap(), 500.0);
        assert_eq!(scene.telemetry.signals.flag("canDash"), Some(true));
        assert_eq!(scene.telemetry.signals.get("lastDashDirection"), Some(&SignalValue::Null));
    }

    #[test]
    fn full_dash_cycle() {
        let mut scene = scene();
        let mut keys = KeyState::new();

        tap(&mut scene, &mut keys, "ArrowRight");
        let started = scene.telemetry.events.last("dash_started").unwrap();
        assert_eq!(*started.field("direction").unwrap(), "right");
        assert_eq!(*started.field("dashCount").unwrap(), 1);
        assert_eq!(scene.telemetry.signals.flag("isDashing"), Some(true));
        assert_eq!(scene.telemetry.signals.text("lastDashDirection"), Some("right"));

        run(&mut scene, &mut keys, 8, STEP_MS);
        assert!(scene.state.is_dashing());
        run(&mut scene, &mut keys, 1, STEP_MS);
        assert!(!scene.state.is_dashing());
        assert_eq!(scene.telemetry.events.count("dash_ended"), 1);
        assert_relative_eq!(scene.position().x, 616.0, epsilon = 1e-9);
        assert_eq!(scene.telemetry.signals.flag("canDash"), Some(false));
        assert_eq!(scene.telemetry.signals.number("cooldownRemaining"), Some(500.0));

        run(&mut scene, &mut keys, 24, STEP_MS);
        assert!(!scene.state.can_dash());
        run(&mut scene, &mut keys, 1, STEP_MS);
        assert!(scene.state.can_dash());
        let complete = scene.telemetry.events.last("cooldown_complete").unwrap();
        assert_eq!(*complete.field("totalDashes").unwrap(), 1);
    }

    #[test]
    fn presses_during_dash_and_cooldown_are_ignored() {
        let mut scene = scene();
        let mut keys = KeyState::new();

        tap(&mut scene, &mut keys, "KeyD");
        tap(&mut scene, &mut keys, "KeyA");
        run(&mut scene, &mut keys, 10, STEP_MS);
        tap(&mut scene, &mut keys, "KeyW");

        assert_eq!(scene.dash_count.get(), 1);
        assert_eq!(scene.telemetry.events.count("dash_started"), 1);
    }

    #[test]
    fn holding_a_direction_dashes_once_then_walks() {
        let mut scene = scene();
        let mut keys = KeyState::new();
        keys.set_pressed("ArrowRight");

        // dash (10 steps) + cooldown (25 steps) + 10 walking steps
        run(&mut scene, &mut keys, 45, STEP_MS);

        assert_eq!(scene.dash_count.get(), 1);
        assert!(scene.state.can_dash());
        // 216 px dash, then 4 px per step walking through cooldown and after
        assert_relative_eq!(scene.position().x, 400.0 + 216.0 + 35.0 * 4.0, epsilon = 1e-6);
        assert_eq!(scene.telemetry.signals.text("lastDashDirection"), Some("right"));
    }

    #[test]
    fn diagonal_dash_is_named_by_quadrant() {
        let mut scene = scene();
        let mut keys = KeyState::new();
        keys.set_pressed("ArrowUp");
        keys.set_pressed("ArrowLeft");

        scene.update(&keys, STEP_MS);

        assert_eq!(scene.last_direction, Some("up-left"));
    }
}
