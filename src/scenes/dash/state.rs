//! The dash states are only reachable through these methods, so a
//! dash can't start mid-cooldown and a cooldown can't be skipped:
//! - PUBLIC  : DashState, DashContext and the marker types
//! - PRIVATE : the context mutators and the state fields
use crate::engine::motion::{self, Body, BoundaryPolicy, World};
use crate::engine::{Size, Vec2};

// movement consts, px/s and ms
pub const NORMAL_SPEED: f64 = 200.0;
pub const DASH_SPEED: f64 = 360.0 * 3.0;
pub const DASH_DURATION_MS: f64 = 200.0;
pub const COOLDOWN_MS: f64 = 500.0;
// 20 ms steps must end a 200 ms dash on the 10th step, not the 11th
const EPSILON: f64 = 1e-6;

#[derive(Debug, Copy, Clone)]
pub struct Ready;
#[derive(Debug, Copy, Clone)]
pub struct Dashing;
#[derive(Debug, Copy, Clone)]
pub struct Cooling;

pub enum IsDashing {
    Done(DashState<Cooling>),
    InProgress(DashState<Dashing>),
}

pub enum IsCooling {
    Done(DashState<Ready>),
    InProgress(DashState<Cooling>),
}

/// Shared data for every state :
/// - physics : body + world to stay inside
/// - timing  : milliseconds spent in the current state
#[derive(Debug, Copy, Clone)]
pub struct DashContext {
    pub body: Body,
    pub size: Size,
    pub world: World,
    pub timer_ms: f64,
}

#[derive(Debug, Copy, Clone)]
pub struct DashState<S> {
    context: DashContext,
    // marker only, never read
    _state: S,
}

impl<S> DashState<S> {
    pub fn context(&self) -> &DashContext {
        &self.context
    }
}

impl DashState<Ready> {
    pub fn new(position: Vec2, size: Size, world: World) -> Self {
        DashState {
            context: DashContext {
                body: Body::new(position, Vec2::ZERO),
                size,
                world,
                timer_ms: 0.0,
            },
            _state: Ready,
        }
    }

    pub fn update(mut self, steer: Vec2, delta_ms: f64) -> Self {
        self.context = self.context.walk(steer).update(delta_ms);
        self
    }

    /// `steer` must be non-zero, the scene only dashes on a direction press
    pub fn dash(self, steer: Vec2) -> DashState<Dashing> {
        DashState {
            context: self
                .context
                .set_velocity(steer.normalized() * DASH_SPEED)
                .on_state_transition(),
            _state: Dashing,
        }
    }
}

impl DashState<Dashing> {
    /// Returns an enum because a dash can:
    /// - End      (Done)
    /// - Continue (InProgress)
    pub fn update(mut self, delta_ms: f64) -> IsDashing {
        self.context = self.context.update(delta_ms);
        if self.context.timer_ms + EPSILON >= DASH_DURATION_MS {
            IsDashing::Done(self.end())
        } else {
            IsDashing::InProgress(self)
        }
    }

    fn end(self) -> DashState<Cooling> {
        DashState {
            context: self.context.set_velocity(Vec2::ZERO).on_state_transition(),
            _state: Cooling,
        }
    }
}

impl DashState<Cooling> {
    /// Walking is allowed while the dash recharges
    pub fn update(mut self, steer: Vec2, delta_ms: f64) -> IsCooling {
        self.context = self.context.walk(steer).update(delta_ms);
        if self.context.timer_ms + EPSILON >= COOLDOWN_MS {
            IsCooling::Done(self.recover())
        } else {
            IsCooling::InProgress(self)
        }
    }

    pub fn remaining_ms(&self) -> f64 {
        (COOLDOWN_MS - self.context.timer_ms).max(0.0)
    }

    fn recover(self) -> DashState<Ready> {
        DashState {
            context: self.context.on_state_transition(),
            _state: Ready,
        }
    }
}

impl DashContext {
    /// Advance the state timer, move, stay inside the world
    fn update(mut self, delta_ms: f64) -> Self {
        self.timer_ms += delta_ms;
        motion::step(
            &mut self.body,
            delta_ms / 1000.0,
            BoundaryPolicy::Clamp {
                inset: self.size.width * 0.5,
            },
            &self.world,
        );
        self
    }

    /// Every state starts its timer at zero
    fn on_state_transition(mut self) -> Self {
        self.timer_ms = 0.0;
        self
    }

    /// Normal movement, diagonals normalized
    fn walk(self, steer: Vec2) -> Self {
        self.set_velocity(steer.normalized() * NORMAL_SPEED)
    }

    fn set_velocity(mut self, velocity: Vec2) -> Self {
        self.body.velocity = velocity;
        self
    }
}

/// Compass name of a normalized direction, screen coordinates (down is +y)
pub fn direction_name(direction: Vec2) -> &'static str {
    let Vec2 { x, y } = direction;
    if x > 0.5 && y.abs() < 0.5 {
        "right"
    } else if x < -0.5 && y.abs() < 0.5 {
        "left"
    } else if y < -0.5 && x.abs() < 0.5 {
        "up"
    } else if y > 0.5 && x.abs() < 0.5 {
        "down"
    } else if x > 0.0 && y < 0.0 {
        "up-right"
    } else if x < 0.0 && y < 0.0 {
        "up-left"
    } else if x > 0.0 && y > 0.0 {
        "down-right"
    } else if x < 0.0 && y > 0.0 {
        "down-left"
    } else {
        "unknown"
    }
}
