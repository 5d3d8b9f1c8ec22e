use crate::engine::pool::Poolable;
use crate::engine::{Rect, Size, Vec2};

/// Where released entities wait, well outside any world
pub const PARKED: Vec2 = Vec2::new(-10_000.0, -10_000.0);

/// Visible play area, origin top left
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct World {
    pub width: f64,
    pub height: f64,
}

impl World {
    pub const fn new(width: f64, height: f64) -> Self {
        World { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_xywh(0.0, 0.0, self.width, self.height)
    }

    /// Inside the world grown by `margin` on every side
    pub fn contains(&self, point: Vec2, margin: f64) -> bool {
        point.x >= -margin
            && point.x <= self.width + margin
            && point.y >= -margin
            && point.y <= self.height + margin
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Body {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Body { position, velocity }
    }

    pub fn integrate(&mut self, dt: f64) {
        self.position = integrate(self.position, self.velocity, dt);
    }
}

/// `position + velocity * dt`, single step, no substeps
pub fn integrate(position: Vec2, velocity: Vec2, dt: f64) -> Vec2 {
    Vec2::new(position.x + velocity.x * dt, position.y + velocity.y * dt)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BoundaryPolicy {
    /// No boundary handling
    Free,
    /// Stay inside `[inset, size - inset]`; the velocity component that hit an
    /// edge is zeroed
    Clamp { inset: f64 },
    /// Teleport to the opposite edge once past `margin`
    Wrap { margin: f64 },
    /// Report out of bounds once past `margin`, the owner recycles
    Recycle { margin: f64 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoundaryOutcome {
    Inside,
    Clamped,
    Wrapped,
    OutOfBounds,
}

impl BoundaryPolicy {
    pub fn apply(&self, body: &mut Body, world: &World) -> BoundaryOutcome {
        match *self {
            BoundaryPolicy::Free => BoundaryOutcome::Inside,
            BoundaryPolicy::Clamp { inset } => clamp(body, world, inset),
            BoundaryPolicy::Wrap { margin } => wrap(body, world, margin),
            BoundaryPolicy::Recycle { margin } => {
                if world.contains(body.position, margin) {
                    BoundaryOutcome::Inside
                } else {
                    BoundaryOutcome::OutOfBounds
                }
            }
        }
    }
}

fn clamp(body: &mut Body, world: &World, inset: f64) -> BoundaryOutcome {
    let mut clamped = false;
    let (min_x, max_x) = (inset, world.width - inset);
    let (min_y, max_y) = (inset, world.height - inset);

    if body.position.x < min_x || body.position.x > max_x {
        body.position.x = body.position.x.clamp(min_x, max_x);
        body.velocity.x = 0.0;
        clamped = true;
    }
    if body.position.y < min_y || body.position.y > max_y {
        body.position.y = body.position.y.clamp(min_y, max_y);
        body.velocity.y = 0.0;
        clamped = true;
    }

    if clamped {
        BoundaryOutcome::Clamped
    } else {
        BoundaryOutcome::Inside
    }
}

// one teleport per axis per step, evaluated on the already integrated position
fn wrap(body: &mut Body, world: &World, margin: f64) -> BoundaryOutcome {
    let mut wrapped = false;
    let position = &mut body.position;

    if position.x < -margin {
        position.x = world.width + margin;
        wrapped = true;
    } else if position.x > world.width + margin {
        position.x = -margin;
        wrapped = true;
    }
    if position.y < -margin {
        position.y = world.height + margin;
        wrapped = true;
    } else if position.y > world.height + margin {
        position.y = -margin;
        wrapped = true;
    }

    if wrapped {
        BoundaryOutcome::Wrapped
    } else {
        BoundaryOutcome::Inside
    }
}

/// Integrate, then apply the boundary policy
pub fn step(body: &mut Body, dt: f64, policy: BoundaryPolicy, world: &World) -> BoundaryOutcome {
    body.integrate(dt);
    policy.apply(body, world)
}

/// Anything that moves and can be pooled: player, enemy, bullet, pickup
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub body: Body,
    pub size: Size,
    pub visible: bool,
}

impl Entity {
    pub fn new(position: Vec2, size: Size) -> Self {
        Entity {
            body: Body::new(position, Vec2::ZERO),
            size,
            visible: true,
        }
    }

    /// Hidden and parked, the state a pool pre-allocates
    pub fn parked(size: Size) -> Self {
        Entity {
            body: Body::new(PARKED, Vec2::ZERO),
            size,
            visible: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.body.position, self.size)
    }

    pub fn overlaps(&self, other: &Entity) -> bool {
        self.bounds().intersects(&other.bounds())
    }
}

impl Poolable for Entity {
    fn reset(&mut self) {
        self.body.velocity = Vec2::ZERO;
        self.body.position = PARKED;
        self.visible = false;
    }
}
