// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                           Scene catalogue                                │
// ├──────────────┬───────────────────────────────┬───────────────────────────┤
// │ Scene        │ Engine pieces it leans on     │ Headline signal           │
// ├──────────────┼───────────────────────────────┼───────────────────────────┤
// │ shooter      │ Pool, Recycle, delayed_call   │ fired / recycled          │
// │ spawner      │ Pool, add_loop, rand          │ totalSpawned              │
// │ drift        │ Wrap, AABB                    │ wraps / collisions        │
// │ platformer   │ gravity, one-way landing      │ score / jumps             │
// │ dash         │ typestate machine, Clamp      │ dashCount                 │
// │ health       │ Meter, Tweens                 │ health / hits             │
// └──────────────┴───────────────────────────────┴───────────────────────────┘
use crate::config::GameConfig;
use crate::engine::hud::Hud;
use crate::engine::input::KeyState;
use crate::engine::signals::Telemetry;
use crate::engine::texture::{TextureCache, TextureSpec};
use crate::engine::{Renderer, Vec2};
use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod dash;
pub mod drift;
pub mod health;
pub mod platformer;
pub mod shooter;
pub mod spawner;

/// `KeyboardEvent.code` values the scenes listen to, beyond the direction table
pub mod keys {
    pub const SPACE: &str = "Space";
    pub const ARROW_UP: &str = "ArrowUp";
    pub const KEY_W: &str = "KeyW";
    pub const KEY_H: &str = "KeyH";
    pub const KEY_R: &str = "KeyR";
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKind {
    Shooter,
    Spawner,
    Drift,
    #[default]
    Platformer,
    Dash,
    Health,
}

impl SceneKind {
    pub const ALL: [SceneKind; 6] = [
        SceneKind::Shooter,
        SceneKind::Spawner,
        SceneKind::Drift,
        SceneKind::Platformer,
        SceneKind::Dash,
        SceneKind::Health,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Shooter => "shooter",
            SceneKind::Spawner => "spawner",
            SceneKind::Drift => "drift",
            SceneKind::Platformer => "platformer",
            SceneKind::Dash => "dash",
            SceneKind::Health => "health",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        SceneKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| anyhow!("unknown scene '{}'", s))
    }
}

/// One self-contained demo: owns its entities, clock and telemetry
pub trait Scene {
    fn kind(&self) -> SceneKind;
    /// Sprites to rasterize before the first frame
    fn textures(&self) -> Vec<TextureSpec>;
    /// One fixed step of `delta_ms` milliseconds
    fn update(&mut self, keystate: &KeyState, delta_ms: f64);
    fn draw(&self, renderer: &Renderer, textures: &TextureCache);
    fn telemetry(&self) -> &Telemetry;
    fn telemetry_mut(&mut self) -> &mut Telemetry;
}

pub fn create(kind: SceneKind, config: &GameConfig, rng: StdRng) -> Box<dyn Scene> {
    match kind {
        SceneKind::Shooter => Box::new(shooter::Shooter::new(config)),
        SceneKind::Spawner => Box::new(spawner::Spawner::new(config, rng)),
        SceneKind::Drift => Box::new(drift::Drift::new(config, rng)),
        SceneKind::Platformer => Box::new(platformer::Platformer::new(config)),
        SceneKind::Dash => Box::new(dash::Dash::new(config)),
        SceneKind::Health => Box::new(health::Health::new(config)),
    }
}

/// Status text in the top left corner, where every scene keeps it
pub(crate) fn status_hud() -> Hud {
    Hud::new(Vec2::new(16.0, 14.0))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Scene;
    use crate::engine::input::KeyState;

    pub const STEP_MS: f64 = 20.0;

    /// Runs `steps` fixed steps with whatever is held in `keys`
    pub fn run(scene: &mut impl Scene, keys: &mut KeyState, steps: usize, delta_ms: f64) {
        for _ in 0..steps {
            scene.update(keys, delta_ms);
            keys.end_frame();
        }
    }

    /// Press and release `code` around a single step
    pub fn tap(scene: &mut impl Scene, keys: &mut KeyState, code: &str) {
        keys.set_pressed(code);
        scene.update(keys, STEP_MS);
        keys.end_frame();
        keys.set_released(code);
    }
}
