use crate::browser;
use crate::engine::motion::World;
use crate::engine::{Color, Vec2};
use crate::scenes::SceneKind;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Startup settings, read once from `config.json`. Every key is optional.
///
/// ```json
/// { "width": 800, "height": 600, "background": "#1a1a2e",
///   "gravity": { "x": 0, "y": 800 }, "entryScene": "platformer", "seed": 42 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,
    pub background: Color,
    /// px/s², only scenes with falling bodies read it
    pub gravity: Vec2,
    pub entry_scene: SceneKind,
    /// Fixed seed for reproducible runs, OS entropy when absent
    pub seed: Option<u64>,
    pub publish_signals: bool,
    /// Property of `window` the signals are published on
    pub signals_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: 800.0,
            height: 600.0,
            background: Color(0x1a1a2e),
            gravity: Vec2::new(0.0, 800.0),
            entry_scene: SceneKind::default(),
            seed: None,
            publish_signals: true,
            signals_key: "__signals__".to_string(),
        }
    }
}

impl GameConfig {
    pub const PATH: &'static str = "config.json";

    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json).context("parsing game config")?;
        config.validate()?;
        Ok(config)
    }

    /// Fetches and validates `path`
    pub async fn load(path: &str) -> Result<Self> {
        let config: GameConfig = browser::fetch_json(path)
            .await
            .with_context(|| format!("loading game config from : {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.width) || !positive(self.height) {
            return Err(anyhow!(
                "world size must be positive, got {}x{}",
                self.width,
                self.height
            ));
        }
        if !self.gravity.x.is_finite() || !self.gravity.y.is_finite() {
            return Err(anyhow!("gravity must be finite, got {:?}", self.gravity));
        }
        if self.signals_key.is_empty() {
            return Err(anyhow!("signalsKey must not be empty"));
        }
        Ok(())
    }

    pub fn world(&self) -> World {
        World::new(self.width, self.height)
    }

    /// Same config, different entry scene (the `?scene=` override)
    pub fn with_scene(mut self, scene: SceneKind) -> Self {
        self.entry_scene = scene;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.world(), World::new(800.0, 600.0));
    }

    #[test]
    fn camel_case_keys_override_defaults() {
        let config = GameConfig::from_json(
            r##"{
                "width": 640,
                "background": "#000000",
                "gravity": { "x": 0, "y": 300 },
                "entryScene": "dash",
                "seed": 7,
                "publishSignals": false
            }"##,
        )
        .unwrap();

        assert_eq!(config.width, 640.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.background, Color::BLACK);
        assert_eq!(config.gravity, Vec2::new(0.0, 300.0));
        assert_eq!(config.entry_scene, SceneKind::Dash);
        assert_eq!(config.seed, Some(7));
        assert!(!config.publish_signals);
        assert_eq!(config.signals_key, "__signals__");
    }

    #[test]
    fn unknown_scene_is_an_error() {
        assert!(GameConfig::from_json(r#"{ "entryScene": "pinball" }"#).is_err());
    }

    #[test]
    fn bad_color_is_an_error() {
        assert!(GameConfig::from_json(r#"{ "background": "navy" }"#).is_err());
    }

    #[test]
    fn non_positive_size_is_rejected() {
        let err = GameConfig::from_json(r#"{ "width": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("positive"));
        assert!(GameConfig::from_json(r#"{ "height": -10 }"#).is_err());
    }

    #[test]
    fn non_finite_gravity_is_rejected() {
        let config = GameConfig {
            gravity: Vec2::new(0.0, f64::NAN),
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn scene_override_keeps_the_rest() {
        let config = GameConfig::default().with_scene(SceneKind::Health);
        assert_eq!(config.entry_scene, SceneKind::Health);
        assert_eq!(config.width, 800.0);
    }
}
