use crate::browser;
use crate::config::GameConfig;
use crate::engine::input::KeyState;
use crate::engine::texture::TextureCache;
use crate::engine::{Game, Rect, Renderer};
use crate::scenes::{self, Scene, SceneKind};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ==================== Arcade ====================
/// Browser host for one scene:
/// - Loading : nothing fetched yet
/// - Loaded  : config applied, textures generated, scene running
pub enum Arcade {
    Loading,
    Loaded(Stage),
}

impl Arcade {
    pub fn new() -> Self {
        Arcade::Loading
    }

    /// A missing or broken `config.json` is not fatal
    async fn load_config() -> GameConfig {
        match GameConfig::load(GameConfig::PATH).await {
            Ok(config) => config,
            Err(err) => {
                log!("Using default config : {:#}", err);
                GameConfig::default()
            }
        }
    }

    fn scene_override() -> Result<Option<SceneKind>> {
        browser::query_param("scene")?
            .map(|name| name.parse())
            .transpose()
    }
}

#[async_trait(?Send)]
impl Game for Arcade {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            Arcade::Loading => {
                let mut config = Self::load_config().await;
                match Self::scene_override() {
                    Ok(Some(kind)) => config = config.with_scene(kind),
                    Ok(None) => {}
                    Err(err) => error!("Ignoring ?scene= : {:#}", err),
                }

                let canvas = browser::canvas()?;
                canvas.set_width(config.width as u32);
                canvas.set_height(config.height as u32);

                let rng = match config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let scene = scenes::create(config.entry_scene, &config, rng);
                let mut textures = TextureCache::new();
                textures
                    .generate_all(&scene.textures())
                    .with_context(|| format!("preparing scene '{}'", config.entry_scene))?;

                log!(
                    "Starting scene '{}' ({}x{})",
                    config.entry_scene,
                    config.width,
                    config.height
                );
                Ok(Box::new(Arcade::Loaded(Stage::new(config, scene, textures))))
            }
            Arcade::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f64) {
        if let Arcade::Loaded(stage) = self {
            stage.scene.update(keystate, delta_ms);
            stage.flush();
        }
    }

    fn draw(&mut self, renderer: &Renderer) {
        if let Arcade::Loaded(stage) = self {
            stage.draw(renderer);
        }
    }
}

// ==================== Stage ====================
pub struct Stage {
    config: GameConfig,
    scene: Box<dyn Scene>,
    textures: TextureCache,
    // signals revision last written to window
    published_revision: Option<u64>,
}

impl Stage {
    fn new(config: GameConfig, scene: Box<dyn Scene>, textures: TextureCache) -> Self {
        let mut stage = Stage {
            config,
            scene,
            textures,
            published_revision: None,
        };
        stage.flush();
        stage
    }

    /// Events go to the console as one JSON line each, signals to
    /// `window[signalsKey]` whenever they changed
    fn flush(&mut self) {
        for record in self.scene.telemetry_mut().events.drain() {
            match record.to_json() {
                Ok(line) => log!("{}", line),
                Err(err) => error!("Dropping event '{}' : {:#}", record.event, err),
            }
        }

        if !self.config.publish_signals {
            return;
        }
        let signals = &self.scene.telemetry().signals;
        if self.published_revision == Some(signals.revision()) {
            return;
        }
        match browser::publish_global(&self.config.signals_key, signals.snapshot()) {
            Ok(()) => self.published_revision = Some(signals.revision()),
            Err(err) => error!("{:#}", err),
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let bounds = Rect::from_xywh(0.0, 0.0, self.config.width, self.config.height);
        renderer.clear(&bounds);
        renderer.fill_rect(&bounds, self.config.background);
        self.scene.draw(renderer, &self.textures);
    }
}
