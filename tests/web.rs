//! Browser smoke tests, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use arcade_lab::config::GameConfig;
use arcade_lab::engine::texture::{TextureCache, TextureSpec};
use arcade_lab::engine::Color;
use arcade_lab::scenes::{self, Scene, SceneKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn every_scene_rasterizes_its_textures() {
    let config = GameConfig::default();
    for kind in SceneKind::ALL {
        let scene = scenes::create(kind, &config, StdRng::seed_from_u64(1));
        let specs = scene.textures();
        let mut cache = TextureCache::new();
        cache.generate_all(&specs).unwrap();

        for spec in &specs {
            let texture = cache.get(spec.key).unwrap();
            assert_eq!(texture.width(), spec.width, "{} / {}", kind, spec.key);
            assert_eq!(texture.height(), spec.height, "{} / {}", kind, spec.key);
        }
    }
}

#[wasm_bindgen_test]
fn empty_texture_is_rejected_before_touching_the_dom() {
    let mut cache = TextureCache::new();
    assert!(cache
        .generate(&TextureSpec::solid("nothing", 0, 8, Color::WHITE))
        .is_err());
    assert!(!cache.contains("nothing"));
}

#[wasm_bindgen_test]
fn inline_config_matches_defaults() {
    let config = GameConfig::from_json(r#"{ "entryScene": "dash" }"#).unwrap();
    assert_eq!(config.entry_scene, SceneKind::Dash);
    assert_eq!(config.signals_key, GameConfig::default().signals_key);
}
