// ==================== Imports ====================
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[macro_use]
mod browser;
pub mod config;
pub mod engine;
mod game;
pub mod scenes;

use engine::GameLoop;
use game::Arcade;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - loads `config.json`, picks the scene (`?scene=` wins)
/// - starts the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // the loop outlives this call, it is driven by requestAnimationFrame
    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(Arcade::new()).await {
            error!("Could not start game : {:#?}", err);
        }
    });

    Ok(())
}
