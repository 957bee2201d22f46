// ==================== Imports ====================
use wasm_bindgen::prelude::*;

#[macro_use]
mod browser;
pub mod cascade;
pub mod config;
pub mod engine;
pub mod loading;
pub mod missile;
pub mod page;
pub mod placement;
pub mod scroll;
pub mod visibility;

use crate::config::PageOptions;
use crate::engine::PageLoop;
use crate::page::MemePage;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - fetches the options table (defaults on failure)
/// - runs the loading overlay
/// - wires scroll + section visibility into the battlefield
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    browser::spawn_local(async move {
        let options = PageOptions::load().await;
        if let Err(err) = PageLoop::start(MemePage::new(options)).await {
            error!("Could not start page : {:#?}", err);
        }
    });

    Ok(())
}
