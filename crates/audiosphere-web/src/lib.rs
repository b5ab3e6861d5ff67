#![cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

mod audio;
mod visualizer;

pub use visualizer::Visualizer;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("audiosphere-web starting");
    Ok(())
}

/// Create an audio context for the page. Browsers keep it suspended until a
/// user gesture; call `Visualizer::resume` from that gesture.
#[wasm_bindgen]
pub fn create_audio_context() -> Result<web_sys::AudioContext, JsValue> {
    let ctx = web_sys::AudioContext::new().map_err(|e| {
        log::error!("AudioContext error: {:?}", e);
        e
    })?;
    Ok(ctx)
}
