pub mod alert;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod control;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod lifecycle;
pub mod loader;
pub mod page;
pub mod panel;
pub mod renderer;
pub mod scene;
pub mod shapes;
pub mod viewer;

#[cfg(target_arch = "wasm32")]
pub mod app;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::ViewerConfig;
pub use error::ViewerError;
pub use viewer::{ViewerCore, ViewerEvent, Viewport};

// ── Web entry‑point ──
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static PAGE: std::cell::RefCell<Option<page::ObjectViewerPage>> = const { std::cell::RefCell::new(None) };
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    mount(ViewerConfig::default())
}

/// Remounts the page with a JSON config; missing fields keep their defaults.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_with_config(json: &str) -> Result<(), JsValue> {
    let config = ViewerConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    cleanup();
    mount(config)
}

/// Disposes the mounted viewer, if any.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn cleanup() {
    if let Some(mut page) = PAGE.with(|p| p.borrow_mut().take()) {
        page.cleanup();
        page.root().remove();
    }
}

#[cfg(target_arch = "wasm32")]
fn mount(config: ViewerConfig) -> Result<(), JsValue> {
    // Redirect `log` macros & panic messages to the browser console
    eframe::WebLogger::init(config.log_filter()).ok();
    log::set_max_level(config.log_filter());
    console_error_panic_hook::set_once();

    let page = page::ObjectViewerPage::mount(config)?;
    PAGE.with(|p| *p.borrow_mut() = Some(page));
    Ok(())
}
