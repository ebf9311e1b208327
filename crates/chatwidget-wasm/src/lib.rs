use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

use chatwidget_core::WidgetConfig;

mod dom;
mod markdown;
mod socket;
mod speech;
mod utils;
mod widget_ui;

/// Initialize the WASM module
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    wasm_logger::init(wasm_logger::Config::default());

    log::info!("chatwidget WASM initialized");
}

/// Mount the chat widget on the current page.
///
/// `config_json` is a JSON `WidgetConfig`; an empty string uses the defaults
/// with the page's own origin as the backend.
#[wasm_bindgen]
pub async fn init_chat_widget(config_json: String) -> Result<(), JsValue> {
    let config = if config_json.trim().is_empty() {
        WidgetConfig {
            endpoint: utils::page_origin()?,
            ..Default::default()
        }
    } else {
        WidgetConfig::from_json(&config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid widget config: {}", e)))?
    };

    log::info!("Mounting chat widget for {}", config.endpoint);
    widget_ui::ChatWidgetApp::new(config)?.start().await
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}
