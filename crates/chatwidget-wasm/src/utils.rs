use std::time::Duration;
use wasm_bindgen::JsValue;

/// Origin of the hosting page, e.g. `http://localhost:5000`
pub fn page_origin() -> Result<String, JsValue> {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .ok_or_else(|| JsValue::from_str("Failed to get page origin"))
}

/// Escape HTML to prevent XSS
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Label for the chat send button
pub fn send_button_label(pending: bool) -> &'static str {
    if pending {
        "Generating..."
    } else {
        "Send"
    }
}

/// Label for the image button
pub fn image_button_label(pending: bool) -> &'static str {
    if pending {
        "Generating Image..."
    } else {
        "Generate Image"
    }
}

/// Milliseconds for a browser timer, saturating at `u32::MAX`
pub fn timer_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
