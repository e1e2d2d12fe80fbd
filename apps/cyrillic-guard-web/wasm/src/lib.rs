//! WASM bindings for the Cyrillic Guard browser extension
//!
//! One entry point per execution context. All decisions live in
//! `cyrillic-guard-core`; this crate only moves data between it and the
//! `chrome.*` APIs and the DOM.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! // background.js (service worker): listeners first, wasm later
//! import init, { startBackground } from './pkg/cyrillic_guard_wasm.js';
//! const ready = init().then(() => startBackground());
//! chrome.tabs.onRemoved.addListener((tabId) => ready.then((bg) => bg.tabRemoved(tabId)));
//!
//! // content.js
//! startContent({ monitor: { debounceMs: 150 } });
//!
//! // popup.js
//! startPopup();
//! ```

pub mod background;
pub mod chrome;
pub mod content;
pub mod logging;
pub mod popup;

use cyrillic_guard_core::{scan, GuardConfig};
use wasm_bindgen::prelude::*;

pub use background::{start_background, Background};
pub use content::start_content;
pub use popup::start_popup;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    cyrillic_guard_core::VERSION.to_string()
}

/// Scan arbitrary text, returning `{ hasMatch, matchedCharacters }`
#[wasm_bindgen(js_name = scanText)]
pub fn scan_text(text: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&scan(text))
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Read configuration passed from JS; `undefined` or `null` means defaults
pub(crate) fn config_from_js(value: JsValue) -> Result<GuardConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(GuardConfig::default());
    }

    let config: GuardConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid configuration: {}", e)))?;
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(config)
}

/// Best-effort readable text for a rejected promise or thrown value
pub(crate) fn js_error_message(error: &JsValue) -> String {
    if let Some(s) = error.as_string() {
        return s;
    }
    js_sys::Reflect::get(error, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}
