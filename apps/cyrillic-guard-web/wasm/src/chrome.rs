//! Bindings to the extension APIs under `chrome.*`
//!
//! Only the calls the three contexts actually make. Promise-returning APIs
//! are imported as `async` with `catch` so a rejected promise (closed tab,
//! no receiving end) surfaces as `Err`. Event listeners are registered by
//! the service worker script itself, see `background`.

use cyrillic_guard_core::{TabChange, TabId};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    // chrome.tabs

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = get)]
    pub async fn tabs_get(tab_id: TabId) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    pub async fn tabs_query(query_info: JsValue) -> Result<JsValue, JsValue>;

    // chrome.action; each call returns its promise unawaited so a badge
    // update can issue all of its calls before yielding

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = setBadgeText)]
    pub fn set_badge_text(details: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = setBadgeBackgroundColor)]
    pub fn set_badge_background_color(details: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = setTitle)]
    pub fn set_title(details: &JsValue) -> Result<js_sys::Promise, JsValue>;

    // chrome.runtime

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    pub async fn send_message(message: JsValue) -> Result<JsValue, JsValue>;
}

/// The subset of `tabs.Tab` we read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInfo {
    pub tab_id: TabId,
}

/// `runtime.MessageSender`; `tab` is absent for popup senders
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageSender {
    #[serde(default)]
    pub tab: Option<Tab>,
}

impl MessageSender {
    pub fn tab_id(&self) -> Option<TabId> {
        self.tab.as_ref().and_then(|t| t.id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    pub active: bool,
    pub current_window: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeTextDetails<'a> {
    pub tab_id: TabId,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeColorDetails<'a> {
    pub tab_id: TabId,
    pub color: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetails<'a> {
    pub tab_id: TabId,
    pub title: &'a str,
}

/// Decode a JS object, treating `undefined` as the type's default
pub fn decode<T>(value: JsValue) -> Result<T, JsValue>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_wasm_bindgen::from_value(value)?)
}

/// Decode the `changeInfo` argument of `tabs.onUpdated`
pub fn decode_change(value: JsValue) -> Result<TabChange, JsValue> {
    decode(value)
}

pub fn encode<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(value)?)
}
