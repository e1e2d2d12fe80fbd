//! Background service worker: hosts the coordinator
//!
//! MV3 only delivers events to listeners registered synchronously while the
//! worker script is first evaluated, before the wasm module can be ready. So
//! `background.js` registers every `chrome.*` listener itself, waits for
//! [`start_background`], and forwards each event to a [`Background`] method.
//!
//! The coordinator lives in an `Rc<RefCell<_>>`. JS runs one handler at a
//! time and no borrow is held across an `.await`, so borrows never overlap.

use crate::chrome::{self, ActiveInfo, MessageSender, Tab};
use crate::{config_from_js, js_error_message, logging};
use cyrillic_guard_core::{
    BadgeSink, BadgeState, Coordinator, ExtensionMessage, GuardError, TabEvent, TabId,
};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};

type SharedCoordinator = Rc<RefCell<Coordinator<ChromeBadge>>>;

/// Applies badge state through `chrome.action`, scoped to one tab
#[derive(Debug, Default)]
pub struct ChromeBadge;

impl BadgeSink for ChromeBadge {
    fn apply(&mut self, tab_id: TabId, badge: &BadgeState) {
        let pending = match issue_badge(tab_id, badge) {
            Ok(pending) => pending,
            Err(e) => {
                debug!(tab_id, error = %js_error_message(&e), "Badge update failed");
                return;
            }
        };
        spawn_local(async move {
            if let Err(e) = JsFuture::from(pending).await {
                // Usually the tab closed between the event and the update
                debug!(tab_id, error = %js_error_message(&e), "Badge update failed");
            }
        });
    }
}

/// Start every `chrome.action` call for one update without yielding
///
/// Two updates for the same tab therefore reach the browser as whole,
/// ordered groups. The returned promise settles when all calls have.
fn issue_badge(tab_id: TabId, badge: &BadgeState) -> Result<js_sys::Promise, JsValue> {
    let calls = js_sys::Array::new();

    let text: js_sys::Promise = chrome::set_badge_text(&chrome::encode(&chrome::BadgeTextDetails {
        tab_id,
        text: &badge.text,
    })?)?;
    calls.push(&text);

    if let Some(color) = &badge.background_color {
        let color: js_sys::Promise = chrome::set_badge_background_color(&chrome::encode(
            &chrome::BadgeColorDetails { tab_id, color },
        )?)?;
        calls.push(&color);
    }

    let title: js_sys::Promise = chrome::set_title(&chrome::encode(&chrome::TitleDetails {
        tab_id,
        title: &badge.title,
    })?)?;
    calls.push(&title);

    Ok(js_sys::Promise::all(&calls))
}

/// Create the coordinator
///
/// `config` is an optional JS object in the `GuardConfig` shape.
#[wasm_bindgen(js_name = startBackground)]
pub fn start_background(config: JsValue) -> Result<Background, JsValue> {
    let config = config_from_js(config)?;
    logging::init(&config.log_level);

    info!(version = cyrillic_guard_core::VERSION, "Cyrillic Guard background started");
    Ok(Background {
        coordinator: Rc::new(RefCell::new(Coordinator::new(config, ChromeBadge))),
    })
}

/// Event entry points called by the service worker's listeners
#[wasm_bindgen]
pub struct Background {
    coordinator: SharedCoordinator,
}

#[wasm_bindgen]
impl Background {
    /// `tabs.onUpdated(tabId, changeInfo, tab)`
    #[wasm_bindgen(js_name = tabUpdated)]
    pub fn tab_updated(&self, tab_id: TabId, change_info: JsValue, tab: JsValue) {
        let change = match chrome::decode_change(change_info) {
            Ok(change) => change,
            Err(e) => {
                debug!(tab_id, error = %js_error_message(&e), "Unreadable changeInfo");
                return;
            }
        };
        let url = chrome::decode::<Tab>(tab).ok().and_then(|t| t.url);
        self.coordinator
            .borrow_mut()
            .handle_tab_event(TabEvent::Updated {
                tab_id,
                change,
                url,
            });
    }

    /// `tabs.onActivated(activeInfo)`; looks the tab's URL up first
    #[wasm_bindgen(js_name = tabActivated)]
    pub fn tab_activated(&self, active_info: JsValue) {
        let active: ActiveInfo = match serde_wasm_bindgen::from_value(active_info) {
            Ok(info) => info,
            Err(e) => {
                debug!(error = %e, "Unreadable activeInfo");
                return;
            }
        };
        let coordinator = Rc::clone(&self.coordinator);
        spawn_local(async move {
            match fetch_tab(active.tab_id).await {
                Ok(tab) => coordinator.borrow_mut().handle_tab_event(TabEvent::Activated {
                    tab_id: active.tab_id,
                    url: tab.url,
                }),
                Err(e) => warn!(error = %e, "Could not get tab info"),
            }
        });
    }

    /// `tabs.onRemoved(tabId, removeInfo)`
    #[wasm_bindgen(js_name = tabRemoved)]
    pub fn tab_removed(&self, tab_id: TabId) {
        self.coordinator
            .borrow_mut()
            .handle_tab_event(TabEvent::Removed { tab_id });
    }

    /// `action.onClicked(tab)`
    ///
    /// Chrome only fires this while the action has no popup, e.g. after
    /// `chrome.action.setPopup({ popup: "" })`.
    #[wasm_bindgen(js_name = actionClicked)]
    pub fn action_clicked(&self, tab: JsValue) {
        let tab = match chrome::decode::<Tab>(tab) {
            Ok(tab) => tab,
            Err(e) => {
                debug!(error = %js_error_message(&e), "Unreadable tab in action click");
                return;
            }
        };
        if let Some(tab_id) = tab.id {
            self.coordinator
                .borrow_mut()
                .handle_tab_event(TabEvent::ActionClicked { tab_id, url: tab.url });
        }
    }

    /// `runtime.onMessage(message, sender)`
    ///
    /// Returns the reply for `sendResponse`, or `undefined` for messages that
    /// are not ours or could not be handled.
    pub fn message(&self, message: JsValue, sender: JsValue) -> JsValue {
        let message: ExtensionMessage = match serde_wasm_bindgen::from_value(message) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Ignoring unrecognised message");
                return JsValue::UNDEFINED;
            }
        };
        let sender_tab = chrome::decode::<MessageSender>(sender)
            .ok()
            .and_then(|s| s.tab_id());

        let result = self.coordinator.borrow_mut().handle_message(sender_tab, message);
        match result.and_then(|response| {
            chrome::encode(&response).map_err(|e| GuardError::InvalidMessage(js_error_message(&e)))
        }) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Message not handled");
                JsValue::UNDEFINED
            }
        }
    }
}

async fn fetch_tab(tab_id: TabId) -> Result<Tab, GuardError> {
    let unavailable = |reason: String| GuardError::TabUnavailable { tab_id, reason };
    let value = chrome::tabs_get(tab_id)
        .await
        .map_err(|e| unavailable(js_error_message(&e)))?;
    chrome::decode::<Tab>(value).map_err(|e| unavailable(js_error_message(&e)))
}
