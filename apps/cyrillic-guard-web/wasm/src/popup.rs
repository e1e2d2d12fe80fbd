//! Popup: status viewer
//!
//! Every open and every refresh asks the tab API for the active tab and the
//! background for that tab's status. Nothing is cached between runs.

use crate::chrome::{self, Tab, TabQuery};
use crate::{config_from_js, js_error_message, logging};
use cyrillic_guard_core::viewer::{self, ActiveTab, StatusView, ViewerPlan, ViewerState, Verdict};
use cyrillic_guard_core::{ExtensionMessage, GuardConfig, GuardError, StatusResponse};
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlElement};

/// Start the popup and render the active tab's status
#[wasm_bindgen(js_name = startPopup)]
pub fn start_popup(config: JsValue) -> Result<(), JsValue> {
    let config = Rc::new(config_from_js(config)?);
    logging::init(&config.log_level);

    let document = web_sys::window()
        .ok_or("No window")?
        .document()
        .ok_or("No document")?;
    let view = Rc::new(PopupView::new(&document)?);

    let on_refresh = {
        let view = Rc::clone(&view);
        let config = Rc::clone(&config);
        Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            spawn_local(analyze_current_tab(Rc::clone(&view), Rc::clone(&config)));
        })
    };
    view.refresh_btn
        .add_event_listener_with_callback("click", on_refresh.as_ref().unchecked_ref())?;
    on_refresh.forget();

    spawn_local(analyze_current_tab(view, config));
    Ok(())
}

async fn analyze_current_tab(view: Rc<PopupView>, config: Rc<GuardConfig>) {
    view.render(&ViewerState::Loading);

    let tab = match active_tab().await {
        Ok(tab) => tab,
        Err(e) => {
            warn!(error = %js_error_message(&e), "Error accessing current tab");
            view.render(&ViewerState::error("Error accessing current tab"));
            return;
        }
    };

    let state = match viewer::plan(tab.as_ref(), &config) {
        ViewerPlan::Render(state) => state,
        ViewerPlan::Query { url, message } => viewer::complete(&url, query_status(message).await),
    };
    view.render(&state);
}

async fn active_tab() -> Result<Option<ActiveTab>, JsValue> {
    let query = chrome::encode(&TabQuery {
        active: true,
        current_window: true,
    })?;
    let tabs: Vec<Tab> = serde_wasm_bindgen::from_value(chrome::tabs_query(query).await?)?;
    Ok(tabs.into_iter().next().map(|tab| ActiveTab {
        id: tab.id,
        url: tab.url,
    }))
}

/// Ask the background for a tab's status
///
/// `Ok(None)` when the message was delivered but no listener replied.
async fn query_status(message: ExtensionMessage) -> Result<Option<StatusResponse>, GuardError> {
    let request =
        chrome::encode(&message).map_err(|e| GuardError::InvalidMessage(js_error_message(&e)))?;
    let reply = chrome::send_message(request)
        .await
        .map_err(|e| GuardError::CoordinatorUnreachable(js_error_message(&e)))?;

    if reply.is_undefined() || reply.is_null() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(reply)
        .map(Some)
        .map_err(|e| GuardError::InvalidMessage(e.to_string()))
}

/// CSS class of the status panel for a state
pub fn status_class(state: &ViewerState) -> &'static str {
    match state {
        ViewerState::Ready(view) => match view.verdict {
            Verdict::Safe => "status safe",
            Verdict::Danger => "status danger",
        },
        ViewerState::Error { .. } => "status warning",
        ViewerState::Loading | ViewerState::InternalPage { .. } => "status",
    }
}

/// Text of one row in the Cyrillic character list
pub fn character_row(report: &cyrillic_guard_core::lookalike::CharacterReport) -> String {
    match report.look_alike {
        Some(latin) => format!("{} → \"{}\"", report.unicode, latin),
        None => report.unicode.clone(),
    }
}

/// Handles to the popup's fixed elements
struct PopupView {
    document: Document,
    loading: HtmlElement,
    results: HtmlElement,
    status: HtmlElement,
    status_icon: HtmlElement,
    status_text: HtmlElement,
    current_url: HtmlElement,
    url_status: HtmlElement,
    content_status: HtmlElement,
    cyrillic_details: HtmlElement,
    cyrillic_list: HtmlElement,
    refresh_btn: HtmlElement,
}

impl PopupView {
    fn new(document: &Document) -> Result<Self, JsValue> {
        let get = |id: &str| -> Result<HtmlElement, JsValue> {
            document
                .get_element_by_id(id)
                .ok_or_else(|| JsValue::from_str(&format!("Missing popup element #{}", id)))?
                .dyn_into::<HtmlElement>()
                .map_err(|_| JsValue::from_str(&format!("#{} is not an HTML element", id)))
        };

        Ok(Self {
            document: document.clone(),
            loading: get("loading")?,
            results: get("results")?,
            status: get("status")?,
            status_icon: get("status-icon")?,
            status_text: get("status-text")?,
            current_url: get("current-url")?,
            url_status: get("url-status")?,
            content_status: get("content-status")?,
            cyrillic_details: get("cyrillic-details")?,
            cyrillic_list: get("cyrillic-list")?,
            refresh_btn: get("refresh-btn")?,
        })
    }

    fn render(&self, state: &ViewerState) {
        if let Err(e) = self.try_render(state) {
            warn!(error = %js_error_message(&e), "Popup render failed");
        }
    }

    fn try_render(&self, state: &ViewerState) -> Result<(), JsValue> {
        if let ViewerState::Loading = state {
            set_hidden(&self.loading, false)?;
            return set_hidden(&self.results, true);
        }

        set_hidden(&self.loading, true)?;
        set_hidden(&self.results, false)?;
        self.status.set_class_name(status_class(state));

        match state {
            ViewerState::Loading => Ok(()),
            ViewerState::InternalPage { url } => {
                self.current_url.set_text_content(Some(url.as_str()));
                self.status_icon.set_text_content(Some("ℹ️"));
                self.status_text.set_text_content(Some("Internal browser page"));
                self.clear_details()
            }
            ViewerState::Error { message } => {
                // A failed refresh must not keep the previous tab's hostname
                self.current_url.set_text_content(None);
                self.status_icon.set_text_content(Some("❌"));
                self.status_text.set_text_content(Some(message.as_str()));
                self.clear_details()
            }
            ViewerState::Ready(view) => self.render_view(view),
        }
    }

    fn render_view(&self, view: &StatusView) -> Result<(), JsValue> {
        self.current_url.set_text_content(Some(&view.display_url));
        self.status_icon.set_text_content(Some(view.icon()));
        self.status_text.set_text_content(Some(view.headline()));
        self.url_status.set_text_content(Some(&view.url_line.text()));
        self.content_status
            .set_text_content(Some(&view.content_line.text()));

        self.cyrillic_list.set_inner_html("");
        for report in &view.characters {
            let item = self.document.create_element("div")?;
            item.set_class_name("cyrillic-item");

            let glyph = self.document.create_element("span")?;
            glyph.set_class_name("cyrillic-char");
            glyph.set_text_content(Some(&report.character.to_string()));

            let info = self.document.create_element("span")?;
            info.set_text_content(Some(&character_row(report)));

            item.append_child(&glyph)?;
            item.append_child(&info)?;
            self.cyrillic_list.append_child(&item)?;
        }
        set_hidden(&self.cyrillic_details, view.characters.is_empty())
    }

    fn clear_details(&self) -> Result<(), JsValue> {
        self.url_status.set_text_content(None);
        self.content_status.set_text_content(None);
        self.cyrillic_list.set_inner_html("");
        set_hidden(&self.cyrillic_details, true)
    }
}

fn set_hidden(element: &HtmlElement, hidden: bool) -> Result<(), JsValue> {
    let classes = element.class_list();
    if hidden {
        classes.add_1("hidden")
    } else {
        classes.remove_1("hidden")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyrillic_guard_core::lookalike::describe;
    use cyrillic_guard_core::scan;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_class_never_safe_on_error() {
        assert_eq!(
            status_class(&ViewerState::error("Unable to get status")),
            "status warning"
        );
    }

    #[test]
    fn test_status_class_for_verdicts() {
        let safe = viewer::complete("https://example.com", Ok(Some(StatusResponse::default())));
        assert_eq!(status_class(&safe), "status safe");

        let flagged = StatusResponse {
            url_has_cyrillic: false,
            page_has_cyrillic: true,
            combined_has_cyrillic: true,
        };
        let danger = viewer::complete("https://example.com", Ok(Some(flagged)));
        assert_eq!(status_class(&danger), "status danger");
    }

    #[test]
    fn test_character_rows() {
        let reports = describe(&scan("аж"));
        assert_eq!(character_row(&reports[0]), "U+0430 → \"a\"");
        assert_eq!(character_row(&reports[1]), "U+0436");
    }
}
