//! Content script: page monitor and warning banner
//!
//! Runs once per document. Scans hostname and body text, shows or removes the
//! banner, reports the page-text result to the background, then watches for
//! single-page-app navigation (DOM mutations that change `location.href`, and
//! `popstate`) and re-checks after a debounce.

use crate::chrome;
use crate::{config_from_js, js_error_message, logging};
use cyrillic_guard_core::config::BannerConfig;
use cyrillic_guard_core::{BannerAction, ExtensionMessage, MonitorStart, PageMonitor};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, MutationObserver, MutationObserverInit, Window};

/// Fixed id of the single banner element
pub const BANNER_ID: &str = "cyrillic-detector-banner";
const CLOSE_BUTTON_ID: &str = "cyrillic-banner-close";

/// Start the page monitor for the current document
#[wasm_bindgen(js_name = startContent)]
pub fn start_content(config: JsValue) -> Result<(), JsValue> {
    let config = config_from_js(config)?;
    logging::init(&config.log_level);

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let href = window.location().href()?;
    let monitor = PageMonitor::new(config, href);

    if let MonitorStart::Skip(report) = monitor.start() {
        debug!("Internal page, not scanning");
        send_report(report);
        return Ok(());
    }

    let page = Rc::new(ContentPage::new(window, document, monitor));

    if page.document.body().is_some() {
        run(&page)
    } else {
        // Injected before <body> exists; wait for it
        let document = page.document.clone();
        let on_ready = Closure::once_into_js(move || {
            if let Err(e) = run(&page) {
                warn!(error = %js_error_message(&e), "Page monitor failed to start");
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())
    }
}

fn run(page: &Rc<ContentPage>) -> Result<(), JsValue> {
    page.check_all()?;
    watch_navigation(page)
}

/// A scheduled re-check; dropping it releases the callback
struct PendingRecheck {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

struct ContentPage {
    window: Window,
    document: Document,
    monitor: RefCell<PageMonitor>,
    banner: Banner,
    pending: RefCell<Option<PendingRecheck>>,
}

impl ContentPage {
    fn new(window: Window, document: Document, monitor: PageMonitor) -> Self {
        Self {
            banner: Banner::new(document.clone()),
            window,
            document,
            monitor: RefCell::new(monitor),
            pending: RefCell::new(None),
        }
    }

    fn check_all(&self) -> Result<(), JsValue> {
        let hostname = self.window.location().hostname()?;
        let body_text = self
            .document
            .body()
            .map(|body| body.inner_text())
            .unwrap_or_default();

        let monitor = self.monitor.borrow();
        let assessment = monitor.assess(&hostname, &body_text);
        let banner_config = &monitor.config().banner;

        match assessment.banner {
            BannerAction::Show(kind) => {
                debug!(?kind, "Showing warning banner");
                self.banner.show(kind.message(banner_config), banner_config)?;
            }
            BannerAction::Remove => self.banner.remove(),
        }

        send_report(assessment.report());
        Ok(())
    }

    fn href(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }
}

/// Replace any pending re-check with a fresh one
fn schedule_recheck(page: &Rc<ContentPage>) {
    if let Some(previous) = page.pending.borrow_mut().take() {
        page.window.clear_timeout_with_handle(previous.handle);
    }

    let weak = Rc::downgrade(page);
    let callback = Closure::<dyn FnMut()>::new(move || {
        if let Some(page) = weak.upgrade() {
            if let Err(e) = page.check_all() {
                warn!(error = %js_error_message(&e), "Re-check failed");
            }
        }
    });

    let delay = page.monitor.borrow().debounce_ms() as i32;
    match page
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), delay)
    {
        Ok(handle) => {
            *page.pending.borrow_mut() = Some(PendingRecheck {
                handle,
                _callback: callback,
            });
        }
        Err(e) => warn!(error = %js_error_message(&e), "Could not schedule re-check"),
    }
}

fn watch_navigation(page: &Rc<ContentPage>) -> Result<(), JsValue> {
    let body = page.document.body().ok_or("No body")?;

    let weak: Weak<ContentPage> = Rc::downgrade(page);
    let on_mutation = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        move |_records: js_sys::Array, _observer: MutationObserver| {
            let Some(page) = weak.upgrade() else { return };
            let href = page.href();
            let changed = page.monitor.borrow_mut().on_mutation(&href);
            if changed {
                debug!(href = %href, "In-page navigation detected");
                schedule_recheck(&page);
            }
        },
    );
    let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(&body, &init)?;
    on_mutation.forget();

    let weak: Weak<ContentPage> = Rc::downgrade(page);
    let on_popstate = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
        let Some(page) = weak.upgrade() else { return };
        let href = page.href();
        if page.monitor.borrow_mut().on_history_navigation(&href) {
            schedule_recheck(&page);
        }
    });
    page.window
        .add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref())?;
    on_popstate.forget();

    // The page lives for the document's lifetime
    std::mem::forget(Rc::clone(page));
    Ok(())
}

fn send_report(message: ExtensionMessage) {
    spawn_local(async move {
        let value = match chrome::encode(&message) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %js_error_message(&e), "Could not encode page report");
                return;
            }
        };
        if let Err(e) = chrome::send_message(value).await {
            debug!(error = %js_error_message(&e), "Background did not receive page report");
        }
    });
}

/// The single in-page warning banner
///
/// Remembers the body's original top padding the first time it pads the
/// page and puts it back on every dismissal. Only the live banner carries
/// [`BANNER_ID`]; one that is fading out has lost it and can no longer
/// restore padding.
struct Banner {
    document: Document,
    original_padding: Rc<RefCell<Option<String>>>,
}

impl Banner {
    fn new(document: Document) -> Self {
        Self {
            document,
            original_padding: Rc::new(RefCell::new(None)),
        }
    }

    fn show(&self, message: &str, config: &BannerConfig) -> Result<(), JsValue> {
        self.remove_element();

        let body = self.document.body().ok_or("No body")?;
        let banner = build_banner(&self.document, message)?;
        body.insert_before(&banner, body.first_child().as_ref())?;

        {
            let mut original = self.original_padding.borrow_mut();
            if original.is_none() {
                *original = Some(body.style().get_property_value("padding-top")?);
            }
        }
        body.style().set_property("padding-top", &config.body_padding)?;

        self.wire_close_button(&banner)?;
        self.schedule_auto_dismiss(&banner, config)?;
        Ok(())
    }

    /// Remove the banner (if any) and restore padding
    fn remove(&self) {
        if self.remove_element() {
            restore_padding(&self.document, &self.original_padding);
        }
    }

    fn remove_element(&self) -> bool {
        match self.document.get_element_by_id(BANNER_ID) {
            Some(existing) => {
                existing.remove();
                true
            }
            None => false,
        }
    }

    fn wire_close_button(&self, banner: &Element) -> Result<(), JsValue> {
        let Some(button) = banner.query_selector(&format!("#{}", CLOSE_BUTTON_ID))? else {
            return Ok(());
        };

        let banner = banner.clone();
        let document = self.document.clone();
        let original = Rc::clone(&self.original_padding);
        let on_click = Closure::once_into_js(move |_event: web_sys::MouseEvent| {
            let live = is_live(&banner);
            banner.remove();
            if live {
                restore_padding(&document, &original);
            }
        });
        button.add_event_listener_with_callback("click", on_click.unchecked_ref())
    }

    fn schedule_auto_dismiss(&self, banner: &Element, config: &BannerConfig) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let fade_ms = config.fade_ms as i32;

        let banner = banner.clone();
        let document = self.document.clone();
        let original = Rc::clone(&self.original_padding);
        let dismiss = Closure::once_into_js(move || {
            // Already replaced or closed by hand
            if !is_live(&banner) {
                return;
            }
            let _ = banner.remove_attribute("id");
            if let Some(el) = banner.dyn_ref::<HtmlElement>() {
                let style = el.style();
                let _ = style.set_property("transition", &format!("opacity {}ms ease-out", fade_ms));
                let _ = style.set_property("opacity", "0");
            }
            restore_padding(&document, &original);

            let remove = Closure::once_into_js(move || banner.remove());
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    remove.unchecked_ref(),
                    fade_ms,
                );
            }
        });

        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            dismiss.unchecked_ref(),
            config.timeout_ms as i32,
        )?;
        Ok(())
    }
}

fn is_live(banner: &Element) -> bool {
    banner.is_connected() && banner.id() == BANNER_ID
}

/// Put back the padding captured before the first banner
///
/// The captured value is kept, so restoring twice is harmless.
fn restore_padding(document: &Document, original: &RefCell<Option<String>>) {
    let Some(body) = document.body() else { return };
    let style = body.style();
    let result = match original.borrow().as_deref() {
        Some(padding) if !padding.is_empty() => style.set_property("padding-top", padding),
        _ => style.remove_property("padding-top").map(|_| ()),
    };
    if let Err(e) = result {
        debug!(error = %js_error_message(&e), "Could not restore body padding");
    }
}

fn build_banner(document: &Document, message: &str) -> Result<Element, JsValue> {
    let banner = document.create_element("div")?;
    banner.set_id(BANNER_ID);

    if let Some(el) = banner.dyn_ref::<HtmlElement>() {
        let style = el.style();
        style.set_property("position", "fixed")?;
        style.set_property("top", "0")?;
        style.set_property("left", "0")?;
        style.set_property("right", "0")?;
        style.set_property("z-index", "999999")?;
        style.set_property("padding", "8px 16px")?;
        style.set_property("background", "#d32f2f")?;
        style.set_property("color", "white")?;
        style.set_property("font", "500 14px sans-serif")?;
        style.set_property("text-align", "center")?;
    }

    let icon = document.create_element("span")?;
    icon.set_text_content(Some("⚠️"));

    // Text node, never markup
    let text = document.create_element("span")?;
    text.set_text_content(Some(message));

    let close = document.create_element("button")?;
    close.set_id(CLOSE_BUTTON_ID);
    close.set_text_content(Some("✕"));
    if let Some(el) = close.dyn_ref::<HtmlElement>() {
        el.style().set_property("margin-left", "12px")?;
    }

    banner.append_child(&icon)?;
    banner.append_child(&text)?;
    banner.append_child(&close)?;
    Ok(banner)
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use crate::test_support::{install_fake_chrome, recorded_calls};
    use cyrillic_guard_core::GuardConfig;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            web_sys::window()
                .unwrap()
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                .unwrap();
        });
        JsFuture::from(promise).await.unwrap();
    }

    fn quick_banner(fade_ms: u32) -> BannerConfig {
        BannerConfig {
            timeout_ms: 20,
            fade_ms,
            ..BannerConfig::default()
        }
    }

    fn padding_top() -> String {
        document()
            .body()
            .unwrap()
            .style()
            .get_property_value("padding-top")
            .unwrap()
    }

    fn set_padding_top(value: &str) {
        let style = document().body().unwrap().style();
        if value.is_empty() {
            style.remove_property("padding-top").unwrap();
        } else {
            style.set_property("padding-top", value).unwrap();
        }
    }

    fn close_button() -> HtmlElement {
        document()
            .get_element_by_id(CLOSE_BUTTON_ID)
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_single_banner_with_fixed_id() {
        let banner = Banner::new(document());
        let config = BannerConfig::default();

        banner.show("first", &config).unwrap();
        banner.show("second", &config).unwrap();

        let found = document().query_selector_all(&format!("#{}", BANNER_ID)).unwrap();
        assert_eq!(found.length(), 1);
        let text = document().get_element_by_id(BANNER_ID).unwrap().text_content().unwrap();
        assert!(text.contains("second"));

        banner.remove();
    }

    #[wasm_bindgen_test]
    fn test_remove_restores_padding() {
        let body = document().body().unwrap();
        body.style().set_property("padding-top", "3px").unwrap();

        let banner = Banner::new(document());
        banner.show("warning", &BannerConfig::default()).unwrap();
        assert_eq!(body.style().get_property_value("padding-top").unwrap(), "40px");

        banner.remove();
        assert!(document().get_element_by_id(BANNER_ID).is_none());
        assert_eq!(body.style().get_property_value("padding-top").unwrap(), "3px");
        body.style().remove_property("padding-top").unwrap();
    }

    #[wasm_bindgen_test]
    fn test_message_is_not_parsed_as_markup() {
        let banner = Banner::new(document());
        banner
            .show("<b>bold</b>", &BannerConfig::default())
            .unwrap();
        let el = document().get_element_by_id(BANNER_ID).unwrap();
        assert!(el.query_selector("b").unwrap().is_none());
        banner.remove();
    }

    #[wasm_bindgen_test]
    async fn test_auto_dismiss_fades_out_and_restores_padding() {
        set_padding_top("3px");
        let banner = Banner::new(document());
        banner.show("warning", &quick_banner(5)).unwrap();
        let element = document().get_element_by_id(BANNER_ID).unwrap();
        assert_eq!(padding_top(), "40px");

        sleep(100).await;

        assert!(!element.is_connected());
        assert!(document().get_element_by_id(BANNER_ID).is_none());
        assert_eq!(padding_top(), "3px");
        set_padding_top("");
    }

    #[wasm_bindgen_test]
    fn test_close_button_dismisses() {
        set_padding_top("3px");
        let banner = Banner::new(document());
        banner.show("warning", &BannerConfig::default()).unwrap();

        close_button().click();

        assert!(document().get_element_by_id(BANNER_ID).is_none());
        assert_eq!(padding_top(), "3px");
        set_padding_top("");
    }

    #[wasm_bindgen_test]
    async fn test_dismissal_during_fade_keeps_page_padding() {
        set_padding_top("3px");
        let banner = Banner::new(document());
        banner.show("warning", &quick_banner(300)).unwrap();
        let element = document().get_element_by_id(BANNER_ID).unwrap();
        let button = close_button();

        // Auto-dismiss has started; the banner is fading but still attached
        sleep(80).await;
        assert!(element.is_connected());
        assert_eq!(padding_top(), "3px");

        banner.remove();
        button.click();
        assert_eq!(padding_top(), "3px");

        sleep(400).await;
        assert!(!element.is_connected());
        assert_eq!(padding_top(), "3px");
        set_padding_top("");
    }

    #[wasm_bindgen_test]
    async fn test_new_banner_during_fade_is_not_removed() {
        let banner = Banner::new(document());
        banner.show("first", &quick_banner(300)).unwrap();
        sleep(80).await;

        banner.show("second", &BannerConfig::default()).unwrap();
        sleep(400).await;

        let live = document().get_element_by_id(BANNER_ID).unwrap();
        assert!(live.text_content().unwrap().contains("second"));
        assert_eq!(padding_top(), "40px");
        banner.remove();
        set_padding_top("");
    }

    #[wasm_bindgen_test]
    async fn test_quick_navigations_recheck_once() {
        install_fake_chrome();
        let window = web_sys::window().unwrap();
        let href = window.location().href().unwrap();
        let mut config = GuardConfig::default();
        config.monitor.debounce_ms = 30;
        let page = Rc::new(ContentPage::new(
            window,
            document(),
            PageMonitor::new(config, href),
        ));

        schedule_recheck(&page);
        schedule_recheck(&page);
        sleep(120).await;

        let reports = recorded_calls()
            .into_iter()
            .filter(|call| call.starts_with("sendMessage:"))
            .count();
        assert_eq!(reports, 1);
        assert!(page.pending.borrow().is_some());
        page.banner.remove();
    }
}
