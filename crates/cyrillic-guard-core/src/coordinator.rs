//! Background coordinator
//!
//! Sole writer of tab status and sole owner of the toolbar badge. Events are
//! handled one at a time in delivery order; the wasm layer keeps the
//! coordinator behind an `Rc<RefCell<_>>` on the single JS thread.

use crate::badge::{BadgeSink, BadgeState};
use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::hostname::check_url;
use crate::protocol::{Ack, ExtensionMessage, MessageResponse, StatusResponse};
use crate::status::{TabId, TabStatus, TabStatusStore};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// The fields of a tab update the coordinator cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TabChange {
    /// New URL, present only when it changed
    #[serde(default)]
    pub url: Option<String>,
    /// Load status (`loading` / `complete`)
    #[serde(default)]
    pub status: Option<String>,
}

impl TabChange {
    /// Only URL changes and completed loads trigger a re-check
    pub fn is_relevant(&self) -> bool {
        self.url.is_some() || self.status.as_deref() == Some("complete")
    }
}

/// Tab lifecycle events delivered by the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    Updated {
        tab_id: TabId,
        change: TabChange,
        url: Option<String>,
    },
    /// The wasm layer resolves the tab's URL before delivering this
    Activated { tab_id: TabId, url: Option<String> },
    ActionClicked { tab_id: TabId, url: Option<String> },
    Removed { tab_id: TabId },
}

pub struct Coordinator<B: BadgeSink> {
    store: TabStatusStore,
    config: GuardConfig,
    badge: B,
}

impl<B: BadgeSink> Coordinator<B> {
    pub fn new(config: GuardConfig, badge: B) -> Self {
        Self {
            store: TabStatusStore::new(),
            config,
            badge,
        }
    }

    pub fn handle_tab_event(&mut self, event: TabEvent) {
        match event {
            TabEvent::Updated {
                tab_id,
                change,
                url,
            } => {
                if !change.is_relevant() {
                    return;
                }
                // Prefer the URL carried by the change itself
                let url = change.url.or(url);
                self.check_tab_url(tab_id, url.as_deref());
            }
            TabEvent::Activated { tab_id, url } | TabEvent::ActionClicked { tab_id, url } => {
                self.check_tab_url(tab_id, url.as_deref());
            }
            TabEvent::Removed { tab_id } => {
                if self.store.evict(tab_id).is_some() {
                    debug!(tab_id, remaining = self.store.len(), "Evicted status for closed tab");
                }
            }
        }
    }

    /// Re-check a tab's hostname and update its URL flag
    ///
    /// Returns `None` when the tab has no URL yet; nothing is recorded then.
    pub fn check_tab_url(&mut self, tab_id: TabId, url: Option<&str>) -> Option<TabStatus> {
        let url = url?;
        let check = check_url(url, &self.config.exempt_prefixes);

        if check.has_cyrillic() {
            let hostname = check.hostname().unwrap_or_default();
            info!(tab_id, hostname, "Cyrillic characters detected in URL");
        }

        let status = self.store.set_url_flag(tab_id, check.has_cyrillic());
        self.refresh_badge(tab_id, &status);
        Some(status)
    }

    /// Record a content script's page-text finding
    pub fn record_page_report(&mut self, tab_id: TabId, page_has_cyrillic: bool) -> TabStatus {
        if page_has_cyrillic {
            info!(tab_id, "Cyrillic characters reported in page content");
        }
        let status = self.store.set_page_flag(tab_id, page_has_cyrillic);
        self.refresh_badge(tab_id, &status);
        status
    }

    /// Stored status for a tab, defaulting to clean
    pub fn status(&self, tab_id: TabId) -> StatusResponse {
        StatusResponse::from(self.store.get(tab_id))
    }

    /// Dispatch a runtime message
    ///
    /// `sender_tab` is the tab the message came from; popups have none.
    pub fn handle_message(
        &mut self,
        sender_tab: Option<TabId>,
        message: ExtensionMessage,
    ) -> Result<MessageResponse, GuardError> {
        match message {
            ExtensionMessage::PageContentStatus { page_has_cyrillic } => {
                let tab_id = sender_tab.ok_or_else(|| {
                    warn!("Dropping page report without a sender tab");
                    GuardError::MissingSenderTab
                })?;
                self.record_page_report(tab_id, page_has_cyrillic);
                Ok(MessageResponse::Ack(Ack { success: true }))
            }
            ExtensionMessage::GetCyrillicStatus { tab_id } => {
                Ok(MessageResponse::Status(self.status(tab_id)))
            }
        }
    }

    fn refresh_badge(&mut self, tab_id: TabId, status: &TabStatus) {
        let badge = BadgeState::for_status(status, &self.config.badge);
        debug!(tab_id, warning = badge.is_warning(), "Applying badge");
        self.badge.apply(tab_id, &badge);
    }
}

impl<B: BadgeSink> Coordinator<B> {
    pub fn badge_sink(&self) -> &B {
        &self.badge
    }

    pub fn tracked_tabs(&self) -> usize {
        self.store.len()
    }
}
