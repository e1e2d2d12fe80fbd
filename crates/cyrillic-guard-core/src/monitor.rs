//! Page monitor decisions
//!
//! Everything the content script decides, minus the DOM work: whether a page
//! is scanned at all, which banner to show, what to report, and when an
//! in-page navigation warrants a re-check.

use crate::config::{BannerConfig, GuardConfig};
use crate::detector::has_cyrillic;
use crate::hostname::{is_exempt, unicode_host};
use crate::protocol::ExtensionMessage;

/// Which warning banner to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Hostname contains Cyrillic; takes priority
    Phishing,
    /// Only the page text contains Cyrillic
    Content,
}

impl BannerKind {
    pub fn message<'a>(&self, config: &'a BannerConfig) -> &'a str {
        match self {
            BannerKind::Phishing => &config.url_warning,
            BannerKind::Content => &config.content_warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerAction {
    Show(BannerKind),
    Remove,
}

/// Result of scanning one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAssessment {
    pub url_has_cyrillic: bool,
    pub page_has_cyrillic: bool,
    pub banner: BannerAction,
}

impl PageAssessment {
    /// Scan a hostname and the rendered body text independently
    pub fn assess(hostname: &str, body_text: &str) -> Self {
        let url_has_cyrillic = has_cyrillic(&unicode_host(hostname));
        let page_has_cyrillic = has_cyrillic(body_text);

        let banner = if url_has_cyrillic {
            BannerAction::Show(BannerKind::Phishing)
        } else if page_has_cyrillic {
            BannerAction::Show(BannerKind::Content)
        } else {
            BannerAction::Remove
        };

        Self {
            url_has_cyrillic,
            page_has_cyrillic,
            banner,
        }
    }

    /// Message for the coordinator; carries only the page-text result
    pub fn report(&self) -> ExtensionMessage {
        ExtensionMessage::PageContentStatus {
            page_has_cyrillic: self.page_has_cyrillic,
        }
    }
}

/// Remembers the last URL seen so DOM mutations can detect SPA navigation
#[derive(Debug, Clone)]
pub struct NavigationTracker {
    current: String,
}

impl NavigationTracker {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            current: href.into(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Record `href`; true if it differs from the previous value
    pub fn observe(&mut self, href: &str) -> bool {
        if self.current == href {
            return false;
        }
        self.current = href.to_string();
        true
    }
}

/// How the content script should start on a freshly loaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorStart {
    /// Internal page: send this report and do nothing else
    Skip(ExtensionMessage),
    /// Scan now and keep watching for in-page navigation
    Watch,
}

/// Per-document monitor state
#[derive(Debug, Clone)]
pub struct PageMonitor {
    config: GuardConfig,
    tracker: NavigationTracker,
}

impl PageMonitor {
    pub fn new(config: GuardConfig, href: impl Into<String>) -> Self {
        Self {
            config,
            tracker: NavigationTracker::new(href),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn start(&self) -> MonitorStart {
        if is_exempt(self.tracker.current(), &self.config.exempt_prefixes) {
            MonitorStart::Skip(ExtensionMessage::PageContentStatus {
                page_has_cyrillic: false,
            })
        } else {
            MonitorStart::Watch
        }
    }

    /// Called on every observed DOM mutation batch
    pub fn on_mutation(&mut self, href: &str) -> bool {
        self.tracker.observe(href)
    }

    /// Called on `popstate`; history navigation always warrants a re-check
    pub fn on_history_navigation(&mut self, href: &str) -> bool {
        self.tracker.observe(href);
        true
    }

    pub fn debounce_ms(&self) -> u32 {
        self.config.monitor.debounce_ms
    }

    pub fn assess(&self, hostname: &str, body_text: &str) -> PageAssessment {
        PageAssessment::assess(hostname, body_text)
    }
}
