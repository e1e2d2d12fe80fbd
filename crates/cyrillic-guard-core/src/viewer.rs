//! Status viewer model
//!
//! The popup never caches: every open or refresh goes through [`plan`] and,
//! when a query is needed, [`complete`] with the coordinator's reply. A
//! failed or empty reply becomes [`ViewerState::Error`], never a safe verdict.

use crate::config::GuardConfig;
use crate::detector::scan;
use crate::error::GuardError;
use crate::hostname::{hostname, is_exempt};
use crate::lookalike::{describe, CharacterReport};
use crate::protocol::{ExtensionMessage, StatusResponse};
use crate::status::TabId;
use serde::Serialize;
use tracing::warn;

/// The active tab as reported by the tab API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveTab {
    pub id: Option<TabId>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Danger,
}

/// One per-category status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLine {
    pub label: &'static str,
    pub flagged: bool,
}

impl CategoryLine {
    pub fn text(&self) -> String {
        if self.flagged {
            format!("{}: Cyrillic detected", self.label)
        } else {
            format!("{}: Clean", self.label)
        }
    }
}

/// Everything the popup renders for a successful query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    /// Hostname when it can be extracted, otherwise the raw URL
    pub display_url: String,
    pub url_line: CategoryLine,
    pub content_line: CategoryLine,
    pub verdict: Verdict,
    /// Distinct Cyrillic characters of the hostname
    pub characters: Vec<CharacterReport>,
}

impl StatusView {
    pub fn new(url: &str, status: StatusResponse) -> Self {
        let host = hostname(url).ok();
        let characters = host
            .as_deref()
            .map(|h| describe(&scan(h)))
            .unwrap_or_default();

        let danger = status.url_has_cyrillic || status.page_has_cyrillic;

        Self {
            display_url: host.unwrap_or_else(|| url.to_string()),
            url_line: CategoryLine {
                label: "URL",
                flagged: status.url_has_cyrillic,
            },
            content_line: CategoryLine {
                label: "Content",
                flagged: status.page_has_cyrillic,
            },
            verdict: if danger { Verdict::Danger } else { Verdict::Safe },
            characters,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self.verdict {
            Verdict::Safe => "Page appears safe",
            Verdict::Danger => "Cyrillic characters detected!",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.verdict {
            Verdict::Safe => "✅",
            Verdict::Danger => "⚠️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    Loading,
    /// Extension or browser page; nothing to check
    InternalPage { url: String },
    Ready(StatusView),
    Error { message: String },
}

impl ViewerState {
    pub fn error(message: impl Into<String>) -> Self {
        ViewerState::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViewerState::Error { .. })
    }
}

/// Next step after the active tab is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerPlan {
    /// Nothing to ask the coordinator; render directly
    Render(ViewerState),
    /// Send `message` and pass the reply to [`complete`]
    Query {
        url: String,
        message: ExtensionMessage,
    },
}

pub fn plan(tab: Option<&ActiveTab>, config: &GuardConfig) -> ViewerPlan {
    let (id, url) = match tab {
        Some(ActiveTab {
            id: Some(id),
            url: Some(url),
        }) => (*id, url.clone()),
        _ => return ViewerPlan::Render(ViewerState::error("Cannot access current tab URL")),
    };

    if is_exempt(&url, &config.exempt_prefixes) {
        return ViewerPlan::Render(ViewerState::InternalPage { url });
    }

    ViewerPlan::Query {
        url,
        message: ExtensionMessage::GetCyrillicStatus { tab_id: id },
    }
}

/// Turn the coordinator's reply into a renderable state
///
/// `Ok(None)` means the message was delivered but nobody answered.
pub fn complete(url: &str, reply: Result<Option<StatusResponse>, GuardError>) -> ViewerState {
    match reply {
        Ok(Some(status)) => ViewerState::Ready(StatusView::new(url, status)),
        Ok(None) => {
            warn!("Coordinator returned no status");
            ViewerState::error(
                GuardError::CoordinatorUnreachable("no response".to_string()).to_string(),
            )
        }
        Err(e) => {
            warn!(error = %e, "Status query failed");
            ViewerState::error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tab(id: TabId, url: &str) -> ActiveTab {
        ActiveTab {
            id: Some(id),
            url: Some(url.to_string()),
        }
    }

    #[test]
    fn test_plan_queries_coordinator() {
        let plan = plan(Some(&tab(3, "https://example.com")), &GuardConfig::default());
        assert_eq!(
            plan,
            ViewerPlan::Query {
                url: "https://example.com".to_string(),
                message: ExtensionMessage::GetCyrillicStatus { tab_id: 3 },
            }
        );
    }

    #[test]
    fn test_plan_without_tab_is_error() {
        let config = GuardConfig::default();
        assert!(matches!(
            plan(None, &config),
            ViewerPlan::Render(ViewerState::Error { .. })
        ));
        let no_url = ActiveTab {
            id: Some(1),
            url: None,
        };
        assert!(matches!(
            plan(Some(&no_url), &config),
            ViewerPlan::Render(ViewerState::Error { .. })
        ));
    }

    #[test]
    fn test_plan_internal_page() {
        let plan = plan(Some(&tab(1, "chrome://extensions")), &GuardConfig::default());
        assert_eq!(
            plan,
            ViewerPlan::Render(ViewerState::InternalPage {
                url: "chrome://extensions".to_string()
            })
        );
    }

    #[test]
    fn test_unreachable_coordinator_is_not_safe() {
        let state = complete(
            "https://example.com",
            Err(GuardError::CoordinatorUnreachable(
                "Receiving end does not exist".to_string(),
            )),
        );
        assert!(state.is_error());

        let state = complete("https://example.com", Ok(None));
        assert_eq!(
            state,
            ViewerState::error("Unable to get status: no response")
        );
    }

    #[test]
    fn test_clean_status_renders_safe() {
        let state = complete("https://example.com/page", Ok(Some(StatusResponse::default())));
        let ViewerState::Ready(view) = state else {
            panic!("expected ready state");
        };
        assert_eq!(view.display_url, "example.com");
        assert_eq!(view.verdict, Verdict::Safe);
        assert_eq!(view.url_line.text(), "URL: Clean");
        assert_eq!(view.content_line.text(), "Content: Clean");
        assert_eq!(view.headline(), "Page appears safe");
        assert!(view.characters.is_empty());
    }

    #[test]
    fn test_flagged_hostname_lists_characters() {
        let status = StatusResponse {
            url_has_cyrillic: true,
            page_has_cyrillic: false,
            combined_has_cyrillic: true,
        };
        let ViewerState::Ready(view) = complete("https://xn--pple-43d.com/", Ok(Some(status)))
        else {
            panic!("expected ready state");
        };
        assert_eq!(view.display_url, "аpple.com");
        assert_eq!(view.verdict, Verdict::Danger);
        assert_eq!(view.url_line.text(), "URL: Cyrillic detected");
        assert_eq!(view.characters.len(), 1);
        assert_eq!(view.characters[0].unicode, "U+0430");
        assert_eq!(view.characters[0].look_alike, Some('a'));
    }

    #[test]
    fn test_content_only_is_danger() {
        let status = StatusResponse {
            url_has_cyrillic: false,
            page_has_cyrillic: true,
            combined_has_cyrillic: true,
        };
        let ViewerState::Ready(view) = complete("https://example.com", Ok(Some(status))) else {
            panic!("expected ready state");
        };
        assert_eq!(view.verdict, Verdict::Danger);
        assert_eq!(view.content_line.text(), "Content: Cyrillic detected");
        assert!(view.characters.is_empty());
    }
}
