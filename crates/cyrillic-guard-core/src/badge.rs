//! Toolbar badge policy

use crate::config::BadgeConfig;
use crate::status::{TabId, TabStatus};

/// What the toolbar badge should show for one tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeState {
    pub text: String,
    /// Only set for the warning state; the normal state keeps the platform colour
    pub background_color: Option<String>,
    pub title: String,
}

impl BadgeState {
    pub fn warning(config: &BadgeConfig) -> Self {
        Self {
            text: config.warning_text.clone(),
            background_color: Some(config.warning_color.clone()),
            title: config.warning_title.clone(),
        }
    }

    pub fn normal(config: &BadgeConfig) -> Self {
        Self {
            text: String::new(),
            background_color: None,
            title: config.normal_title.clone(),
        }
    }

    /// Badge for a tab's combined status
    pub fn for_status(status: &TabStatus, config: &BadgeConfig) -> Self {
        if status.combined() {
            Self::warning(config)
        } else {
            Self::normal(config)
        }
    }

    pub fn is_warning(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Destination for badge updates
///
/// Implemented over `chrome.action` in the extension and by recorders in tests.
pub trait BadgeSink {
    fn apply(&mut self, tab_id: TabId, badge: &BadgeState);
}
