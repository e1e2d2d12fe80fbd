use thiserror::Error;

use crate::status::TabId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Page report arrived without an originating tab")]
    MissingSenderTab,

    #[error("Tab {tab_id} is no longer available: {reason}")]
    TabUnavailable { tab_id: TabId, reason: String },

    #[error("Unable to get status: {0}")]
    CoordinatorUnreachable(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for GuardError {
    fn from(e: serde_json::Error) -> Self {
        GuardError::InvalidMessage(e.to_string())
    }
}
