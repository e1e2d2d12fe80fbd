//! Messages exchanged between the content script, popup and background
//!
//! Wire format is JSON with a `type` tag and camelCase fields:
//!
//! ```json
//! {"type": "pageContentStatus", "pageHasCyrillic": true}
//! {"type": "getCyrillicStatus", "tabId": 12}
//! ```

use crate::error::GuardError;
use crate::status::{TabId, TabStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExtensionMessage {
    /// Page Monitor -> Coordinator
    #[serde(rename_all = "camelCase")]
    PageContentStatus { page_has_cyrillic: bool },
    /// Status Viewer -> Coordinator
    #[serde(rename_all = "camelCase")]
    GetCyrillicStatus { tab_id: TabId },
}

impl ExtensionMessage {
    pub fn from_json(s: &str) -> Result<Self, GuardError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, GuardError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Answer to `getCyrillicStatus`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub url_has_cyrillic: bool,
    pub page_has_cyrillic: bool,
    pub combined_has_cyrillic: bool,
}

impl From<TabStatus> for StatusResponse {
    fn from(status: TabStatus) -> Self {
        Self {
            url_has_cyrillic: status.url_has_cyrillic,
            page_has_cyrillic: status.page_has_cyrillic,
            combined_has_cyrillic: status.combined(),
        }
    }
}

/// Acknowledgement of `pageContentStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

/// Any coordinator reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageResponse {
    Status(StatusResponse),
    Ack(Ack),
}
