//! Extension configuration
//!
//! Every field has a default so a partial JSON object (or none at all) is a
//! valid configuration. The wasm entry points accept the same shape as a JS
//! object.

use crate::error::GuardError;
use serde::{Deserialize, Serialize};

/// Top-level configuration shared by all three execution contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardConfig {
    /// URL prefixes that are never scanned
    #[serde(default = "default_exempt_prefixes")]
    pub exempt_prefixes: Vec<String>,
    /// In-page navigation settings
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Warning banner settings
    #[serde(default)]
    pub banner: BannerConfig,
    /// Toolbar badge settings
    #[serde(default)]
    pub badge: BadgeConfig,
    /// Maximum log level (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            exempt_prefixes: default_exempt_prefixes(),
            monitor: MonitorConfig::default(),
            banner: BannerConfig::default(),
            badge: BadgeConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl GuardConfig {
    /// Parse and validate configuration from JSON
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidConfig`] if the JSON is malformed or a
    /// value fails validation.
    pub fn from_json(s: &str) -> Result<Self, GuardError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| GuardError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the extension silently useless
    pub fn validate(&self) -> Result<(), GuardError> {
        if self.badge.warning_text.is_empty() {
            return Err(GuardError::InvalidConfig(
                "badge.warningText must not be empty".to_string(),
            ));
        }
        if self.banner.timeout_ms == 0 {
            return Err(GuardError::InvalidConfig(
                "banner.timeoutMs must be greater than zero".to_string(),
            ));
        }
        if self.exempt_prefixes.iter().any(|p| p.is_empty()) {
            return Err(GuardError::InvalidConfig(
                "exemptPrefixes must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for single-page-app navigation detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Delay before re-scanning after a navigation is noticed (default: 100)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerConfig {
    /// Auto-dismiss delay (default: 10000)
    #[serde(default = "default_banner_timeout_ms")]
    pub timeout_ms: u32,
    /// Fade-out duration before removal (default: 500)
    #[serde(default = "default_banner_fade_ms")]
    pub fade_ms: u32,
    /// Body top padding while the banner is shown
    #[serde(default = "default_banner_padding")]
    pub body_padding: String,
    #[serde(default = "default_url_warning")]
    pub url_warning: String,
    #[serde(default = "default_content_warning")]
    pub content_warning: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_banner_timeout_ms(),
            fade_ms: default_banner_fade_ms(),
            body_padding: default_banner_padding(),
            url_warning: default_url_warning(),
            content_warning: default_content_warning(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeConfig {
    #[serde(default = "default_badge_text")]
    pub warning_text: String,
    #[serde(default = "default_badge_color")]
    pub warning_color: String,
    #[serde(default = "default_warning_title")]
    pub warning_title: String,
    #[serde(default = "default_normal_title")]
    pub normal_title: String,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            warning_text: default_badge_text(),
            warning_color: default_badge_color(),
            warning_title: default_warning_title(),
            normal_title: default_normal_title(),
        }
    }
}

fn default_exempt_prefixes() -> Vec<String> {
    [
        "chrome-extension://",
        "chrome://",
        "edge://",
        "moz-extension://",
        "about:",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_debounce_ms() -> u32 {
    100
}

fn default_banner_timeout_ms() -> u32 {
    10_000
}

fn default_banner_fade_ms() -> u32 {
    500
}

fn default_banner_padding() -> String {
    "40px".to_string()
}

fn default_url_warning() -> String {
    "Warning: This URL contains Cyrillic characters that may indicate a phishing attempt"
        .to_string()
}

fn default_content_warning() -> String {
    "Warning: Cyrillic characters detected in page content which may be suspicious".to_string()
}

fn default_badge_text() -> String {
    "⚠".to_string()
}

fn default_badge_color() -> String {
    "#FF4444".to_string()
}

fn default_warning_title() -> String {
    "Cyrillic characters detected - Click for details".to_string()
}

fn default_normal_title() -> String {
    "Cyrillic URL Detector - No threats detected".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = GuardConfig::from_json("{}").unwrap();
        assert_eq!(config, GuardConfig::default());
        assert_eq!(config.monitor.debounce_ms, 100);
        assert_eq!(config.banner.timeout_ms, 10_000);
        assert_eq!(config.exempt_prefixes.len(), 5);
    }

    #[test]
    fn test_partial_override() {
        let config = GuardConfig::from_json(
            r##"{"monitor": {"debounceMs": 250}, "badge": {"warningColor": "#000000"}}"##,
        )
        .unwrap();
        assert_eq!(config.monitor.debounce_ms, 250);
        assert_eq!(config.badge.warning_color, "#000000");
        assert_eq!(config.badge.warning_text, "⚠");
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = GuardConfig::from_json("{not json");
        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = GuardConfig::from_json(r#"{"banner": {"timeoutMs": 0}}"#);
        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_badge_glyph_rejected() {
        let result = GuardConfig::from_json(r#"{"badge": {"warningText": ""}}"#);
        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_exempt_prefix_rejected() {
        let result = GuardConfig::from_json(r#"{"exemptPrefixes": ["chrome://", ""]}"#);
        assert!(matches!(result, Err(GuardError::InvalidConfig(_))));
    }
}
