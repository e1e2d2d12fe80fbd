//! Cyrillic homograph detection for browser tabs
//!
//! Platform-free core of the extension. The wasm crate wires these types to
//! the browser:
//! - `detector` / `lookalike`: character scanning and display enrichment
//! - `monitor`: content-script decisions (banner, report, SPA re-checks)
//! - `coordinator`: background per-tab status and badge
//! - `viewer`: popup state

pub mod badge;
pub mod config;
pub mod coordinator;
pub mod detector;
pub mod error;
pub mod hostname;
pub mod lookalike;
pub mod monitor;
pub mod protocol;
pub mod status;
pub mod viewer;

pub use badge::{BadgeSink, BadgeState};
pub use config::GuardConfig;
pub use coordinator::{Coordinator, TabChange, TabEvent};
pub use detector::{has_cyrillic, scan, DetectionResult, MatchedCharacter};
pub use error::GuardError;
pub use monitor::{BannerAction, BannerKind, MonitorStart, PageAssessment, PageMonitor};
pub use protocol::{ExtensionMessage, MessageResponse, StatusResponse};
pub use status::{TabId, TabStatus};
pub use viewer::{ActiveTab, StatusView, ViewerPlan, ViewerState};

/// Crate version, reported by the popup
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
