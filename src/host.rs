//! Host media-center capabilities
//!
//! Everything the plugin needs from its host goes through [`Host`]: addon
//! control, per-addon string settings, notifications and dialogs. The
//! standalone binary uses [`crate::local_host::LocalHost`].

use std::time::Duration;

use crate::error::Result;

/// Heading shown on every notification and dialog
pub const ADDON_NAME: &str = "Annatel+";

/// Notification icon/severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub heading: String,
    pub text: String,
    pub severity: Severity,
    pub display_time: Duration,
    pub sound: bool,
}

impl Notification {
    pub fn new(text: &str, severity: Severity) -> Self {
        Self {
            heading: ADDON_NAME.to_string(),
            text: text.to_string(),
            severity,
            display_time: Duration::from_secs(5),
            sound: true,
        }
    }
}

pub trait Host: Send + Sync {
    /// Whether an addon with this id is installed and can be handed out
    fn is_addon_available(&self, addon_id: &str) -> bool;

    fn set_addon_enabled(&self, addon_id: &str, enabled: bool) -> Result<()>;

    fn setting(&self, addon_id: &str, key: &str) -> Option<String>;

    fn set_setting(&self, addon_id: &str, key: &str, value: &str) -> Result<()>;

    /// Open the settings screen of an addon; returns once the user closes it
    fn open_settings(&self, addon_id: &str);

    fn notify(&self, notification: &Notification);

    fn dialog_ok(&self, heading: &str, message: &str);

    fn dialog_yes_no(&self, heading: &str, message: &str) -> bool;

    fn notify_text(&self, text: &str, severity: Severity) {
        self.notify(&Notification::new(text, severity));
    }
}
