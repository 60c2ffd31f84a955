//! Standalone host used by the `annatel-plus` binary
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/addons/<addon_id>/                 installed addons
//! <root>/addon_data/<addon_id>/settings.json
//! ```
//!
//! Notifications and dialogs go to the log. Yes/no dialogs read stdin only
//! when the host is interactive.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{error, info, warn};

use crate::error::{Error, Result};
use crate::fsutil::write_atomic;
use crate::host::{Host, Notification, Severity};

type Settings = BTreeMap<String, String>;

pub struct LocalHost {
    root: PathBuf,
    interactive: bool,
    enabled: Mutex<HashMap<String, bool>>,
    settings_lock: Mutex<()>,
}

impl LocalHost {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            interactive: false,
            enabled: Mutex::new(HashMap::new()),
            settings_lock: Mutex::new(()),
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Mark an addon as installed
    pub fn install(&self, addon_id: &str) -> Result<()> {
        let dir = self.root.join("addons").join(addon_id);
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))
    }

    pub fn is_enabled(&self, addon_id: &str) -> bool {
        self.enabled
            .lock()
            .map(|enabled| enabled.get(addon_id).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    pub fn settings_path(&self, addon_id: &str) -> PathBuf {
        self.root
            .join("addon_data")
            .join(addon_id)
            .join("settings.json")
    }

    fn read_settings(&self, addon_id: &str) -> Settings {
        let path = self.settings_path(addon_id);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring invalid settings {}: {}", path.display(), e);
                Settings::new()
            }),
            Err(_) => Settings::new(),
        }
    }
}

impl Host for LocalHost {
    fn is_addon_available(&self, addon_id: &str) -> bool {
        self.root.join("addons").join(addon_id).is_dir()
    }

    fn set_addon_enabled(&self, addon_id: &str, enabled: bool) -> Result<()> {
        if !self.is_addon_available(addon_id) {
            return Err(Error::BackendUnavailable(addon_id.to_string()));
        }
        let mut state = self
            .enabled
            .lock()
            .map_err(|_| Error::Settings("addon state lock poisoned".to_string()))?;
        state.insert(addon_id.to_string(), enabled);
        info!("Addon {} {}", addon_id, if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    fn setting(&self, addon_id: &str, key: &str) -> Option<String> {
        let _guard = self.settings_lock.lock().ok()?;
        self.read_settings(addon_id).remove(key)
    }

    fn set_setting(&self, addon_id: &str, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .settings_lock
            .lock()
            .map_err(|_| Error::Settings("settings lock poisoned".to_string()))?;

        let mut settings = self.read_settings(addon_id);
        settings.insert(key.to_string(), value.to_string());

        let path = self.settings_path(addon_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let content = serde_json::to_string_pretty(&settings)
            .map_err(|e| Error::Settings(e.to_string()))?;
        write_atomic(&path, content.as_bytes())
    }

    fn open_settings(&self, addon_id: &str) {
        info!(
            "Edit {} and press Enter to continue",
            self.settings_path(addon_id).display()
        );
        if self.interactive {
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
        }
    }

    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Info => info!("[{}] {}", notification.heading, notification.text),
            Severity::Warning => warn!("[{}] {}", notification.heading, notification.text),
            Severity::Error => error!("[{}] {}", notification.heading, notification.text),
        }
    }

    fn dialog_ok(&self, heading: &str, message: &str) {
        error!("[{}] {}", heading, message);
    }

    fn dialog_yes_no(&self, heading: &str, message: &str) -> bool {
        warn!("[{}] {} [y/N]", heading, message);
        if !self.interactive {
            return false;
        }
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }
}
