//! Configuration management

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ANNATEL_PLUS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Id of this addon in the host settings store
    #[serde(default = "default_addon_id")]
    pub addon_id: String,
    /// Id of the PVR backend that consumes the playlist and guide
    #[serde(default = "default_backend_addon_id")]
    pub backend_addon_id: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_epg_url")]
    pub epg_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Root of the standalone host (settings store, installed addons)
    #[serde(default)]
    pub host_root: Option<PathBuf>,
    /// Where channels.m3u and tvguide.xml are written
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,
}

fn default_addon_id() -> String { "plugin.video.annatel-plus".to_string() }
fn default_backend_addon_id() -> String { "pvr.iptvsimple".to_string() }
fn default_api_url() -> String { "http://www.annatel.tv/api/getchannels".to_string() }
fn default_epg_url() -> String {
    "http://homebrain.3wfrance.fr:8001/annatel/XmltvAnnatel.xml.gz".to_string()
}
fn default_user_agent() -> String { format!("AnnatelPlus/{}", env!("CARGO_PKG_VERSION")) }
fn default_connect_timeout() -> u64 { 30 }
fn default_read_timeout() -> u64 { 120 }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addon_id: default_addon_id(),
            backend_addon_id: default_backend_addon_id(),
            api_url: default_api_url(),
            epg_url: default_epg_url(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            host_root: None,
            profile_dir: None,
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("annatel_plus");
        path.push("config.json");
        path
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Missing or unreadable files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Cannot read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).ok();
        }
        if let Ok(content) = serde_json::to_string_pretty(self) {
            if let Err(e) = fs::write(&path, content) {
                warn!("Cannot save config {}: {}", path.display(), e);
            }
        }
    }

    pub fn host_root(&self) -> PathBuf {
        self.host_root.clone().unwrap_or_else(|| {
            let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push("annatel_plus");
            path.push("host");
            path
        })
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            self.host_root().join("addon_data").join(&self.addon_id)
        })
    }
}
