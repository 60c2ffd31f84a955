//! IPTV Simple PVR backend control

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::context::AddonContext;
use crate::error::{Error, Result};
use crate::host::Host;

pub const M3U_PATH_TYPE_KEY: &str = "m3uPathType";
pub const M3U_PATH_KEY: &str = "m3uPath";
pub const EPG_PATH_TYPE_KEY: &str = "epgPathType";
pub const EPG_PATH_KEY: &str = "epgPath";

/// How IPTV Simple interprets a configured path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathType {
    LocalFile,
    RemoteUrl,
}

impl PathType {
    pub fn as_setting(&self) -> &'static str {
        match self {
            PathType::LocalFile => "0",
            PathType::RemoteUrl => "1",
        }
    }
}

pub struct PvrSink {
    host: Arc<dyn Host>,
    addon_id: String,
}

impl PvrSink {
    /// Enable the backend and make sure it can be driven
    pub fn initialize(ctx: &AddonContext) -> Result<Self> {
        let addon_id = ctx.config.backend_addon_id.clone();
        ctx.host.set_addon_enabled(&addon_id, true)?;

        if !ctx.host.is_addon_available(&addon_id) {
            return Err(Error::BackendUnavailable(addon_id));
        }

        info!("PVR backend {} enabled", addon_id);
        Ok(Self {
            host: Arc::clone(&ctx.host),
            addon_id,
        })
    }

    pub fn addon_id(&self) -> &str {
        &self.addon_id
    }

    /// Point the backend at local files. Does not reload it.
    pub fn apply_paths(&self, playlist: &Path, guide: &Path) -> Result<()> {
        let playlist = checked_path(playlist)?;
        let guide = checked_path(guide)?;
        let local = PathType::LocalFile.as_setting();

        self.host.set_setting(&self.addon_id, M3U_PATH_TYPE_KEY, local)?;
        self.host.set_setting(&self.addon_id, M3U_PATH_KEY, &playlist)?;
        self.host.set_setting(&self.addon_id, EPG_PATH_TYPE_KEY, local)?;
        self.host.set_setting(&self.addon_id, EPG_PATH_KEY, &guide)?;

        info!("Backend paths set: m3u={} epg={}", playlist, guide);
        Ok(())
    }

    /// Disable then re-enable, which makes the backend re-read its settings
    pub fn force_reload(&self) -> Result<()> {
        self.host.set_addon_enabled(&self.addon_id, false)?;
        self.host.set_addon_enabled(&self.addon_id, true)?;
        info!("PVR backend {} reloaded", self.addon_id);
        Ok(())
    }
}

/// The backend must only ever see absolute paths to existing files
fn checked_path(path: &Path) -> Result<String> {
    if !path.is_absolute() || !path.is_file() {
        return Err(Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not an existing absolute file"),
        ));
    }
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Settings(format!("path is not valid UTF-8: {}", path.display())))
}
