//! Construction context handed to every component

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::host::Host;

pub const PLAYLIST_FILE: &str = "channels.m3u";
pub const GUIDE_FILE: &str = "tvguide.xml";

/// Fixed output locations inside the addon profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePaths {
    pub dir: PathBuf,
    pub playlist: PathBuf,
    pub guide: PathBuf,
}

impl ProfilePaths {
    /// Creates the profile directory. Paths are made absolute because the
    /// PVR backend resolves them on its own.
    pub fn prepare(dir: &Path) -> Result<Self> {
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| Error::io(dir, e))?
                .join(dir)
        };
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        Ok(Self {
            playlist: dir.join(PLAYLIST_FILE),
            guide: dir.join(GUIDE_FILE),
            dir,
        })
    }
}

#[derive(Clone)]
pub struct AddonContext {
    pub host: Arc<dyn Host>,
    pub config: AppConfig,
    pub paths: ProfilePaths,
}

impl AddonContext {
    pub fn new(host: Arc<dyn Host>, config: AppConfig) -> Result<Self> {
        let paths = ProfilePaths::prepare(&config.profile_dir())?;
        Ok(Self { host, config, paths })
    }
}
