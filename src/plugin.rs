//! Foreground start sequence
//!
//! Backend first, then the credential check, then exactly one refresh loop.
//! Anything that fails here is shown as a dialog and the loop never starts.

use std::sync::Arc;

use log::{error, info, warn};

use crate::channels::ChannelSource;
use crate::context::AddonContext;
use crate::error::{Error, Result};
use crate::guide::GuideSource;
use crate::host::{Host, ADDON_NAME};
use crate::http::{HttpFetch, UreqFetcher};
use crate::pvr::PvrSink;
use crate::refresh::{RefreshHandle, RefreshLoop};

pub const BACKEND_MISSING_MESSAGE: &str =
    "PVR IPTVSimple is disabled. Please enable it and restart Kodi";
pub const OPEN_SETTINGS_PROMPT: &str =
    "Open Annatel+ settings?\n(Enter your Annatel identifiers)";

pub struct Plugin {
    ctx: AddonContext,
    api_fetcher: Box<dyn HttpFetch>,
    epg_fetcher: Box<dyn HttpFetch>,
}

impl Plugin {
    pub fn new(ctx: AddonContext) -> Self {
        let api_fetcher = Box::new(UreqFetcher::new(&ctx.config));
        let epg_fetcher = Box::new(UreqFetcher::new(&ctx.config));
        Self::with_fetchers(ctx, api_fetcher, epg_fetcher)
    }

    pub fn with_fetchers(
        ctx: AddonContext,
        api_fetcher: Box<dyn HttpFetch>,
        epg_fetcher: Box<dyn HttpFetch>,
    ) -> Self {
        Self {
            ctx,
            api_fetcher,
            epg_fetcher,
        }
    }

    pub fn start(self) -> Result<RefreshHandle> {
        let host = Arc::clone(&self.ctx.host);

        let pvr = PvrSink::initialize(&self.ctx).map_err(|e| {
            error!("Cannot initialize PVR backend: {}", e);
            host.dialog_ok(ADDON_NAME, BACKEND_MISSING_MESSAGE);
            e
        })?;

        let mut channels = ChannelSource::new(&self.ctx, self.api_fetcher);
        check_credentials(host.as_ref(), &mut channels, &self.ctx.config.addon_id)?;

        let guide = GuideSource::new(&self.ctx, self.epg_fetcher);
        let handle = RefreshLoop::new(host, channels, guide, pvr).spawn()?;
        info!("Refresh loop started");
        Ok(handle)
    }
}

/// On rejected credentials, offer the settings screen once and re-check
fn check_credentials(host: &dyn Host, channels: &mut ChannelSource, addon_id: &str) -> Result<()> {
    let err = match channels.authenticate() {
        Ok(()) => return Ok(()),
        Err(Error::Auth(auth)) => {
            if !host.dialog_yes_no(ADDON_NAME, OPEN_SETTINGS_PROMPT) {
                warn!("Credentials rejected, settings declined");
                return Err(auth.into());
            }
            host.open_settings(addon_id);
            channels.reload_credentials();
            match channels.authenticate() {
                Ok(()) => return Ok(()),
                Err(e) => e,
            }
        }
        Err(e) => e,
    };

    error!("Credential check failed: {}", err);
    if !matches!(err, Error::Auth(_)) {
        host.dialog_ok(ADDON_NAME, &err.to_string());
    }
    Err(err)
}
