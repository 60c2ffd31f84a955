//! XMLTV guide download and local cache
//!
//! The feed is a gzip-compressed XMLTV document. It is stored decompressed
//! under the profile and only fetched again once the local copy is older
//! than [`GUIDE_MAX_AGE`].

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use flate2::read::MultiGzDecoder;
use log::{debug, info};

use crate::context::AddonContext;
use crate::error::{Error, Result};
use crate::fsutil::write_atomic;
use crate::host::{Host, Severity};
use crate::http::HttpFetch;

pub const GUIDE_MAX_AGE: Duration = Duration::from_secs(24 * 3600);

pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct GuideSource {
    host: Arc<dyn Host>,
    url: String,
    path: PathBuf,
    fetcher: Box<dyn HttpFetch>,
    clock: Box<dyn Clock>,
}

impl GuideSource {
    pub fn new(ctx: &AddonContext, fetcher: Box<dyn HttpFetch>) -> Self {
        Self {
            host: Arc::clone(&ctx.host),
            url: ctx.config.epg_url.clone(),
            path: ctx.paths.guide.clone(),
            fetcher,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Absent, unreadable, or strictly older than a day
    pub fn is_stale(&self) -> bool {
        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(_) => return true,
        };

        let max_age = TimeDelta::seconds(GUIDE_MAX_AGE.as_secs() as i64);
        let age = self.clock.now() - modified;
        debug!("Guide age: {}s", age.num_seconds());
        age > max_age
    }

    pub fn ensure_fresh(&self) -> Result<PathBuf> {
        if !self.is_stale() {
            return Ok(self.path.clone());
        }

        self.host.notify_text("Updating EPG...", Severity::Info);
        self.download_and_decompress()?;
        self.host.notify_text("EPG Updated", Severity::Info);
        Ok(self.path.clone())
    }

    /// GET the feed, gunzip it in memory, replace the guide file
    pub fn download_and_decompress(&self) -> Result<()> {
        info!("Downloading EPG from {}", self.url);
        let compressed = self.fetcher.get(&self.url)?;

        let mut xml = Vec::with_capacity(compressed.len() * 8);
        MultiGzDecoder::new(compressed.as_slice())
            .read_to_end(&mut xml)
            .map_err(Error::Decompression)?;

        write_atomic(&self.path, &xml)?;
        info!(
            "EPG written to {} ({} bytes from {} compressed)",
            self.path.display(),
            xml.len(),
            compressed.len()
        );
        Ok(())
    }
}
