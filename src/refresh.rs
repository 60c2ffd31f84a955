//! Background refresh of the playlist and guide

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info};

use crate::channels::ChannelSource;
use crate::error::{Error, Result};
use crate::guide::GuideSource;
use crate::host::Host;
use crate::pvr::PvrSink;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(4 * 3600);

const THREAD_NAME: &str = "annatel-refresh";

/// Wait between iterations. Returns false once the loop should stop.
pub trait Delay: Send {
    fn wait(&self, duration: Duration) -> bool;
}

/// Cancellable timer: waits the full duration unless a stop is requested
pub struct StopSignal {
    rx: Receiver<()>,
}

/// Requests a stop from any thread
#[derive(Clone)]
pub struct Stopper(Sender<()>);

impl Stopper {
    pub fn stop(&self) {
        let _ = self.0.send(());
    }
}

pub fn stop_signal() -> (Stopper, StopSignal) {
    let (tx, rx) = channel();
    (Stopper(tx), StopSignal { rx })
}

impl Delay for StopSignal {
    fn wait(&self, duration: Duration) -> bool {
        match self.rx.recv_timeout(duration) {
            Ok(()) => false,
            Err(RecvTimeoutError::Timeout) => true,
            // nobody left to ask for a stop; keep the plain sleep semantics
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(duration);
                true
            }
        }
    }
}

pub struct RefreshLoop {
    host: Arc<dyn Host>,
    channels: ChannelSource,
    guide: GuideSource,
    pvr: PvrSink,
    interval: Duration,
}

impl RefreshLoop {
    pub fn new(host: Arc<dyn Host>, channels: ChannelSource, guide: GuideSource, pvr: PvrSink) -> Self {
        Self {
            host,
            channels,
            guide,
            pvr,
            interval: REFRESH_INTERVAL,
        }
    }

    /// Playlist, then guide, then backend. Stops at the first error so the
    /// backend never sees a half-applied configuration.
    pub fn run_iteration(&self) -> Result<()> {
        let playlist = self.channels.fetch_playlist()?;
        let guide = self.guide.ensure_fresh()?;
        self.pvr.apply_paths(&playlist, &guide)?;
        self.pvr.force_reload()
    }

    fn report(&self, err: &Error) {
        error!("Refresh failed: {}", err);
        self.host.notify_text(&err.to_string(), err.severity());
    }

    /// Iterate until `delay` says stop. Errors never end the loop.
    pub fn run(&self, delay: &dyn Delay) {
        loop {
            match self.run_iteration() {
                Ok(()) => info!("Refresh done, next in {}s", self.interval.as_secs()),
                Err(e) => self.report(&e),
            }

            if !delay.wait(self.interval) {
                info!("Refresh loop stopped");
                break;
            }
        }
    }

    pub fn spawn(self) -> Result<RefreshHandle> {
        let (stop, signal) = stop_signal();
        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run(&signal))
            .map_err(Error::Spawn)?;

        Ok(RefreshHandle { stop, thread })
    }
}

pub struct RefreshHandle {
    stop: Stopper,
    thread: JoinHandle<()>,
}

impl RefreshHandle {
    /// Ask the loop to stop at its next wait
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stopper(&self) -> Stopper {
        self.stop.clone()
    }

    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("{} thread panicked", THREAD_NAME);
        }
    }
}
