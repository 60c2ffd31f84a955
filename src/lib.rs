//! Annatel+ bridge for the IPTV Simple PVR backend
//!
//! Turns the Annatel channel API into an M3U playlist, keeps a local copy of
//! the XMLTV guide, and points the backend at both every few hours.

pub mod channels;
pub mod config;
pub mod context;
pub mod error;
pub mod guide;
pub mod host;
pub mod http;
pub mod local_host;
pub mod playlist;
pub mod plugin;
pub mod pvr;
pub mod refresh;

mod fsutil;

#[cfg(test)]
mod testing;

pub use error::{AuthError, Error, Result};
