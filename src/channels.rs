//! Annatel channel API client
//!
//! The API answers `GET <api_url>?login=<user>&password=<pass>` with an XML
//! document whose root holds one element per channel:
//!
//! ```xml
//! <channels>
//!   <channel><name>TF1</name><logo>http://x/tf1.png</logo><url>http://stream/tf1</url></channel>
//! </channels>
//! ```
//!
//! There is no status convention: a rejected login still returns a channel
//! list, with the error message as the first channel's name.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use quick_xml::encoding::Decoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::context::AddonContext;
use crate::error::{AuthError, Error, Result};
use crate::fsutil::write_atomic;
use crate::host::{Host, Severity};
use crate::http::{redact_query, HttpFetch};
use crate::playlist::{render_playlist, Channel};

/// Substring of the first channel name when the account is not premium
pub const PREMIUM_REQUIRED_MARKER: &str = "un utilisateur premium pour utiliser";

/// The login check only looks at children with this tag
const CHANNEL_TAG: &str = "channel";

pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn from_host(host: &dyn Host, addon_id: &str) -> Self {
        Self {
            username: host.setting(addon_id, USERNAME_KEY).unwrap_or_default(),
            password: host.setting(addon_id, PASSWORD_KEY).unwrap_or_default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct ChannelSource {
    host: Arc<dyn Host>,
    addon_id: String,
    api_url: String,
    playlist_path: PathBuf,
    credentials: Credentials,
    fetcher: Box<dyn HttpFetch>,
}

impl ChannelSource {
    pub fn new(ctx: &AddonContext, fetcher: Box<dyn HttpFetch>) -> Self {
        let credentials = Credentials::from_host(ctx.host.as_ref(), &ctx.config.addon_id);
        Self {
            host: Arc::clone(&ctx.host),
            addon_id: ctx.config.addon_id.clone(),
            api_url: ctx.config.api_url.clone(),
            playlist_path: ctx.paths.playlist.clone(),
            credentials,
            fetcher,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Re-read credentials after the user edited the settings
    pub fn reload_credentials(&mut self) {
        self.credentials = Credentials::from_host(self.host.as_ref(), &self.addon_id);
        info!("Reloaded credentials for {:?}", self.credentials.username);
    }

    pub fn api_url(&self) -> String {
        format!(
            "{}?login={}&password={}",
            self.api_url,
            urlencoding::encode(&self.credentials.username),
            urlencoding::encode(&self.credentials.password)
        )
    }

    fn fetch_entries(&self) -> Result<Vec<ChannelEntry>> {
        let url = self.api_url();
        info!("Fetching channel list from {}", redact_query(&url));
        let body = self.fetcher.get(&url)?;
        parse_entries(&body)
    }

    /// Check the stored credentials against the API
    pub fn authenticate(&self) -> Result<()> {
        if !self.credentials.is_complete() {
            warn!("No credentials configured");
            self.host.notify_text("No Credentials", Severity::Error);
            return Err(AuthError::MissingCredentials.into());
        }

        let entries = self.fetch_entries()?;
        let first_channel = entries.iter().find(|entry| entry.tag == CHANNEL_TAG);
        if let Some(first) = first_channel.map(|entry| &entry.channel) {
            if first.name.contains(PREMIUM_REQUIRED_MARKER) {
                warn!("Annatel rejected credentials for {:?}", self.credentials.username);
                self.host.notify_text("Wrong Credentials", Severity::Error);
                return Err(AuthError::WrongCredentials.into());
            }
        }

        info!("Login successful ({} channels)", entries.len());
        self.host.notify_text("Login successful", Severity::Info);
        Ok(())
    }

    /// Fetch the channel list and rewrite the playlist file
    pub fn fetch_playlist(&self) -> Result<PathBuf> {
        self.host.notify_text("Updating links...", Severity::Info);

        let channels: Vec<Channel> = self
            .fetch_entries()?
            .into_iter()
            .map(|entry| entry.channel)
            .collect();
        let playlist = render_playlist(&channels);
        write_atomic(&self.playlist_path, playlist.as_bytes())?;

        info!(
            "Wrote {} channels to {}",
            channels.len(),
            self.playlist_path.display()
        );
        self.host.notify_text("Links Updated", Severity::Info);
        Ok(self.playlist_path.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Name,
    Logo,
    Url,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"name" => Some(Field::Name),
            b"logo" => Some(Field::Logo),
            b"url" => Some(Field::Url),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct PendingChannel {
    name: Option<String>,
    logo: Option<String>,
    url: Option<String>,
}

impl PendingChannel {
    fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Logo => &mut self.logo,
            Field::Url => &mut self.url,
        };
        // first occurrence wins
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    fn finish(self, index: usize) -> Result<Channel> {
        let name = self
            .name
            .ok_or_else(|| Error::Parse(format!("channel #{} has no <name>", index + 1)))?;
        let stream_url = self
            .url
            .ok_or_else(|| Error::Parse(format!("channel {:?} has no <url>", name)))?;

        Ok(Channel {
            name,
            logo_url: self.logo.unwrap_or_default(),
            stream_url,
        })
    }
}

/// A direct child of the root, with the tag it was found under
struct ChannelEntry {
    tag: String,
    channel: Channel,
}

/// Parse the API response. Channels are the direct children of the root,
/// in document order. The body is decoded by its BOM or its declared
/// encoding, UTF-8 when it has neither.
pub fn parse_channel_list(xml: impl AsRef<[u8]>) -> Result<Vec<Channel>> {
    Ok(parse_entries(xml.as_ref())?
        .into_iter()
        .map(|entry| entry.channel)
        .collect())
}

fn parse_entries(xml: &[u8]) -> Result<Vec<ChannelEntry>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut entries: Vec<ChannelEntry> = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut pending: Option<(String, PendingChannel)> = None;
    let mut field: Option<Field> = None;
    let mut text_buf = String::new();

    loop {
        let position = reader.buffer_position();
        let decoder = reader.decoder();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match depth {
                    1 => saw_root = true,
                    2 => {
                        let tag = decode(decoder, e.local_name().as_ref(), position)?;
                        pending = Some((tag, PendingChannel::default()));
                    }
                    3 => {
                        field = Field::from_tag(e.local_name().as_ref());
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match depth + 1 {
                1 => saw_root = true,
                2 => {
                    let tag = decode(decoder, e.local_name().as_ref(), position)?;
                    let channel = PendingChannel::default().finish(entries.len())?;
                    entries.push(ChannelEntry { tag, channel });
                }
                3 => {
                    if let (Some(f), Some((_, ch))) =
                        (Field::from_tag(e.local_name().as_ref()), pending.as_mut())
                    {
                        ch.set(f, "");
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if depth == 3 && field.is_some() => {
                text_buf.push_str(&decode_xml_entities(&decode(decoder, &e, position)?));
            }
            Ok(Event::CData(e)) if depth == 3 && field.is_some() => {
                text_buf.push_str(&decode(decoder, &e, position)?);
            }
            Ok(Event::GeneralRef(e)) if depth == 3 && field.is_some() => {
                text_buf.push_str(&resolve_reference(&decode(decoder, &e, position)?));
            }
            Ok(Event::End(_)) => {
                match depth {
                    3 => {
                        if let (Some(f), Some((_, ch))) = (field.take(), pending.as_mut()) {
                            ch.set(f, text_buf.trim());
                        }
                    }
                    2 => {
                        if let Some((tag, ch)) = pending.take() {
                            let channel = ch.finish(entries.len())?;
                            entries.push(ChannelEntry { tag, channel });
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Parse(format!("XML error at byte {}: {}", position, e)));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(Error::Parse("document has no root element".to_string()));
    }
    Ok(entries)
}

fn decode(decoder: Decoder, bytes: &[u8], position: u64) -> Result<String> {
    decoder
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|e| Error::Parse(format!("bad text encoding near byte {}: {}", position, e)))
}

/// Resolve `&name;` given the bare name, leaving unknown entities verbatim
fn resolve_reference(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(c) = value.and_then(char::from_u32) {
            return c.to_string();
        }
    } else if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{};", name)
}

/// Decode entities that the reader left inside a text run
fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) if end > 0 && !after[..end].contains(char::is_whitespace) => {
                result.push_str(&resolve_reference(&after[..end]));
                rest = &after[end + 1..];
            }
            _ => {
                result.push('&');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}
