//! M3U playlist rendering for the IPTV Simple backend

pub const M3U_HEADER: &str = "#EXTM3U";

/// Fixed substitutions applied to display names, in order
const NAME_SUBSTITUTIONS: [(&str, &str); 3] = [("é", "e"), (" ", "_"), ("è", "e")];

/// Channel/Stream information from the Annatel API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub logo_url: String,
    pub stream_url: String,
}

impl Channel {
    pub fn new(name: &str, logo_url: &str, stream_url: &str) -> Self {
        Self {
            name: name.to_string(),
            logo_url: logo_url.to_string(),
            stream_url: stream_url.to_string(),
        }
    }

    /// `#EXTINF` metadata line for this channel
    pub fn extinf_line(&self) -> String {
        format!(
            "#EXTINF:1 tvg-logo=\"{}\",{}",
            self.logo_url,
            sanitize_name(&self.name)
        )
    }
}

/// Display name as the backend shows it. Not a transliteration: only the
/// characters in `NAME_SUBSTITUTIONS` are touched.
pub fn sanitize_name(name: &str) -> String {
    NAME_SUBSTITUTIONS
        .iter()
        .fold(name.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Header line, then an EXTINF/URL pair per channel. No trailing newline.
pub fn render_playlist(channels: &[Channel]) -> String {
    let mut lines = Vec::with_capacity(1 + channels.len() * 2);
    lines.push(M3U_HEADER.to_string());

    for channel in channels {
        lines.push(channel.extinf_line());
        lines.push(channel.stream_url.clone());
    }

    lines.join("\n")
}
