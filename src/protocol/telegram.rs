//! Telegram Bot API payloads.
//!
//! Captions are sent with `parse_mode=HTML`, which accepts a small subset of
//! HTML. Text must escape `<`, `>` and `&`; attribute values additionally
//! escape `"`.

use serde::{Deserialize, Serialize};
use url::Url;

/// Replacement media for `editMessageMedia`.
///
/// Serializes to `{"type":"photo","media":"<url>"}`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputMedia {
    Photo { media: Url },
}

/// Envelope of every Bot API response.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Response {
    pub ok: bool,
    pub description: Option<String>,
}

/// Formats the caption `name - artist`, hyperlinked to `link`.
///
/// Without an artist only the name is shown. Without a link the caption is
/// plain text.
#[must_use]
pub fn caption(name: &str, artist: Option<&str>, link: Option<&Url>) -> String {
    let text = match artist {
        Some(artist) => format!("{} - {}", escape(name), escape(artist)),
        None => escape(name),
    };

    match link {
        // `Url` keeps its serialization percent-encoded.
        Some(link) => format!("<a href=\"{}\">{text}</a>", escape(link.as_str())),
        None => text,
    }
}

/// Escapes text for Telegram's HTML parse mode.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for chr in text.chars() {
        match chr {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_payload() {
        let media = InputMedia::Photo {
            media: Url::parse("https://i.scdn.co/image/ab67").unwrap(),
        };
        assert_eq!(
            serde_json::to_string(&media).unwrap(),
            r#"{"type":"photo","media":"https://i.scdn.co/image/ab67"}"#
        );
    }

    #[test]
    fn linked_caption() {
        let link = Url::parse("https://open.spotify.com/track/4uLU6").unwrap();
        assert_eq!(
            caption("B", Some("ArtistB"), Some(&link)),
            r#"<a href="https://open.spotify.com/track/4uLU6">B - ArtistB</a>"#
        );
    }

    #[test]
    fn caption_escapes_markup() {
        let link = Url::parse("https://example.com/t?a=1&b=\"x y\"").unwrap();
        assert_eq!(
            caption("Rock & Roll <Live>", Some("AC/DC"), Some(&link)),
            "<a href=\"https://example.com/t?a=1&amp;b=%22x%20y%22\">Rock &amp; Roll &lt;Live&gt; - AC/DC</a>"
        );
    }

    #[test]
    fn caption_without_artist_or_link() {
        assert_eq!(caption("Episode 1", None, None), "Episode 1");
    }

    #[test]
    fn parses_error_response() {
        let response: Response = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: message is not modified"}"#,
        )
        .unwrap();
        assert!(!response.ok);
    }
}
