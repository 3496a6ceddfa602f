//! Spotify Web API response types.
//!
//! Only the fields the relay reads are modelled. Everything else in the
//! responses is ignored.
//!
//! # Example Response
//!
//! `GET /v1/me/player/currently-playing`:
//!
//! ```json
//! {
//!     "is_playing": true,
//!     "item": {
//!         "name": "Song",
//!         "artists": [{ "name": "Artist" }],
//!         "album": { "images": [{ "url": "https://i.scdn.co/image/ab67" }] },
//!         "external_urls": { "spotify": "https://open.spotify.com/track/4uLU6" }
//!     }
//! }
//! ```

use serde::Deserialize;
use url::Url;
use veil::Redact;

/// Playback state of the user's active device.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,

    /// `null` when nothing is playing or during an ad break.
    pub item: Option<Item>,
}

/// Track or episode being played.
///
/// Episodes lack `artists` and `album`, and local files lack
/// `external_urls`, so all of them are optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub name: Option<String>,

    #[serde(default)]
    pub artists: Vec<Artist>,

    pub album: Option<Album>,

    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Album {
    /// Largest first.
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub url: Url,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ExternalUrls {
    pub spotify: Option<Url>,
}

impl Item {
    /// Name of the first credited artist.
    #[must_use]
    pub fn artist(&self) -> Option<&str> {
        self.artists.first().map(|artist| artist.name.as_str())
    }

    /// Largest available cover art.
    #[must_use]
    pub fn cover(&self) -> Option<&Url> {
        self.album
            .as_ref()
            .and_then(|album| album.images.first())
            .map(|image| &image.url)
    }
}

/// Response of `POST https://accounts.spotify.com/api/token`.
///
/// The endpoint answers either with a token or with an OAuth error object.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TokenResponse {
    Token(Token),
    Error(TokenError),
}

#[derive(Clone, Deserialize, Redact, PartialEq, Eq)]
pub struct Token {
    #[redact]
    pub access_token: String,

    pub token_type: Option<String>,

    pub expires_in: Option<u64>,

    #[redact]
    pub refresh_token: Option<String>,

    pub scope: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TokenError {
    pub error: String,
    pub error_description: Option<String>,
}
