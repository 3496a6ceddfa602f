//! Fetching what the user is listening to.

use url::Url;

use crate::{
    detector::TrackIdentity,
    error::ErrorKind,
    protocol::{self, spotify::CurrentlyPlaying},
    provider::Provider,
    token::Credential,
};

/// Snapshot of the active track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NowPlaying {
    pub name: String,
    pub artist: Option<String>,
    pub cover: Option<Url>,
    pub link: Option<Url>,
    pub is_playing: bool,
}

impl NowPlaying {
    /// Extracts the active track from a playback state.
    ///
    /// Returns `None` when there is no item or the item has no name.
    #[must_use]
    pub fn from_playback(playback: CurrentlyPlaying) -> Option<Self> {
        let item = playback.item?;
        let name = item.name.clone().filter(|name| !name.is_empty())?;

        Some(Self {
            artist: item.artist().map(ToOwned::to_owned),
            cover: item.cover().cloned(),
            link: item.external_urls.spotify,
            name,
            is_playing: playback.is_playing,
        })
    }

    #[must_use]
    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity {
            name: self.name.clone(),
            artist: self.artist.clone(),
        }
    }

    /// Caption markup for the channel message.
    #[must_use]
    pub fn caption(&self) -> String {
        protocol::telegram::caption(&self.name, self.artist.as_deref(), self.link.as_ref())
    }
}

/// Asks the provider what is playing.
///
/// Every way of not getting a track is "nothing to report": no credential,
/// a failed request, an empty response or a response without a playable
/// item. None of them are raised.
pub async fn fetch_current<P>(provider: &P, credential: Option<&Credential>) -> Option<NowPlaying>
where
    P: Provider + ?Sized,
{
    let Some(credential) = credential else {
        error!("access token is not available");
        return None;
    };

    let playback = match provider.currently_playing(credential).await {
        Ok(Some(playback)) => playback,
        Ok(None) => {
            debug!("no music currently playing");
            return None;
        }
        Err(e) if e.kind == ErrorKind::Unauthenticated => {
            warn!("access token was rejected; waiting for revalidation");
            return None;
        }
        Err(e) => {
            warn!("error getting track information: {e}");
            return None;
        }
    };

    let now_playing = NowPlaying::from_playback(playback);
    match &now_playing {
        Some(now) if !now.is_playing => debug!("{} is paused", now.name),
        Some(_) => {}
        None => debug!("no music currently playing"),
    }

    now_playing
}
