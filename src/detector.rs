//! Deciding whether the channel message is out of date.

use std::fmt;

use crate::{messenger::MessageTarget, poller::NowPlaying};

/// What makes two tracks "the same" for the channel message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackIdentity {
    pub name: String,
    pub artist: Option<String>,
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.artist {
            Some(artist) => write!(f, "{} - {artist}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// When the published track is recorded relative to the publish attempt.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CommitPolicy {
    /// Record the track before publishing. A failed publish is a missed
    /// update; the next different track publishes again.
    #[default]
    BeforePublish,

    /// Record the track only after a successful publish. A failed publish
    /// is retried on the next poll that still sees the same track.
    AfterSuccess,
}

/// Last track pushed to the channel, and where it was pushed.
///
/// Lives in memory only; after a restart the first observed track is
/// published again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedState {
    track: Option<TrackIdentity>,
    target: MessageTarget,
}

impl PublishedState {
    #[must_use]
    pub fn new(target: MessageTarget) -> Self {
        Self {
            track: None,
            target,
        }
    }

    #[must_use]
    pub fn track(&self) -> Option<&TrackIdentity> {
        self.track.as_ref()
    }

    #[must_use]
    pub fn target(&self) -> &MessageTarget {
        &self.target
    }

    /// Records `track` as the one shown in the channel.
    pub fn mark(&mut self, track: TrackIdentity) {
        self.track = Some(track);
    }
}

/// Whether `now` differs from what was last published.
///
/// Compares name and artist by exact string equality. A track without a
/// name is never published.
#[must_use]
pub fn should_publish(now: &NowPlaying, published: &PublishedState) -> bool {
    if now.name.is_empty() {
        return false;
    }

    published.track.as_ref().is_none_or(|track| {
        track.name != now.name || track.artist != now.artist
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChatId;

    fn state() -> PublishedState {
        PublishedState::new(MessageTarget {
            chat_id: ChatId::Username("@channel".to_owned()),
            message_id: 1,
        })
    }

    fn now(name: &str, artist: &str) -> NowPlaying {
        NowPlaying {
            name: name.to_owned(),
            artist: Some(artist.to_owned()),
            cover: None,
            link: None,
            is_playing: true,
        }
    }

    /// Applies the detector the way the publisher does.
    fn observe(state: &mut PublishedState, now: &NowPlaying) -> bool {
        let publish = should_publish(now, state);
        if publish {
            state.mark(now.identity());
        }
        publish
    }

    #[test]
    fn first_track_is_published() {
        assert!(should_publish(&now("A", "X"), &state()));
    }

    #[test]
    fn identical_track_is_published_once() {
        let mut state = state();
        assert!(observe(&mut state, &now("A", "X")));
        assert!(!observe(&mut state, &now("A", "X")));
        assert!(!observe(&mut state, &now("A", "X")));
    }

    #[test]
    fn either_field_differing_publishes() {
        let mut state = state();
        assert!(observe(&mut state, &now("A", "X")));
        assert!(observe(&mut state, &now("B", "X")));
        assert!(observe(&mut state, &now("B", "Y")));
        assert!(!observe(&mut state, &now("B", "Y")));
        assert!(observe(&mut state, &now("A", "X")));
    }

    #[test]
    fn comparison_is_exact() {
        let mut state = state();
        assert!(observe(&mut state, &now("Song", "Artist")));
        assert!(observe(&mut state, &now("song", "Artist")));
        assert!(observe(&mut state, &now("song ", "Artist")));
    }

    #[test]
    fn missing_artist_differs_from_present() {
        let mut state = state();
        let mut without_artist = now("A", "X");
        without_artist.artist = None;

        assert!(observe(&mut state, &now("A", "X")));
        assert!(observe(&mut state, &without_artist));
        assert!(!observe(&mut state, &without_artist));
    }

    #[test]
    fn nameless_track_is_not_published() {
        assert!(!should_publish(&now("", "X"), &state()));
    }

    #[test]
    fn identity_display() {
        assert_eq!(now("A", "X").identity().to_string(), "A - X");
    }
}
