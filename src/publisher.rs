//! Pushing the active track to the channel message.
//!
//! A publish is two ordered edits of the same message:
//! 1. Replace the photo with the track's cover art.
//! 2. Wait for the settle delay.
//! 3. Replace the caption with a link to the track.
//!
//! The caption edit is rejected or raced by Telegram when it follows the
//! media edit too closely, hence the delay. A failing step aborts the steps
//! after it; nothing is retried within a publish.

use std::{sync::Arc, time::Duration};

use crate::{
    detector::{self, CommitPolicy, PublishedState},
    error::{Error, ErrorKind, Result},
    messenger::Messenger,
    poller::NowPlaying,
};

/// Result of offering a track to the publisher.
#[derive(Debug)]
pub enum Update {
    /// The channel already shows this track.
    Unchanged,

    /// Both edits were dispatched.
    Published,

    /// An edit failed; the remaining ones were not attempted.
    Failed(Error),
}

/// Owner of the channel message and of what it currently shows.
pub struct Publisher {
    messenger: Arc<dyn Messenger>,
    published: PublishedState,
    settle_delay: Duration,
    policy: CommitPolicy,
}

impl Publisher {
    #[must_use]
    pub fn new(
        messenger: Arc<dyn Messenger>,
        published: PublishedState,
        settle_delay: Duration,
        policy: CommitPolicy,
    ) -> Self {
        Self {
            messenger,
            published,
            settle_delay,
            policy,
        }
    }

    #[must_use]
    pub fn published(&self) -> &PublishedState {
        &self.published
    }

    /// Publishes `now` if it differs from what the channel shows.
    ///
    /// With [`CommitPolicy::BeforePublish`] the track counts as published as
    /// soon as the attempt starts, so a failure is not retried for the same
    /// track. With [`CommitPolicy::AfterSuccess`] it only counts once both
    /// edits went out.
    pub async fn update(&mut self, now: &NowPlaying) -> Update {
        if !detector::should_publish(now, &self.published) {
            debug!("current track is the same as before; not updating message");
            return Update::Unchanged;
        }

        let identity = now.identity();
        if self.policy == CommitPolicy::BeforePublish {
            self.published.mark(identity.clone());
        }

        match self.publish(now).await {
            Ok(()) => {
                info!("status updated successfully: {identity}");
                if self.policy == CommitPolicy::AfterSuccess {
                    self.published.mark(identity);
                }
                Update::Published
            }
            Err(e) => {
                error!("error updating message: {e}");
                Update::Failed(e)
            }
        }
    }

    /// Performs the media edit, the settle delay and the caption edit.
    ///
    /// A track without cover art only gets its caption replaced.
    ///
    /// # Errors
    ///
    /// Returns `Publish` as soon as either edit fails to be dispatched.
    pub async fn publish(&self, now: &NowPlaying) -> Result<()> {
        let target = self.published.target();
        let to_publish = |e: Error| e.with_kind(ErrorKind::Publish);

        if let Some(cover) = &now.cover {
            self.messenger
                .edit_media(target, cover)
                .await
                .map_err(to_publish)?;
            trace!("media of {target} replaced; settling for {:?}", self.settle_delay);

            tokio::time::sleep(self.settle_delay).await;
        } else {
            debug!("{} has no cover art; keeping the current photo", now.name);
        }

        self.messenger
            .edit_caption(target, &now.caption())
            .await
            .map_err(to_publish)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::{
        config::ChatId,
        fakes::{track, Edit, FakeMessenger},
        messenger::MessageTarget,
    };

    const SETTLE_DELAY: Duration = Duration::from_millis(1500);

    fn publisher(messenger: &Arc<FakeMessenger>, policy: CommitPolicy) -> Publisher {
        let target = MessageTarget {
            chat_id: ChatId::Id(-100),
            message_id: 7,
        };
        Publisher::new(
            Arc::clone(messenger) as Arc<dyn Messenger>,
            PublishedState::new(target),
            SETTLE_DELAY,
            policy,
        )
    }

    fn now(name: &str, artist: &str) -> NowPlaying {
        NowPlaying::from_playback(track(name, artist)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn media_precedes_caption_by_settle_delay() {
        let messenger = Arc::new(FakeMessenger::default());
        let mut publisher = publisher(&messenger, CommitPolicy::default());

        assert!(matches!(publisher.update(&now("B", "ArtistB")).await, Update::Published));

        let edits = messenger.edits.lock().unwrap().clone();
        assert_eq!(edits.len(), 2);
        let (media_at, media) = &edits[0];
        let (caption_at, caption) = &edits[1];
        assert_eq!(
            *media,
            Edit::Media("https://i.scdn.co/image/B".parse().unwrap())
        );
        assert_eq!(
            *caption,
            Edit::Caption(r#"<a href="https://open.spotify.com/track/B">B - ArtistB</a>"#.to_owned())
        );
        assert!(*caption_at - *media_at >= SETTLE_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn same_track_is_not_republished() {
        let messenger = Arc::new(FakeMessenger::default());
        let mut publisher = publisher(&messenger, CommitPolicy::default());

        assert!(matches!(publisher.update(&now("A", "X")).await, Update::Published));
        assert!(matches!(publisher.update(&now("A", "X")).await, Update::Unchanged));
        assert_eq!(messenger.edits().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_media_edit_skips_caption() {
        let messenger = Arc::new(FakeMessenger::default());
        messenger.fail_media.store(true, Ordering::SeqCst);
        let mut publisher = publisher(&messenger, CommitPolicy::BeforePublish);

        match publisher.update(&now("A", "X")).await {
            Update::Failed(e) => assert_eq!(e.kind, ErrorKind::Publish),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(messenger.edits().is_empty());

        // Committed optimistically: the same track does not retrigger.
        assert_eq!(publisher.published().track(), Some(&now("A", "X").identity()));
        messenger.fail_media.store(false, Ordering::SeqCst);
        assert!(matches!(publisher.update(&now("A", "X")).await, Update::Unchanged));
        assert!(messenger.edits().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_publish_is_retried_after_success_policy() {
        let messenger = Arc::new(FakeMessenger::default());
        messenger.fail_caption.store(true, Ordering::SeqCst);
        let mut publisher = publisher(&messenger, CommitPolicy::AfterSuccess);

        assert!(matches!(publisher.update(&now("A", "X")).await, Update::Failed(_)));
        assert_eq!(publisher.published().track(), None);

        messenger.fail_caption.store(false, Ordering::SeqCst);
        assert!(matches!(publisher.update(&now("A", "X")).await, Update::Published));
        assert_eq!(publisher.published().track(), Some(&now("A", "X").identity()));
        assert!(matches!(publisher.update(&now("A", "X")).await, Update::Unchanged));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_cover_only_edits_caption() {
        let messenger = Arc::new(FakeMessenger::default());
        let mut publisher = publisher(&messenger, CommitPolicy::default());
        let mut without_cover = now("A", "X");
        without_cover.cover = None;

        assert!(matches!(publisher.update(&without_cover).await, Update::Published));
        assert!(matches!(messenger.edits().as_slice(), [Edit::Caption(_)]));
    }
}
