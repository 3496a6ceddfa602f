//! The messaging channel as seen by the relay.

use std::fmt;

use async_trait::async_trait;
use url::Url;

use crate::{config::ChatId, error::Result};

/// Address of the message kept in sync with playback.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageTarget {
    pub chat_id: ChatId,
    pub message_id: i64,
}

impl fmt::Display for MessageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.message_id)
    }
}

/// Edits an existing photo message.
///
/// Implementations report transport failures only. Whatever the messaging
/// provider answers to a dispatched edit is not an error.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Replaces the photo of the target message.
    async fn edit_media(&self, target: &MessageTarget, media: &Url) -> Result<()>;

    /// Replaces the caption of the target message with HTML markup.
    async fn edit_caption(&self, target: &MessageTarget, caption: &str) -> Result<()>;
}
