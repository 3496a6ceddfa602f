//! The music provider as seen by the relay.
//!
//! [`Provider`] is the seam between the relay's state machine and the Spotify
//! Web API. [`crate::spotify::Spotify`] implements it over HTTP; tests supply
//! scripted implementations.

use async_trait::async_trait;

use crate::{error::Result, protocol::spotify::CurrentlyPlaying, token::Credential};

#[async_trait]
pub trait Provider: Send + Sync {
    /// Checks whether the provider currently accepts `credential`.
    ///
    /// # Errors
    ///
    /// Returns `Network` when the check itself could not be performed, so
    /// that callers can log it apart from a rejected credential.
    async fn validate(&self, credential: &Credential) -> Result<bool>;

    /// Exchanges a one-time authorization code for an access credential.
    ///
    /// # Errors
    ///
    /// Returns `Authorization` if the request fails or its response cannot
    /// be understood.
    async fn exchange(&self, code: &str) -> Result<Credential>;

    /// Fetches the user's playback state.
    ///
    /// Returns `Ok(None)` when the provider reports no playback at all.
    ///
    /// # Errors
    ///
    /// Returns `Network` on transport failures or unexpected responses.
    async fn currently_playing(&self, credential: &Credential)
        -> Result<Option<CurrentlyPlaying>>;
}
