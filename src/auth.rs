//! Authorization code flow.
//!
//! The user opens [`authorize_url`] in a browser, the provider redirects back
//! to the configured redirect URI with a one-time `code`, and [`exchange`]
//! trades that code for an access credential.

use url::Url;

use crate::{
    config::SpotifyConfig,
    error::{Error, Result},
    provider::Provider,
    store::TokenStore,
    token::Credential,
};

/// Scopes needed to read the user's playback.
pub const SCOPES: &str = "user-read-currently-playing";

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";

/// URL that starts the authorization code flow in the user's browser.
///
/// # Errors
///
/// Returns `Internal` if the URL cannot be built.
pub fn authorize_url(config: &SpotifyConfig) -> Result<Url> {
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", SCOPES),
        ],
    )
    .map_err(Error::internal)
}

/// Exchanges `code` for a credential and persists it.
///
/// Failing to persist is logged but does not fail the exchange: the returned
/// credential stays authoritative for this process.
///
/// # Errors
///
/// Returns `Authorization` if the exchange itself fails.
pub async fn exchange<P>(provider: &P, store: &TokenStore, code: &str) -> Result<Credential>
where
    P: Provider + ?Sized,
{
    let credential = provider.exchange(code).await.inspect_err(|e| {
        error!("error during authorization: {e}");
    })?;
    info!("authorized: {credential:?}");

    match store.save(&credential) {
        Ok(()) => info!("token saved to {}", store.path().display()),
        Err(e) => error!("error saving token: {e}"),
    }

    Ok(credential)
}
