use veil::Redact;

use crate::error::{Error, Result};

/// Bearer token authorizing calls to the Spotify Web API.
///
/// Only a few characters survive in `Debug` output, so credentials can be
/// logged to tell them apart without leaking them.
#[derive(Clone, PartialEq, Eq, Hash, Redact)]
pub struct Credential {
    #[redact(partial)]
    token: String,
}

impl Credential {
    /// Wraps an access token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the token is empty or contains
    /// characters that cannot be sent in an `Authorization` header.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::invalid_argument("access token is empty"));
        }
        if !token.chars().all(|chr| chr.is_ascii_graphic()) {
            return Err(Error::invalid_argument(
                "access token contains illegal characters",
            ));
        }

        Ok(Self { token })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
