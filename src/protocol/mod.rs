//! Wire types of the external APIs.
//!
//! * [`spotify`] - Spotify Web API responses
//! * [`telegram`] - Telegram Bot API payloads and caption markup

pub mod spotify;
pub mod telegram;

use std::fmt::Debug;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Parses and logs a JSON response.
///
/// # Arguments
///
/// * `body` - Response body text to parse
/// * `origin` - Description of API endpoint for logging
///
/// # Errors
///
/// Returns `InvalidArgument` if the body is not valid JSON or does not match
/// type `T`. Callers re-classify the error for their domain.
///
/// # Logging
///
/// * Success: Logs parsed structure at TRACE level
/// * Parse Error: Logs raw JSON at TRACE level if valid JSON
/// * Invalid JSON: Logs error and raw text at ERROR level
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{origin}: {result:#?}");
            Ok(result)
        }
        Err(e) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                trace!("{origin}: {json:#?}");
            } else {
                error!("{origin}: failed parsing response ({e:?})");
                trace!("{body}");
            }
            Err(Error::invalid_argument(e))
        }
    }
}
