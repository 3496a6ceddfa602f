//! Error handling for the relay.
//!
//! Every fallible operation returns [`Result`], whose error carries an
//! [`ErrorKind`] classification next to the underlying error. The kinds follow
//! the failure domains of the relay:
//! * Credential record I/O and parsing ([`ErrorKind::Storage`])
//! * Token exchange ([`ErrorKind::Authorization`])
//! * Transport-level HTTP failures ([`ErrorKind::Network`])
//! * Channel message edits ([`ErrorKind::Publish`])
//!
//! None of these are fatal to the process. Callers decide whether a failure
//! degrades to "nothing to report", "try again next tick" or "reauthorize".
//!
//! # Example
//!
//! ```rust
//! use nowplaying_relay::error::{Error, ErrorKind, Result};
//!
//! fn read_record(path: &str) -> Result<String> {
//!     // `std::io::Error` converts into `ErrorKind::Storage`.
//!     let contents = std::fs::read_to_string(path)?;
//!     if contents.is_empty() {
//!         return Err(Error::storage("record is empty"));
//!     }
//!     Ok(contents)
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Main error type combining error kind and details.
#[derive(Debug)]
pub struct Error {
    /// Classification of the error
    pub kind: ErrorKind,

    /// Details of the underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Attempts to downcast the underlying error to a concrete type.
    ///
    /// # Example
    /// ```
    /// let error = Error::from(std::io::Error::other("oh no!"));
    ///
    /// if let Some(io_err) = error.downcast::<std::io::Error>() {
    ///     println!("IO error kind: {:?}", io_err.kind());
    /// }
    /// ```
    #[must_use]
    pub fn downcast<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.error.downcast_ref::<E>()
    }
}

/// Standard result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, Ord, PartialEq, PartialOrd)]
pub enum ErrorKind {
    /// The credential record could not be read, parsed or written.
    #[error("credential storage error")]
    Storage,

    /// Exchanging an authorization code for an access token failed.
    #[error("authorization failed")]
    Authorization,

    /// An HTTP call failed at the transport level, including timeouts.
    #[error("network error")]
    Network,

    /// Editing the channel message failed.
    #[error("publish failed")]
    Publish,

    /// Configuration or request parameters are malformed.
    #[error("invalid argument specified")]
    InvalidArgument,

    /// The provider rejected the access token.
    #[error("no valid authentication credentials")]
    Unauthenticated,

    /// The operation could not complete because its counterpart went away.
    #[error("operation was cancelled")]
    Cancelled,

    /// Invariant broken.
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Creates a new error with specified kind and details.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::new(ErrorKind::Network, "connection reset");
    /// assert_eq!(err.kind, ErrorKind::Network);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// Creates an error for credential record failures.
    ///
    /// The Token Store degrades these to "no credential" on load and logs
    /// them on save.
    pub fn storage<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Storage, error)
    }

    /// Creates an error for a failed token exchange.
    ///
    /// These are surfaced to whoever triggered the exchange.
    pub fn authorization<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Authorization, error)
    }

    /// Creates an error for transport-level HTTP failures.
    pub fn network<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Network, error)
    }

    /// Creates an error for a failed message edit.
    pub fn publish<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Publish, error)
    }

    /// Creates an error for malformed configuration or parameters.
    pub fn invalid_argument<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidArgument, error)
    }

    /// Creates an error for requests whose access token was rejected.
    pub fn unauthenticated<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Unauthenticated, error)
    }

    /// Creates an error for operations abandoned because the other side is gone.
    pub fn cancelled<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Cancelled, error)
    }

    /// Creates an error for broken invariants.
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Internal, error)
    }

    /// Re-classifies this error, keeping the underlying details.
    ///
    /// Used where the same low-level failure means different things to
    /// different callers, for example a transport error while editing a
    /// message is a [`ErrorKind::Publish`] failure.
    #[must_use]
    pub fn with_kind(self, kind: ErrorKind) -> Self {
        Self { kind, ..self }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

/// Formats the error as "{kind}: {details}".
impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: ", self.kind)?;
        self.error.fmt(fmt)
    }
}

/// Most file system access in the relay touches the credential record.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err)
    }
}

/// Converts HTTP client errors.
///
/// Builder errors point at a bug in request construction; everything else
/// (connect, timeout, body, decode) is treated as a transport failure.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::internal(err);
        }

        Self::network(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::invalid_argument(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::invalid_argument(e)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Self::invalid_argument(e)
    }
}
