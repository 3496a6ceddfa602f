//! HTTP client shared by the Spotify and Telegram integrations.
//!
//! This module provides a wrapper around `reqwest::Client` that adds:
//! * A bounded timeout on every request, so one stuck call cannot starve
//!   the ticks after it
//! * Connection keep-alive between polls
//! * A consistent `User-Agent`
//!
//! # Example
//!
//! ```rust
//! use nowplaying_relay::http::Client;
//!
//! let client = Client::new(&config, Duration::from_secs(10))?;
//! let request = client.get(url);
//! let response = client.execute(request).await?;
//! ```

use std::{future::Future, time::Duration};

use futures_util::TryFutureExt;
use reqwest::{Body, Method, Url};

use crate::{
    config::Config,
    error::{Error, Result},
};

/// HTTP client with consistent timeouts and headers.
#[derive(Clone, Debug)]
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    /// Duration to keep idle connections alive.
    ///
    /// Polls happen every few seconds; reusing the connection avoids a TLS
    /// handshake on each of them.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Duration to wait for a connection to be established.
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration providing the user agent
    /// * `timeout` - Total time allowed for each request, body included
    ///
    /// # Errors
    ///
    /// Returns error if the TLS backend cannot be initialized.
    pub fn new(config: &Config, timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .connect_timeout(Self::CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { inner })
    }

    /// Builds a request with specified method, URL and body.
    pub fn request<U, T>(&self, method: Method, url: U, body: T) -> reqwest::Request
    where
        U: Into<Url>,
        T: Into<Body>,
    {
        let mut request = reqwest::Request::new(method, url.into());
        *request.body_mut() = Some(body.into());

        request
    }

    /// Builds a POST request.
    pub fn post<U, T>(&self, url: U, body: T) -> reqwest::Request
    where
        U: Into<Url>,
        T: Into<Body>,
    {
        self.request(Method::POST, url, body)
    }

    /// Builds a GET request without a body.
    pub fn get<U>(&self, url: U) -> reqwest::Request
    where
        U: Into<Url>,
    {
        reqwest::Request::new(Method::GET, url.into())
    }

    /// Executes a request.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the connection fails or the timeout elapses.
    /// The HTTP status of the response is not inspected.
    pub fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + '_ {
        self.inner.execute(request).map_err(Error::from)
    }

    /// Executes a request whose URL carries a secret.
    ///
    /// Same as [`Client::execute`], but the URL is stripped from errors so
    /// that they can be logged.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the connection fails or the timeout elapses.
    pub fn execute_redacted(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + '_ {
        self.inner
            .execute(request)
            .map_err(|e| Error::from(e.without_url()))
    }
}
