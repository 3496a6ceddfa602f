use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    StatusCode, Url,
};

use crate::{
    config::{Config, SpotifyConfig},
    error::{Error, ErrorKind, Result},
    http::Client as HttpClient,
    protocol::{
        self,
        spotify::{CurrentlyPlaying, TokenResponse},
    },
    provider::Provider,
    token::Credential,
};

/// Spotify Web API client.
pub struct Spotify {
    http_client: HttpClient,
    config: SpotifyConfig,
    accounts_url: String,
    api_url: String,
}

impl Spotify {
    /// Host of the authorization code flow.
    const ACCOUNTS_URL: &'static str = "https://accounts.spotify.com";

    /// Host of the Web API.
    const API_URL: &'static str = "https://api.spotify.com";

    const TOKEN_PATH: &'static str = "/api/token";

    /// Profile of the current user; cheapest authenticated request.
    const ME_PATH: &'static str = "/v1/me";

    const CURRENTLY_PLAYING_PATH: &'static str = "/v1/me/player/currently-playing";

    /// The `Content-Type` of token exchange requests.
    const FORM_CONTENT: HeaderValue = HeaderValue::from_static("application/x-www-form-urlencoded");

    #[must_use]
    pub fn new(config: &Config, http_client: HttpClient) -> Self {
        Self {
            http_client,
            config: config.spotify.clone(),
            accounts_url: Self::ACCOUNTS_URL.to_owned(),
            api_url: Self::API_URL.to_owned(),
        }
    }

    /// Sends requests to other hosts, such as a local proxy.
    ///
    /// Both URLs are given without a trailing slash.
    #[must_use]
    pub fn with_base_urls(
        mut self,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        self.accounts_url = accounts_url.into();
        self.api_url = api_url.into();
        self
    }

    fn url(base: &str, path: &str) -> Result<Url> {
        format!("{base}{path}").parse::<Url>().map_err(Error::internal)
    }

    fn authorized_get(&self, url: Url, credential: &Credential) -> Result<reqwest::Request> {
        let mut request = self.http_client.get(url);
        request
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_str(&credential.bearer())?);

        Ok(request)
    }

    /// Form body of the authorization code grant.
    fn token_form(config: &SpotifyConfig, code: &str) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("redirect_uri", config.redirect_uri.as_str())
            .append_pair("client_id", &config.client_id)
            .append_pair("client_secret", &config.client_secret)
            .finish()
    }
}

#[async_trait]
impl Provider for Spotify {
    async fn validate(&self, credential: &Credential) -> Result<bool> {
        let request = self.authorized_get(Self::url(&self.api_url, Self::ME_PATH)?, credential)?;
        let response = self.http_client.execute(request).await?;

        let status = response.status();
        debug!("token check: {status}");

        Ok(status == StatusCode::OK)
    }

    async fn exchange(&self, code: &str) -> Result<Credential> {
        if code.is_empty() {
            return Err(Error::authorization("authorization code is empty"));
        }

        let mut request = self
            .http_client
            .post(
                Self::url(&self.accounts_url, Self::TOKEN_PATH)?,
                Self::token_form(&self.config, code),
            );
        request.headers_mut().insert(CONTENT_TYPE, Self::FORM_CONTENT);

        let to_authorization = |e: Error| e.with_kind(ErrorKind::Authorization);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(to_authorization)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::authorization)?;

        match protocol::json::<TokenResponse>(&body, "token").map_err(to_authorization)? {
            TokenResponse::Token(token) => {
                Credential::new(token.access_token).map_err(to_authorization)
            }
            TokenResponse::Error(e) => Err(Error::authorization(format!(
                "{status}: {}{}",
                e.error,
                e.error_description
                    .map(|description| format!(" ({description})"))
                    .unwrap_or_default()
            ))),
        }
    }

    async fn currently_playing(
        &self,
        credential: &Credential,
    ) -> Result<Option<CurrentlyPlaying>> {
        let url = Self::url(&self.api_url, Self::CURRENTLY_PLAYING_PATH)?;
        let request = self.authorized_get(url, credential)?;
        let response = self.http_client.execute(request).await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::unauthenticated(format!("currently playing: {status}")));
        }
        if !status.is_success() {
            return Err(Error::network(format!("currently playing: {status}")));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        protocol::json::<CurrentlyPlaying>(&body, "currently playing")
            .map(Some)
            .map_err(|e| e.with_kind(ErrorKind::Network))
    }
}
