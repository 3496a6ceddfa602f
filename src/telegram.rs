use async_trait::async_trait;
use reqwest::Url;
use veil::Redact;

use crate::{
    config::Config,
    error::{Error, ErrorKind, Result},
    http::Client as HttpClient,
    messenger::{MessageTarget, Messenger},
    protocol::telegram::{InputMedia, Response},
};

/// Telegram Bot API client.
#[derive(Redact)]
pub struct Telegram {
    http_client: HttpClient,

    #[redact]
    bot_token: String,

    api_url: String,
}

impl Telegram {
    const API_URL: &'static str = "https://api.telegram.org";

    #[must_use]
    pub fn new(config: &Config, http_client: HttpClient) -> Self {
        Self {
            http_client,
            bot_token: config.telegram.bot_token.clone(),
            api_url: Self::API_URL.to_owned(),
        }
    }

    /// Sends Bot API calls to another host, such as a local Bot API server.
    ///
    /// The URL is given without a trailing slash.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Builds the URL of a Bot API method call.
    ///
    /// The bot token is part of the path, so these URLs must never be
    /// logged.
    fn method_url(&self, method: &str, params: &[(&str, &str)]) -> Result<Url> {
        let url = format!("{}/bot{}/{method}", self.api_url, self.bot_token);
        Url::parse_with_params(&url, params).map_err(|_| {
            Error::invalid_argument(format!("cannot build url for {method}"))
        })
    }

    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<()> {
        let request = self.http_client.get(self.method_url(method, params)?);
        let response = self
            .http_client
            .execute_redacted(request)
            .await
            .map_err(|e| e.with_kind(ErrorKind::Publish))?;

        // The answer is informational: the edit has been dispatched.
        let status = response.status();
        match response.json::<Response>().await {
            Ok(Response { ok: true, .. }) => trace!("{method}: {status}"),
            Ok(Response { description, .. }) => warn!(
                "{method}: {status} {}",
                description.as_deref().unwrap_or("without description")
            ),
            Err(e) => debug!("{method}: {status}, unreadable response: {}", e.without_url()),
        }

        Ok(())
    }
}

#[async_trait]
impl Messenger for Telegram {
    async fn edit_media(&self, target: &MessageTarget, media: &Url) -> Result<()> {
        let chat_id = target.chat_id.to_string();
        let message_id = target.message_id.to_string();
        let media = serde_json::to_string(&InputMedia::Photo {
            media: media.clone(),
        })
        .map_err(Error::internal)?;

        self.call(
            "editMessageMedia",
            &[
                ("chat_id", &chat_id),
                ("message_id", &message_id),
                ("media", &media),
            ],
        )
        .await
    }

    async fn edit_caption(&self, target: &MessageTarget, caption: &str) -> Result<()> {
        let chat_id = target.chat_id.to_string();
        let message_id = target.message_id.to_string();

        self.call(
            "editMessageCaption",
            &[
                ("chat_id", &chat_id),
                ("message_id", &message_id),
                ("caption", caption),
                ("parse_mode", "HTML"),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{http::Uri, Router};
    use serde_json::json;

    use super::*;
    use crate::{config::ChatId, fakes};

    fn target() -> MessageTarget {
        MessageTarget {
            chat_id: ChatId::Username("@nowplaying".to_owned()),
            message_id: 7,
        }
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    /// Bot API stand-in answering every call with `reply`.
    ///
    /// Returns the base URL and the request URIs seen so far.
    async fn bot_api(reply: &'static str) -> (String, Arc<Mutex<Vec<Url>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let router = Router::new().fallback(move |uri: Uri| {
            let recorder = Arc::clone(&recorder);
            async move {
                let url = Url::parse(&format!("http://localhost{uri}")).unwrap();
                recorder.lock().unwrap().push(url);
                reply
            }
        });

        (fakes::serve(router).await, seen)
    }

    #[test]
    fn method_url_carries_token_and_parameters() {
        let telegram = Telegram::new(&fakes::config(), fakes::http_client());

        let url = telegram
            .method_url(
                "editMessageCaption",
                &[("chat_id", "@nowplaying"), ("caption", "<a href=\"x\">A & B</a>")],
            )
            .unwrap();
        assert_eq!(url.host_str(), Some("api.telegram.org"));
        assert_eq!(url.path(), "/bot123:XYZ/editMessageCaption");
        assert_eq!(
            query(&url),
            [
                ("chat_id".to_owned(), "@nowplaying".to_owned()),
                ("caption".to_owned(), "<a href=\"x\">A & B</a>".to_owned()),
            ]
        );
    }

    #[test]
    fn bot_token_is_redacted() {
        let telegram = Telegram::new(&fakes::config(), fakes::http_client());
        assert!(!format!("{telegram:?}").contains("XYZ"));
    }

    #[tokio::test]
    async fn edit_media_sends_photo() {
        let (base, seen) = bot_api(r#"{"ok":true,"result":true}"#).await;
        let telegram = Telegram::new(&fakes::config(), fakes::http_client()).with_api_url(base);

        let cover = "https://i.scdn.co/image/A".parse().unwrap();
        telegram.edit_media(&target(), &cover).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path(), "/bot123:XYZ/editMessageMedia");

        let params = query(&seen[0]);
        assert_eq!(params[0], ("chat_id".to_owned(), "@nowplaying".to_owned()));
        assert_eq!(params[1], ("message_id".to_owned(), "7".to_owned()));
        assert_eq!(params[2].0, "media");
        let media: serde_json::Value = serde_json::from_str(&params[2].1).unwrap();
        assert_eq!(
            media,
            json!({ "type": "photo", "media": "https://i.scdn.co/image/A" })
        );
    }

    #[tokio::test]
    async fn edit_caption_uses_html() {
        let (base, seen) = bot_api(r#"{"ok":true,"result":true}"#).await;
        let telegram = Telegram::new(&fakes::config(), fakes::http_client()).with_api_url(base);

        let caption = r#"<a href="https://open.spotify.com/track/A">A - X</a>"#;
        telegram.edit_caption(&target(), caption).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen[0].path(), "/bot123:XYZ/editMessageCaption");
        assert_eq!(
            query(&seen[0]),
            [
                ("chat_id".to_owned(), "@nowplaying".to_owned()),
                ("message_id".to_owned(), "7".to_owned()),
                ("caption".to_owned(), caption.to_owned()),
                ("parse_mode".to_owned(), "HTML".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_edit_is_not_an_error() {
        let (base, _) = bot_api(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: message is not modified"}"#,
        )
        .await;
        let telegram = Telegram::new(&fakes::config(), fakes::http_client()).with_api_url(base);

        assert!(telegram.edit_caption(&target(), "A").await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_api_is_a_publish_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let telegram = Telegram::new(&fakes::config(), fakes::http_client()).with_api_url(base);

        let err = telegram.edit_caption(&target(), "A").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Publish);
        assert!(!err.to_string().contains("XYZ"));
    }
}
