//! Scripted collaborators for unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use tokio::{net::TcpListener, time::Instant};
use url::Url;

use crate::{
    config::Config,
    error::{Error, Result},
    http::Client as HttpClient,
    messenger::{MessageTarget, Messenger},
    protocol::spotify::{Album, Artist, CurrentlyPlaying, ExternalUrls, Image, Item},
    provider::Provider,
    token::Credential,
};

/// Configuration with placeholder secrets.
pub fn config() -> Config {
    r#"
        [spotify]
        client_id = "abc"
        client_secret = "s3cr3t"
        redirect_uri = "http://localhost:3000/callback"

        [telegram]
        bot_token = "123:XYZ"
        channel_id = "@nowplaying"
        message_id = 7
    "#
    .parse()
    .unwrap()
}

pub fn http_client() -> HttpClient {
    HttpClient::new(&config(), Duration::from_secs(5)).unwrap()
}

/// Serves `router` on a local ephemeral port.
///
/// Returns the base URL without a trailing slash.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    format!("http://{addr}")
}

/// Playback of `name` by `artist`, with cover and link derived from the name.
pub fn track(name: &str, artist: &str) -> CurrentlyPlaying {
    CurrentlyPlaying {
        is_playing: true,
        item: Some(Item {
            name: Some(name.to_owned()),
            artists: vec![Artist {
                name: artist.to_owned(),
            }],
            album: Some(Album {
                images: vec![Image {
                    url: Url::parse(&format!("https://i.scdn.co/image/{name}")).unwrap(),
                }],
            }),
            external_urls: ExternalUrls {
                spotify: Some(Url::parse(&format!("https://open.spotify.com/track/{name}")).unwrap()),
            },
        }),
    }
}

#[derive(Default)]
pub struct FakeProvider {
    /// `None` simulates a network failure.
    pub validity: Mutex<Option<bool>>,
    /// `None` simulates a failed exchange.
    pub grant: Mutex<Option<String>>,
    /// One entry per poll; `Err` simulates a network failure.
    pub playing: Mutex<VecDeque<std::result::Result<Option<CurrentlyPlaying>, ()>>>,
    pub polls: Mutex<usize>,
}

impl FakeProvider {
    pub fn valid() -> Self {
        let provider = Self::default();
        *provider.validity.lock().unwrap() = Some(true);
        provider
    }

    pub fn script(&self, playing: impl IntoIterator<Item = Option<CurrentlyPlaying>>) {
        self.playing.lock().unwrap().extend(playing.into_iter().map(Ok));
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn validate(&self, _credential: &Credential) -> Result<bool> {
        self.validity
            .lock()
            .unwrap()
            .ok_or_else(|| Error::network("connection refused"))
    }

    async fn exchange(&self, code: &str) -> Result<Credential> {
        match self.grant.lock().unwrap().clone() {
            Some(token) => Credential::new(format!("{token}-{code}")),
            None => Err(Error::authorization("invalid_grant")),
        }
    }

    async fn currently_playing(&self, _credential: &Credential) -> Result<Option<CurrentlyPlaying>> {
        *self.polls.lock().unwrap() += 1;
        match self.playing.lock().unwrap().pop_front() {
            Some(Ok(playing)) => Ok(playing),
            Some(Err(())) => Err(Error::network("connection reset")),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    Media(Url),
    Caption(String),
}

#[derive(Default)]
pub struct FakeMessenger {
    pub edits: Mutex<Vec<(Instant, Edit)>>,
    pub fail_media: AtomicBool,
    pub fail_caption: AtomicBool,
}

impl FakeMessenger {
    pub fn edits(&self) -> Vec<Edit> {
        self.edits
            .lock()
            .unwrap()
            .iter()
            .map(|(_, edit)| edit.clone())
            .collect()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn edit_media(&self, _target: &MessageTarget, media: &Url) -> Result<()> {
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(Error::network("connection reset"));
        }
        self.edits
            .lock()
            .unwrap()
            .push((Instant::now(), Edit::Media(media.clone())));
        Ok(())
    }

    async fn edit_caption(&self, _target: &MessageTarget, caption: &str) -> Result<()> {
        if self.fail_caption.load(Ordering::SeqCst) {
            return Err(Error::network("connection reset"));
        }
        self.edits
            .lock()
            .unwrap()
            .push((Instant::now(), Edit::Caption(caption.to_owned())));
        Ok(())
    }
}
