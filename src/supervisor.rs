//! The relay's control loop.
//!
//! A single task owns the credential, the published state and the timers.
//! Everything that changes them arrives as an event on that task:
//! * The polling timer, armed while a valid credential is held
//! * The re-validation timer, running for the process lifetime
//! * Authorization codes, re-validation and status requests from a [`Handle`]
//!
//! Since the loop handles one event at a time, a poll and its publish
//! complete before the next poll starts, and authorization never races a
//! poll.
//!
//! # Example
//!
//! ```rust
//! let (supervisor, handle) = Supervisor::new(provider, messenger, store, target, settings);
//! let task = tokio::spawn(supervisor.run());
//!
//! // From the OAuth callback:
//! handle.authorize(code).await?;
//!
//! // On shutdown:
//! handle.shutdown().await;
//! task.await?;
//! ```

use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    time::{self, Instant, Interval, MissedTickBehavior},
};

use crate::{
    auth,
    config::Settings,
    detector::{PublishedState, TrackIdentity},
    error::{Error, Result},
    messenger::{MessageTarget, Messenger},
    poller,
    provider::Provider,
    publisher::Publisher,
    store::TokenStore,
    token::Credential,
    validator,
};

/// Snapshot of the supervisor's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub authorized: bool,
    pub polling: bool,
    pub published: Option<TrackIdentity>,
}

enum Event {
    Authorize {
        code: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Revalidate,
    Status(oneshot::Sender<Status>),
    Shutdown,
}

/// Sends events to a running [`Supervisor`].
#[derive(Clone, Debug)]
pub struct Handle {
    tx: mpsc::Sender<Event>,
}

impl Handle {
    /// Exchanges an authorization code and starts polling.
    ///
    /// # Errors
    ///
    /// Returns `Authorization` if the exchange failed, or `Cancelled` if the
    /// supervisor is no longer running.
    pub async fn authorize(&self, code: impl Into<String>) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(Event::Authorize {
            code: code.into(),
            reply,
        })
        .await?;

        response.await.map_err(|_| Self::stopped())?
    }

    /// Re-reads the token record and checks the credential now instead of
    /// waiting for the next period.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if the supervisor is no longer running.
    pub async fn revalidate(&self) -> Result<()> {
        self.send(Event::Revalidate).await
    }

    /// # Errors
    ///
    /// Returns `Cancelled` if the supervisor is no longer running.
    pub async fn status(&self) -> Result<Status> {
        let (reply, response) = oneshot::channel();
        self.send(Event::Status(reply)).await?;
        response.await.map_err(|_| Self::stopped())
    }

    /// Stops the supervisor. Does nothing if it already stopped.
    pub async fn shutdown(&self) {
        let _ = self.send(Event::Shutdown).await;
    }

    async fn send(&self, event: Event) -> Result<()> {
        self.tx.send(event).await.map_err(|_| Self::stopped())
    }

    fn stopped() -> Error {
        Error::cancelled("supervisor is not running")
    }
}

/// State owned by the control loop.
struct Context {
    credential: Option<Credential>,
    publisher: Publisher,
}

pub struct Supervisor {
    provider: Arc<dyn Provider>,
    store: TokenStore,
    settings: Settings,
    context: Context,

    /// `Some` while polling is armed.
    poll_timer: Option<Interval>,

    events: mpsc::Receiver<Event>,
}

impl Supervisor {
    /// Pending events beyond this make senders wait.
    const EVENT_CAPACITY: usize = 16;

    #[must_use]
    pub fn new(
        provider: Arc<dyn Provider>,
        messenger: Arc<dyn Messenger>,
        store: TokenStore,
        target: MessageTarget,
        settings: Settings,
    ) -> (Self, Handle) {
        let (tx, events) = mpsc::channel(Self::EVENT_CAPACITY);

        let publisher = Publisher::new(
            messenger,
            PublishedState::new(target),
            settings.settle_delay,
            settings.commit_policy,
        );

        let supervisor = Self {
            provider,
            store,
            settings,
            context: Context {
                credential: None,
                publisher,
            },
            poll_timer: None,
            events,
        };

        (supervisor, Handle { tx })
    }

    /// Runs until [`Handle::shutdown`] is called or all handles are dropped.
    pub async fn run(mut self) {
        self.start().await;

        let period = self.settings.validate_interval;
        let mut validate_timer = time::interval_at(Instant::now() + period, period);
        validate_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Prioritize control events over timers.
                biased;

                event = self.events.recv() => match event {
                    Some(Event::Authorize { code, reply }) => {
                        let result = self.authorize(&code).await;
                        if reply.send(result).is_err() {
                            debug!("authorization requester went away");
                        }
                    }
                    Some(Event::Revalidate) => self.reload().await,
                    Some(Event::Status(reply)) => {
                        let _ = reply.send(self.status());
                    }
                    Some(Event::Shutdown) | None => break,
                },

                _ = validate_timer.tick() => self.revalidate().await,

                () = Self::poll_tick(&mut self.poll_timer) => self.poll().await,
            }
        }

        debug!("supervisor stopped");
    }

    /// Loads the stored credential and starts polling if it is valid.
    async fn start(&mut self) {
        self.context.credential = self.store.load();
        if self.context.credential.is_none() {
            return;
        }

        if validator::is_valid(&*self.provider, self.context.credential.as_ref()).await {
            self.ensure_polling_armed();
        } else {
            warn!("reauthorization required");
        }
    }

    /// Re-reads the token record, then checks the credential.
    ///
    /// A missing or unreadable record keeps the credential held in memory.
    async fn reload(&mut self) {
        if let Some(credential) = self.store.load() {
            if self.context.credential.as_ref() != Some(&credential) {
                info!("token reloaded from {}", self.store.path().display());
            }
            self.context.credential = Some(credential);
        }

        self.revalidate().await;
    }

    async fn revalidate(&mut self) {
        if validator::is_valid(&*self.provider, self.context.credential.as_ref()).await {
            self.ensure_polling_armed();
        } else {
            self.disarm_polling();
            warn!("reauthorization required");
        }
    }

    async fn authorize(&mut self, code: &str) -> Result<()> {
        let credential = auth::exchange(&*self.provider, &self.store, code).await?;
        self.context.credential = Some(credential);
        self.ensure_polling_armed();

        Ok(())
    }

    async fn poll(&mut self) {
        let credential = self.context.credential.as_ref();
        if let Some(now) = poller::fetch_current(&*self.provider, credential).await {
            self.context.publisher.update(&now).await;
        }
    }

    /// Arms the polling timer unless it already is.
    ///
    /// The first poll happens right away.
    fn ensure_polling_armed(&mut self) {
        if self.poll_timer.is_some() {
            trace!("polling already armed");
            return;
        }

        let mut timer = time::interval(self.settings.poll_interval);
        // A poll that overruns its period skips the ticks it missed.
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.poll_timer = Some(timer);

        info!(
            "starting to fetch track information every {:?}",
            self.settings.poll_interval
        );
    }

    fn disarm_polling(&mut self) {
        if self.poll_timer.take().is_some() {
            info!("stopped fetching track information");
        }
    }

    fn status(&self) -> Status {
        Status {
            authorized: self.context.credential.is_some(),
            polling: self.poll_timer.is_some(),
            published: self.context.publisher.published().track().cloned(),
        }
    }

    /// Completes on the next polling tick; never while polling is disarmed.
    async fn poll_tick(timer: &mut Option<Interval>) {
        match timer {
            Some(timer) => {
                timer.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}
