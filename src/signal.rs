//! Process signals.
//!
//! * Ctrl-C (SIGINT) and SIGTERM stop the relay.
//! * SIGHUP re-validates the stored credential immediately, which is the
//!   way to pick up a token file edited by hand.
//!
//! Only Ctrl-C is available on Windows.

use std::fmt;

use crate::error::{Error, Result};

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Signal received by the process.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[allow(clippy::module_name_repetitions)]
pub enum ShutdownSignal {
    /// Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP; not a shutdown, but a request to re-validate.
    Reload,
}

impl ShutdownSignal {
    /// Whether the process should exit on this signal.
    #[must_use]
    pub fn is_shutdown(self) -> bool {
        !matches!(self, Self::Reload)
    }
}

pub struct Handler {
    #[cfg(unix)]
    sigterm: Signal,
    #[cfg(unix)]
    sighup: Signal,
}

impl Handler {
    /// Registers the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if a handler cannot be registered.
    pub fn new() -> Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                sigterm: signal(SignalKind::terminate()).map_err(Error::internal)?,
                sighup: signal(SignalKind::hangup()).map_err(Error::internal)?,
            })
        }

        #[cfg(not(unix))]
        Ok(Self {})
    }

    /// Waits for the next signal.
    pub async fn recv(&mut self) -> ShutdownSignal {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => ShutdownSignal::Interrupt,
                _ = self.sigterm.recv() => ShutdownSignal::Terminate,
                _ = self.sighup.recv() => ShutdownSignal::Reload,
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            ShutdownSignal::Interrupt
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "Ctrl+C"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Reload => write!(f, "SIGHUP"),
        }
    }
}
