//! Mirrors the track playing on a Spotify account onto a Telegram channel.
//!
//! One channel message is kept in sync: its photo shows the cover art and its
//! caption links to the track. The [`supervisor`] owns the control loop; the
//! [`callback`] server completes authorization.
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod auth;
pub mod callback;
pub mod config;
pub mod detector;
pub mod error;
pub mod http;
pub mod messenger;
pub mod poller;
pub mod protocol;
pub mod provider;
pub mod publisher;
pub mod signal;
pub mod spotify;
pub mod store;
pub mod supervisor;
pub mod telegram;
pub mod token;
pub mod validator;

#[cfg(test)]
mod fakes;
