//! Client for the JBL 4305P powered speakers.
//!
//! The speakers run an embedded web server with the NSDK control API. This
//! crate talks to it over HTTP, polls the player and diagnostics of a
//! speaker, and exposes the results as entities: the active input (which
//! can be switched), diagnostic sensors and maintenance buttons.
//!
//! Layers, from the wire up:
//! * [`http`]: rate limited HTTP client
//! * [`transport`]: `getData`/`setData` calls and response normalization
//! * [`nsdk`]: wire types and parsing rules
//! * [`client`]: semantic operations on a speaker
//! * [`coordinator`]: polling and snapshots
//! * [`entity`]: presentation of snapshots
//! * [`integration`]: setup, options and lifecycle of speaker instances
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

#[macro_use]
extern crate log;

pub mod client;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod events;
pub mod http;
pub mod integration;
pub mod nsdk;
pub mod options;
pub mod signal;
pub mod transport;
pub mod util;
