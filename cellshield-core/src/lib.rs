//! Host-side AT command engine for the MG2639 cellular module
//!
//! The module talks a line-ish text protocol over a single UART with no
//! framing guarantees. Everything in this crate is built around three
//! ideas:
//!
//! - A bounded [`ResponseBuffer`](buffer::ResponseBuffer) that accumulates
//!   reply bytes and is searched for marker strings
//! - Transactions that poll the port against a wall-clock deadline and end
//!   in exactly one [`Outcome`]
//! - Baud rate discovery by probing candidate rates
//!
//! Feature drivers (calls, SMS, GPRS) live in `cellshield-drivers` and only
//! use the [`AtTransport`] trait.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to later modules
#[macro_use]
mod fmt;

pub mod baud;
pub mod buffer;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod index_set;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use engine::{AtTransport, Modem};
pub use error::{Error, Outcome, Result};
