//! Cellshield Hardware Abstraction Layer
//!
//! This crate defines the two collaborators the transaction engine needs
//! from the board: a polled byte channel to the modem UART and a
//! millisecond wall clock. Chip-specific code implements them directly, or
//! wraps an `embedded-io` serial type with [`serial::IoPort`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  cellshield-drivers (phone, sms, gprs)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cellshield-core (transaction engine)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cellshield-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`serial::SerialPort`] - Polled serial byte channel
//! - [`clock::Clock`] - Monotonic millisecond time source

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod serial;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use serial::{IoPort, SerialPort, SetBaudrate};
