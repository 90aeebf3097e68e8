//! Feature drivers for the MG2639 cellular module
//!
//! Each driver borrows an [`AtTransport`](cellshield_core::AtTransport)
//! session for as long as it is in use:
//!
//! - Power key and bring-up sequence
//! - Module information (IMEI, IMSI, ICCID, SIM presence)
//! - Voice calls
//! - SMS
//! - GPRS and TCP links

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod gprs;
pub mod info;
pub mod phone;
pub mod sms;
pub mod startup;

#[cfg(test)]
mod testutil;

pub use gprs::{Gprs, LinkStatus, TcpChannel};
pub use info::ModuleInfo;
pub use phone::{AudioChannel, CallStatus, Phone};
pub use sms::{Inbox, Sms, SmsFilter, SmsMessage, SmsMode};
pub use startup::{begin, change_baud, set_echo, PowerKey};
