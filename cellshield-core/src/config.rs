//! Modem configuration
//!
//! Timing constants for the MG2639 and the bring-up sequence. With the
//! `serde` feature the configuration can be stored as postcard binary data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::{Error, Result};

/// Baud rate the module is moved to after discovery
pub const DEFAULT_BAUD: u32 = 9600;

/// Timeout for ordinary command responses (ms)
pub const COMMAND_RESPONSE_TIME_MS: u32 = 500;

/// Timeout for an SMS to be accepted by the network (ms)
pub const SMS_SEND_TIMEOUT_MS: u32 = 10_000;

/// Timeout for PPP and TCP operations (ms)
pub const NETWORK_TIMEOUT_MS: u32 = 30_000;

/// Longest gap between characters of one reply (ms)
pub const CHAR_GAP_MS: u32 = 5;

/// Power key pulse length (ms)
pub const POWER_PULSE_MS: u32 = 3000;

/// Time for the module to boot after a power pulse (ms)
pub const WARM_UP_MS: u32 = 3000;

/// Maximum size of an encoded [`ModemConfig`]
#[cfg(feature = "serde")]
pub const MAX_ENCODED_LEN: usize = 48;

/// Modem timing and bring-up configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModemConfig {
    /// Desired line speed after bring-up
    pub target_baud: u32,
    /// Response timeout for ordinary commands (ms)
    pub command_timeout_ms: u32,
    /// Response timeout for each baud probe (ms)
    pub probe_timeout_ms: u32,
    /// Timeout for the network to accept an SMS (ms)
    pub sms_timeout_ms: u32,
    /// Timeout for PPP and TCP operations (ms)
    pub network_timeout_ms: u32,
    /// Inter-character gap for unsolicited notifications (ms)
    pub char_gap_ms: u32,
    /// Power key pulse length (ms)
    pub power_pulse_ms: u32,
    /// Boot time after a power pulse (ms)
    pub warm_up_ms: u32,
    /// Baud discovery rounds before giving up, each followed by a power pulse
    pub max_power_cycles: u8,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            target_baud: DEFAULT_BAUD,
            command_timeout_ms: COMMAND_RESPONSE_TIME_MS,
            probe_timeout_ms: COMMAND_RESPONSE_TIME_MS,
            sms_timeout_ms: SMS_SEND_TIMEOUT_MS,
            network_timeout_ms: NETWORK_TIMEOUT_MS,
            char_gap_ms: CHAR_GAP_MS,
            power_pulse_ms: POWER_PULSE_MS,
            warm_up_ms: WARM_UP_MS,
            max_power_cycles: 4,
        }
    }
}

#[cfg(feature = "serde")]
impl ModemConfig {
    /// Serialize into `buf`, returning the used prefix
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8]> {
        postcard::to_slice(self, buf).map_err(|_| Error::BufferTooSmall)
    }

    /// Deserialize from postcard bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).map_err(|_| Error::Malformed)
    }
}
