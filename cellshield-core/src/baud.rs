//! Baud rate discovery
//!
//! The MG2639 remembers its line speed across power cycles, so after reset
//! the host has to find it by probing each candidate rate in turn.

use crate::command::at;
use crate::engine::AtTransport;
use crate::error::{Error, Outcome, Result};

/// Time for the module to reject whatever garbage preceded a probe (ms)
pub const PROBE_SETTLE_MS: u32 = 10;

/// Ordered list of rates to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudCandidates<'a> {
    rates: &'a [u32],
}

impl<'a> BaudCandidates<'a> {
    /// Every rate the MG2639 supports, slowest first
    pub const STANDARD: BaudCandidates<'static> = BaudCandidates {
        rates: &[2400, 4800, 9600, 19_200, 38_400, 57_600, 115_200],
    };

    /// Validate a candidate list
    ///
    /// Returns `None` unless the list is non-empty and strictly ascending.
    pub fn new(rates: &'a [u32]) -> Option<Self> {
        let ascending = rates.windows(2).all(|w| w[0] < w[1]);
        (!rates.is_empty() && ascending).then_some(Self { rates })
    }

    /// Rates in probe order
    pub fn rates(&self) -> &'a [u32] {
        self.rates
    }
}

impl Default for BaudCandidates<'static> {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Find the rate the module is currently running at
///
/// For each candidate: reconfigure the port, send a bare `\r` to flush any
/// partial command, give the module [`PROBE_SETTLE_MS`] to answer it, then
/// turn echo off and wait for `OK`. The first rate that answers is returned
/// and the port is left configured for it.
pub fn discover<T: AtTransport>(
    at: &mut T,
    candidates: BaudCandidates<'_>,
    probe_timeout_ms: u32,
) -> Result<u32> {
    for &rate in candidates.rates() {
        debug!("probing {} baud", rate);
        at.set_baudrate(rate)?;
        at.write_raw(b"\r")?;
        at.settle(PROBE_SETTLE_MS);
        at.send_command(at::DISABLE_ECHO)?;

        if let Outcome::Success(_) = at.wait_for(at::OK, probe_timeout_ms) {
            info!("modem found at {} baud", rate);
            return Ok(rate);
        }
    }
    Err(Error::BaudNotFound)
}
