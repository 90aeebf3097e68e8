//! AT transaction engine
//!
//! A transaction sends one command and then polls the serial port until a
//! marker appears in the response buffer or the time budget runs out.
//! Feature drivers only see the [`AtTransport`] trait; [`Modem`] is the
//! implementation over a real port and clock.

mod modem;

pub use modem::Modem;

use crate::error::{Outcome, Result};
use crate::extract;

/// Narrow interface to an AT command session
///
/// One session owns the serial channel. Transactions are strictly
/// sequential, which `&mut self` enforces.
pub trait AtTransport {
    /// Drop pending input, then transmit `AT` + `cmd` + `\r`
    fn send_command(&mut self, cmd: &str) -> Result<()>;

    /// Poll until `marker` appears in the response buffer
    ///
    /// The buffer is cleared first. Times out `timeout_ms` after entry.
    fn wait_for(&mut self, marker: &str, timeout_ms: u32) -> Outcome;

    /// Poll until `good` or `fail` appears; `good` is checked first
    fn wait_for_either(&mut self, good: &str, fail: &str, timeout_ms: u32) -> Outcome;

    /// Stream extraction: skip input up to `open`, copy until `close`
    ///
    /// Returns the number of bytes copied. `Error::Overrun` if `dest` fills
    /// before `close` arrives, `Error::Timeout` if the budget runs out.
    fn read_between(&mut self, open: u8, close: u8, dest: &mut [u8], timeout_ms: u32)
        -> Result<usize>;

    /// Copy input into `dest` until `end` arrives (not stored)
    fn read_until(&mut self, end: u8, dest: &mut [u8], timeout_ms: u32) -> Result<usize>;

    /// Drop input up to and including `end`
    ///
    /// Returns the number of bytes dropped before `end`. The budget covers
    /// the whole skip, however long the line is.
    fn skip_until(&mut self, end: u8, timeout_ms: u32) -> Result<usize>;

    /// Consume input while it keeps arriving, looking for `marker`
    ///
    /// Returns as soon as the marker matches, the line goes quiet for
    /// `gap_ms`, or nothing was pending to begin with. Meant for
    /// unsolicited notifications, not command replies.
    fn scan_pending(&mut self, marker: &str, gap_ms: u32) -> bool;

    /// Transmit bytes verbatim (payloads, CTRL-Z)
    fn write_raw(&mut self, data: &[u8]) -> Result<()>;

    /// Read one pending byte, bypassing the response buffer
    fn read_raw(&mut self) -> Option<u8>;

    /// Number of bytes that can be read without waiting
    fn pending(&mut self) -> usize;

    /// Drop everything pending on the receive side
    fn discard_input(&mut self);

    /// Bytes gathered by the last wait
    fn response(&self) -> &[u8];

    /// True if the last wait dropped bytes because the buffer was full
    fn response_overflowed(&self) -> bool;

    fn clear_response(&mut self);

    /// Reconfigure the local UART
    fn set_baudrate(&mut self, baudrate: u32) -> Result<()>;

    /// Line speed the local UART is configured for
    fn baudrate(&self) -> u32;

    /// Busy-wait on the session clock
    fn settle(&mut self, ms: u32);

    /// Send a command and wait for a single marker
    fn transact(&mut self, cmd: &str, marker: &str, timeout_ms: u32) -> Result<Outcome> {
        self.send_command(cmd)?;
        Ok(self.wait_for(marker, timeout_ms))
    }

    /// Field of the last response between `open` and `close`
    fn extract_between(&self, open: &[u8], close: &[u8]) -> Option<&[u8]> {
        extract::between(self.response(), open, close)
    }
}
