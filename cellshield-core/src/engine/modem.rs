//! Polling transaction engine over a serial port and clock

use cellshield_hal::{Clock, SerialPort};

use super::AtTransport;
use crate::buffer::{ResponseBuffer, DEFAULT_RESPONSE_LEN};
use crate::error::{Error, Outcome, Result};
use crate::fmt::Bytes;

/// AT command session
///
/// Owns the serial port, the clock and the response buffer. Bytes are read
/// one at a time; a single byte of lookahead lets the engine absorb trailing
/// line terminators without consuming the start of the next reply.
pub struct Modem<P, C, const N: usize = DEFAULT_RESPONSE_LEN> {
    port: P,
    clock: C,
    buffer: ResponseBuffer<N>,
    lookahead: Option<u8>,
    baudrate: u32,
}

impl<P, C, const N: usize> Modem<P, C, N>
where
    P: SerialPort,
    C: Clock,
{
    /// Create a session over a port already running at `baudrate`
    pub fn new(port: P, clock: C, baudrate: u32) -> Self {
        Self {
            port,
            clock,
            buffer: ResponseBuffer::new(),
            lookahead: None,
            baudrate,
        }
    }

    /// Get access to the underlying port
    pub fn port(&mut self) -> &mut P {
        &mut self.port
    }

    /// Get access to the session clock
    pub fn clock(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Tear down the session, returning port and clock
    pub fn release(self) -> (P, C) {
        (self.port, self.clock)
    }

    fn next_byte(&mut self) -> Option<u8> {
        if let Some(byte) = self.lookahead.take() {
            return Some(byte);
        }
        if self.port.available() == 0 {
            return None;
        }
        self.port.read_byte()
    }

    /// Pull already-pending `\r`/`\n` bytes into the buffer
    fn absorb_terminators(&mut self) -> usize {
        let mut absorbed = 0;
        while let Some(byte) = self.next_byte() {
            if byte != b'\r' && byte != b'\n' {
                self.lookahead = Some(byte);
                break;
            }
            self.buffer.append(byte);
            absorbed += 1;
        }
        absorbed
    }

    fn poll(&mut self, good: &[u8], fail: Option<&[u8]>, timeout_ms: u32) -> Outcome {
        let start = self.clock.now_ms();
        let mut received = 0usize;
        let mut warned = false;

        self.buffer.clear();
        while self.clock.elapsed_ms(start) < u64::from(timeout_ms) {
            let Some(byte) = self.next_byte() else {
                continue;
            };
            received += 1;
            if !self.buffer.append(byte) && !warned {
                warn!("response buffer full, dropping input");
                warned = true;
            }

            if self.buffer.contains(good) {
                received += self.absorb_terminators();
                return Outcome::Success(received);
            }
            if let Some(fail) = fail {
                if self.buffer.contains(fail) {
                    debug!("failure response: {}", Bytes(self.buffer.as_bytes()));
                    return Outcome::Failure;
                }
            }
        }

        if received > 0 {
            debug!(
                "unrecognised response ({} bytes): {}",
                received,
                Bytes(self.buffer.as_bytes())
            );
            Outcome::Unknown(received)
        } else {
            debug!("no response within {} ms", timeout_ms);
            Outcome::Timeout
        }
    }
}

impl<P, C, const N: usize> AtTransport for Modem<P, C, N>
where
    P: SerialPort,
    C: Clock,
{
    fn send_command(&mut self, cmd: &str) -> Result<()> {
        self.discard_input();
        trace!("> AT{}", cmd);
        self.write_raw(b"AT")?;
        self.write_raw(cmd.as_bytes())?;
        self.write_raw(b"\r")
    }

    fn wait_for(&mut self, marker: &str, timeout_ms: u32) -> Outcome {
        self.poll(marker.as_bytes(), None, timeout_ms)
    }

    fn wait_for_either(&mut self, good: &str, fail: &str, timeout_ms: u32) -> Outcome {
        self.poll(good.as_bytes(), Some(fail.as_bytes()), timeout_ms)
    }

    fn read_between(
        &mut self,
        open: u8,
        close: u8,
        dest: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize> {
        let start = self.clock.now_ms();
        let mut inside = false;
        let mut len = 0;

        while self.clock.elapsed_ms(start) < u64::from(timeout_ms) {
            let Some(byte) = self.next_byte() else {
                continue;
            };
            if !inside {
                inside = byte == open;
                continue;
            }
            if byte == close {
                return Ok(len);
            }
            if len == dest.len() {
                return Err(Error::Overrun);
            }
            dest[len] = byte;
            len += 1;
        }
        Err(Error::Timeout)
    }

    fn read_until(&mut self, end: u8, dest: &mut [u8], timeout_ms: u32) -> Result<usize> {
        let start = self.clock.now_ms();
        let mut len = 0;

        while self.clock.elapsed_ms(start) < u64::from(timeout_ms) {
            let Some(byte) = self.next_byte() else {
                continue;
            };
            if byte == end {
                return Ok(len);
            }
            if len == dest.len() {
                return Err(Error::Overrun);
            }
            dest[len] = byte;
            len += 1;
        }
        Err(Error::Timeout)
    }

    fn skip_until(&mut self, end: u8, timeout_ms: u32) -> Result<usize> {
        let start = self.clock.now_ms();
        let mut skipped = 0;

        while self.clock.elapsed_ms(start) < u64::from(timeout_ms) {
            match self.next_byte() {
                Some(byte) if byte == end => return Ok(skipped),
                Some(_) => skipped += 1,
                None => {}
            }
        }
        Err(Error::Timeout)
    }

    fn scan_pending(&mut self, marker: &str, gap_ms: u32) -> bool {
        self.buffer.clear();
        if self.pending() == 0 {
            return false;
        }

        let mut last = self.clock.now_ms();
        loop {
            match self.next_byte() {
                Some(byte) => {
                    last = self.clock.now_ms();
                    self.buffer.append(byte);
                    if self.buffer.contains(marker.as_bytes()) {
                        return true;
                    }
                    // Nothing more can match once input is being dropped
                    if self.buffer.is_full() {
                        return false;
                    }
                }
                None if self.clock.elapsed_ms(last) >= u64::from(gap_ms) => return false,
                None => {}
            }
        }
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data).map_err(|_| Error::Port)
    }

    fn read_raw(&mut self) -> Option<u8> {
        self.next_byte()
    }

    fn pending(&mut self) -> usize {
        self.port.available() + usize::from(self.lookahead.is_some())
    }

    fn discard_input(&mut self) {
        self.lookahead = None;
        self.port.discard_input();
    }

    fn response(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn response_overflowed(&self) -> bool {
        self.buffer.overflowed()
    }

    fn clear_response(&mut self) {
        self.buffer.clear();
    }

    fn set_baudrate(&mut self, baudrate: u32) -> Result<()> {
        self.port.set_baudrate(baudrate).map_err(|_| Error::Port)?;
        self.lookahead = None;
        self.baudrate = baudrate;
        Ok(())
    }

    fn baudrate(&self) -> u32 {
        self.baudrate
    }

    fn settle(&mut self, ms: u32) {
        let start = self.clock.now_ms();
        while self.clock.elapsed_ms(start) < u64::from(ms) {}
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::mock::{MockClock, MockPort};

    fn session<'a>(time: &'a Cell<u64>) -> Modem<MockPort<'a>, MockClock<'a>> {
        Modem::new(MockPort::new(time, 9600), MockClock::new(time), 9600)
    }

    #[test]
    fn test_echo_off_success_counts_terminators() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().reply_after("ATE0\r", "\r\nOK\r\n", 20);

        modem.send_command("E0").unwrap();
        let outcome = modem.wait_for("OK", 500);

        assert_eq!(outcome, Outcome::Success(6));
        assert!(time.get() < 50);
        assert_eq!(modem.port().sent(), b"ATE0\r");
        assert_eq!(modem.response(), b"\r\nOK\r\n");
    }

    #[test]
    fn test_dead_channel_times_out() {
        let time = Cell::new(0);
        let mut modem = session(&time);

        modem.send_command("E0").unwrap();
        assert_eq!(modem.wait_for("OK", 200), Outcome::Timeout);
        assert!(time.get() >= 200);
    }

    #[test]
    fn test_good_marker_checked_first() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        // Both markers complete on the same byte
        modem.port().push_rx(b"OK");

        assert_eq!(modem.wait_for_either("OK", "K", 100), Outcome::Success(2));
    }

    #[test]
    fn test_failure_marker() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().reply("AT+CIMI\r", "\r\nERROR\r\n");

        modem.send_command("+CIMI").unwrap();
        assert_eq!(modem.wait_for_either("OK", "ERROR", 500), Outcome::Failure);
    }

    #[test]
    fn test_unknown_response() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b"\r\nBUSY\r\n");

        assert_eq!(modem.wait_for_either("OK", "ERROR", 100), Outcome::Unknown(8));
        assert!(time.get() >= 100);
    }

    #[test]
    fn test_terminator_absorption_stops_at_payload() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b"\r\n+CLCC: 1,0,4");

        assert_eq!(modem.wait_for("+CLCC", 100), Outcome::Success(7));
        assert_eq!(modem.read_raw(), Some(b':'));
    }

    #[test]
    fn test_overflow_is_flagged() {
        let time = Cell::new(0);
        let mut modem: Modem<_, _, 8> =
            Modem::new(MockPort::new(&time, 9600), MockClock::new(&time), 9600);
        modem.port().push_rx(b"0123456789OK");

        assert_eq!(modem.wait_for("OK", 50), Outcome::Unknown(12));
        assert!(modem.response_overflowed());
        assert_eq!(modem.response(), b"0123456");
    }

    #[test]
    fn test_send_discards_stale_input() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b"\r\nOK\r\n");

        modem.send_command("+GSN").unwrap();
        assert_eq!(modem.pending(), 0);
        assert_eq!(modem.wait_for("OK", 50), Outcome::Timeout);
    }

    #[test]
    fn test_read_between_quotes() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b" \"15551234567\",129");

        let mut dest = [0u8; 16];
        let len = modem.read_between(b'"', b'"', &mut dest, 100).unwrap();
        assert_eq!(&dest[..len], b"15551234567");
        assert_eq!(modem.read_raw(), Some(b','));
    }

    #[test]
    fn test_read_between_overrun() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b"\"15551234567\"");

        let mut dest = [0u8; 4];
        assert_eq!(
            modem.read_between(b'"', b'"', &mut dest, 100),
            Err(Error::Overrun)
        );
    }

    #[test]
    fn test_read_between_missing_close() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b"\"1555");

        let mut dest = [0u8; 16];
        assert_eq!(
            modem.read_between(b'"', b'"', &mut dest, 100),
            Err(Error::Timeout)
        );
    }

    #[test]
    fn test_read_until() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b"Hey hey hey\r\n");

        let mut dest = [0u8; 32];
        let len = modem.read_until(b'\r', &mut dest, 100).unwrap();
        assert_eq!(&dest[..len], b"Hey hey hey");

        let mut small = [0u8; 2];
        modem.port().push_rx(b"abc\r");
        assert_eq!(modem.read_until(b'\r', &mut small, 100), Err(Error::Overrun));
    }

    #[test]
    fn test_skip_until_long_line() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        let line = [b'x'; 300];
        modem.port().push_rx(&line).push_rx(b"\nOK");

        assert_eq!(modem.skip_until(b'\n', 500), Ok(300));
        assert_eq!(modem.read_raw(), Some(b'O'));
        assert_eq!(modem.skip_until(b'\n', 50), Err(Error::Timeout));
    }

    #[test]
    fn test_reply_with_slow_characters() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        for (i, &b) in b"\r\nOK\r\n".iter().enumerate() {
            modem.port().push_rx_after(40 * i as u64, &[b]);
        }

        // Terminators still in flight when the marker completes are left behind
        assert_eq!(modem.wait_for("OK", 500), Outcome::Success(4));
        assert!(time.get() >= 120 && time.get() < 160);
        assert_eq!(modem.response(), b"\r\nOK");
        assert_eq!(modem.pending(), 0);
    }

    #[test]
    fn test_scan_pending_finds_notification() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().push_rx(b"\r\n+CMTI: \"SM\", 3\r\n");

        assert!(modem.scan_pending("+CMTI: \"SM\", ", 5));
        assert_eq!(modem.read_raw(), Some(b'3'));
    }

    #[test]
    fn test_scan_pending_quiet_line() {
        let time = Cell::new(0);
        let mut modem = session(&time);

        assert!(!modem.scan_pending("+CMTI", 5));
        assert_eq!(time.get(), 0);

        modem.port().push_rx(b"\r\nRING\r\n");
        assert!(!modem.scan_pending("+CMTI", 5));
        assert_eq!(modem.pending(), 0);
    }

    #[test]
    fn test_set_baudrate_reconfigures_port() {
        let time = Cell::new(0);
        let mut modem = session(&time);

        modem.set_baudrate(115_200).unwrap();
        assert_eq!(modem.baudrate(), 115_200);
        assert_eq!(modem.port().baud_history(), &[115_200]);
    }

    #[test]
    fn test_write_failure_maps_to_port_error() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.port().fail_writes(true);

        assert_eq!(modem.send_command("E0"), Err(Error::Port));
    }

    #[test]
    fn test_transact_and_extract() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem
            .port()
            .reply("AT+GSN\r", "\r\n864049024612345\r\n\r\nOK\r\n");

        let outcome = modem.transact("+GSN", "OK", 500).unwrap();
        assert!(outcome.is_success());
        assert_eq!(
            modem.extract_between(b"\n", b"\r"),
            Some(&b"864049024612345"[..])
        );
    }

    #[test]
    fn test_settle_waits_on_clock() {
        let time = Cell::new(0);
        let mut modem = session(&time);
        modem.settle(10);
        assert!(time.get() >= 10);
    }
}
