//! Scripted serial port and clock for host-side tests
//!
//! [`MockClock`] and [`MockPort`] share one time cell. The clock advances by
//! one millisecond every time it is read, so polling loops make progress
//! without real sleeps. The port answers transmitted commands from a table
//! of trigger/reply rules and delivers each reply once its arrival time has
//! passed.

use core::cell::Cell;

use heapless::{Deque, Vec};

use cellshield_hal::{Clock, SerialPort};

const MAX_RULES: usize = 24;
const MAX_RX: usize = 1024;
const MAX_TX: usize = 2048;
const MAX_BAUDS: usize = 32;

/// Millisecond clock that ticks on every read
pub struct MockClock<'a> {
    time: &'a Cell<u64>,
}

impl<'a> MockClock<'a> {
    pub fn new(time: &'a Cell<u64>) -> Self {
        Self { time }
    }
}

impl Clock for MockClock<'_> {
    fn now_ms(&mut self) -> u64 {
        let now = self.time.get();
        self.time.set(now + 1);
        now
    }
}

/// Errors from the mock port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Writes were configured to fail
    Write,
    /// Transmit log is full
    Full,
}

struct Rule<'a> {
    trigger: &'a [u8],
    reply: &'a [u8],
    delay_ms: u64,
    once: bool,
    spent: bool,
}

/// Scripted modem on the far side of a serial line
pub struct MockPort<'a> {
    time: &'a Cell<u64>,
    rules: Vec<Rule<'a>, MAX_RULES>,
    rx: Deque<(u64, u8), MAX_RX>,
    tx: Vec<u8, MAX_TX>,
    match_from: usize,
    baud: u32,
    live_baud: Option<u32>,
    bauds: Vec<u32, MAX_BAUDS>,
    fail_writes: bool,
}

impl<'a> MockPort<'a> {
    /// Create a port configured for `baud`
    pub fn new(time: &'a Cell<u64>, baud: u32) -> Self {
        Self {
            time,
            rules: Vec::new(),
            rx: Deque::new(),
            tx: Vec::new(),
            match_from: 0,
            baud,
            live_baud: None,
            bauds: Vec::new(),
            fail_writes: false,
        }
    }

    /// Answer every transmission ending in `trigger` with `reply`
    pub fn reply(&mut self, trigger: &'a str, reply: &'a str) -> &mut Self {
        self.add_rule(trigger.as_bytes(), reply.as_bytes(), 0, false)
    }

    /// Like [`reply`](Self::reply), with the answer arriving after `delay_ms`
    pub fn reply_after(&mut self, trigger: &'a str, reply: &'a str, delay_ms: u64) -> &mut Self {
        self.add_rule(trigger.as_bytes(), reply.as_bytes(), delay_ms, false)
    }

    /// Answer the next transmission ending in `trigger`, then forget the rule
    ///
    /// One-shot rules take priority over persistent ones.
    pub fn reply_once(&mut self, trigger: &'a str, reply: &'a str) -> &mut Self {
        self.add_rule(trigger.as_bytes(), reply.as_bytes(), 0, true)
    }

    /// [`reply_once`](Self::reply_once) for binary triggers and replies
    pub fn reply_once_bytes(&mut self, trigger: &'a [u8], reply: &'a [u8]) -> &mut Self {
        self.add_rule(trigger, reply, 0, true)
    }

    fn add_rule(&mut self, trigger: &'a [u8], reply: &'a [u8], delay_ms: u64, once: bool) -> &mut Self {
        let _ = self.rules.push(Rule {
            trigger,
            reply,
            delay_ms,
            once,
            spent: false,
        });
        self
    }

    /// Only answer intelligibly while configured for `baud`
    ///
    /// At any other rate replies arrive as the same number of garbage bytes.
    pub fn live_at(&mut self, baud: u32) -> &mut Self {
        self.live_baud = Some(baud);
        self
    }

    /// Make received bytes available immediately
    pub fn push_rx(&mut self, bytes: &[u8]) -> &mut Self {
        self.push_rx_after(0, bytes)
    }

    /// Make received bytes available `delay_ms` from now
    pub fn push_rx_after(&mut self, delay_ms: u64, bytes: &[u8]) -> &mut Self {
        let at = self.time.get() + delay_ms;
        for &b in bytes {
            let _ = self.rx.push_back((at, b));
        }
        self
    }

    /// Make every transmit fail
    pub fn fail_writes(&mut self, fail: bool) -> &mut Self {
        self.fail_writes = fail;
        self
    }

    /// Everything transmitted so far
    pub fn sent(&self) -> &[u8] {
        &self.tx
    }

    /// Transmit log as text
    pub fn sent_str(&self) -> &str {
        core::str::from_utf8(&self.tx).unwrap_or("")
    }

    /// Forget the transmit log
    pub fn clear_sent(&mut self) {
        self.tx.clear();
        self.match_from = 0;
    }

    /// Current line speed
    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// Every rate passed to `set_baudrate`, in order
    pub fn baud_history(&self) -> &[u32] {
        &self.bauds
    }

    fn arrived(&self) -> usize {
        let now = self.time.get();
        self.rx.iter().take_while(|(at, _)| *at <= now).count()
    }

    fn answer(&mut self) {
        let pending = &self.tx[self.match_from..];
        let matches = |r: &Rule<'_>| !r.spent && pending.ends_with(r.trigger);
        let hit = self
            .rules
            .iter()
            .position(|r| r.once && matches(r))
            .or_else(|| self.rules.iter().position(|r| !r.once && matches(r)));

        let Some(idx) = hit else {
            return;
        };
        self.match_from = self.tx.len();

        let rule = &mut self.rules[idx];
        if rule.once {
            rule.spent = true;
        }
        let (reply, delay) = (rule.reply, rule.delay_ms);
        let garbled = self.live_baud.is_some_and(|live| live != self.baud);
        let at = self.time.get() + delay;
        for &b in reply {
            let _ = self.rx.push_back((at, if garbled { 0xFF } else { b }));
        }
    }
}

impl SerialPort for MockPort<'_> {
    type Error = MockError;

    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error> {
        self.baud = baudrate;
        let _ = self.bauds.push(baudrate);
        self.rx.clear();
        Ok(())
    }

    fn available(&mut self) -> usize {
        self.arrived()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.arrived() == 0 {
            return None;
        }
        self.rx.pop_front().map(|(_, b)| b)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockError::Write);
        }
        self.tx.extend_from_slice(data).map_err(|_| MockError::Full)?;
        self.answer();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_ticks_per_read() {
        let time = Cell::new(0);
        let mut clock = MockClock::new(&time);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_ms(), 1);
        assert_eq!(clock.elapsed_ms(0), 2);
    }

    #[test]
    fn test_reply_arrives_after_delay() {
        let time = Cell::new(0);
        let mut port = MockPort::new(&time, 9600);
        port.reply_after("ATE0\r", "OK", 10);

        port.write_all(b"ATE0\r").unwrap();
        assert_eq!(port.available(), 0);
        time.set(10);
        assert_eq!(port.available(), 2);
        assert_eq!(port.read_byte(), Some(b'O'));
    }

    #[test]
    fn test_once_rule_wins_then_expires() {
        let time = Cell::new(0);
        let mut port = MockPort::new(&time, 9600);
        port.reply("AT\r", "B").reply_once("AT\r", "A");

        port.write_all(b"AT\r").unwrap();
        port.write_all(b"AT\r").unwrap();
        assert_eq!(port.read_byte(), Some(b'A'));
        assert_eq!(port.read_byte(), Some(b'B'));
        assert_eq!(port.read_byte(), None);
    }

    #[test]
    fn test_garbage_at_wrong_baud() {
        let time = Cell::new(0);
        let mut port = MockPort::new(&time, 2400);
        port.live_at(9600).reply("ATE0\r", "OK");

        port.write_all(b"ATE0\r").unwrap();
        assert_eq!(port.read_byte(), Some(0xFF));

        port.set_baudrate(9600).unwrap();
        assert_eq!(port.available(), 0);
        port.write_all(b"ATE0\r").unwrap();
        assert_eq!(port.read_byte(), Some(b'O'));
        assert_eq!(port.baud_history(), &[9600]);
    }
}
