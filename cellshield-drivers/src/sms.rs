//! SMS send, list, read and delete
//!
//! Message indices the module has reported (through a listing or an
//! unsolicited `+CMTI` notification) are remembered in a caller-owned
//! [`Inbox`] until the message is read.

use heapless::{String, Vec};

use cellshield_core::command::{at, format_command, CTRL_Z, MAX_COMMAND_LEN};
use cellshield_core::config::ModemConfig;
use cellshield_core::extract::{parse_number, to_string};
use cellshield_core::index_set::MessageIndexSet;
use cellshield_core::{AtTransport, Error, Outcome, Result};

use crate::phone::{PhoneNumber, MAX_PHONE_LEN};

/// Longest timestamp string
pub const MAX_DATE_LEN: usize = 32;
/// Longest message body kept; anything beyond is dropped
pub const MAX_SMS_LEN: usize = 128;

/// Budget for each header field of a `+CMGR` reply (ms)
const FIELD_TIMEOUT_MS: u32 = 1000;

/// Unsolicited new-message notification
const NEW_MESSAGE: &str = "+CMTI: \"SM\", ";
/// Prefix of each entry in a message listing
const LIST_ENTRY: &str = "+CMGL: ";
/// Final result line closing a listing
const LIST_END: &str = "\r\nOK\r\n";

/// Message format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SmsMode {
    Pdu = 0,
    Text = 1,
}

/// Which stored messages to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SmsFilter {
    #[default]
    Unread,
    Read,
    All,
}

impl SmsFilter {
    pub const fn as_str(self) -> &'static str {
        match self {
            SmsFilter::Unread => "REC UNREAD",
            SmsFilter::Read => "REC READ",
            SmsFilter::All => "ALL",
        }
    }
}

/// A message read from SIM storage
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SmsMessage {
    /// Storage slot
    pub index: u8,
    pub sender: PhoneNumber,
    /// Timestamp as sent by the network, e.g. `2014/10/12 21:54:25-24`
    pub date: String<MAX_DATE_LEN>,
    pub body: Vec<u8, MAX_SMS_LEN>,
    /// Body was longer than [`MAX_SMS_LEN`]
    pub truncated: bool,
}

impl SmsMessage {
    /// Body as text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        core::str::from_utf8(&self.body).ok()
    }
}

/// Indices of messages waiting to be read
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    pending: MessageIndexSet,
}

impl Inbox {
    /// Empty inbox
    pub const fn new() -> Self {
        Self {
            pending: MessageIndexSet::new(),
        }
    }

    /// Every index waiting to be read
    pub fn pending(&self) -> &MessageIndexSet {
        &self.pending
    }

    /// Lowest pending index
    pub fn first(&self) -> Option<u8> {
        self.pending.first().and_then(|i| u8::try_from(i).ok())
    }

    /// Remember a message as waiting
    pub fn mark(&mut self, index: u8) {
        self.pending.insert(usize::from(index));
    }

    /// Forget all pending indices
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// SMS operations over a session
pub struct Sms<'a, T> {
    at: &'a mut T,
    inbox: &'a mut Inbox,
    command_timeout_ms: u32,
    send_timeout_ms: u32,
    char_gap_ms: u32,
}

impl<'a, T: AtTransport> Sms<'a, T> {
    pub fn new(at: &'a mut T, inbox: &'a mut Inbox) -> Self {
        Self::with_config(at, inbox, &ModemConfig::default())
    }

    pub fn with_config(at: &'a mut T, inbox: &'a mut Inbox, config: &ModemConfig) -> Self {
        Self {
            at,
            inbox,
            command_timeout_ms: config.command_timeout_ms,
            send_timeout_ms: config.sms_timeout_ms,
            char_gap_ms: config.char_gap_ms,
        }
    }

    fn command(&mut self, args: core::fmt::Arguments<'_>) -> Result<()> {
        let cmd: String<MAX_COMMAND_LEN> = format_command(args)?;
        self.at
            .transact(&cmd, at::OK, self.command_timeout_ms)?
            .into_result()
            .map(drop)
    }

    pub fn set_mode(&mut self, mode: SmsMode) -> Result<()> {
        self.command(format_args!("{}={}", at::SMS_MODE, mode as u8))
    }

    /// Begin a message to `number` and wait for the body prompt
    pub fn start(&mut self, number: &str) -> Result<()> {
        let cmd: String<MAX_COMMAND_LEN> =
            format_command(format_args!("{}=\"{}\"", at::SMS_SEND, number))?;
        self.at
            .transact(&cmd, at::PROMPT, self.command_timeout_ms)?
            .into_result()
            .map(drop)
    }

    /// Append body bytes to the message being composed
    pub fn write(&mut self, body: &[u8]) -> Result<()> {
        self.at.write_raw(body)
    }

    /// Finish the message and wait for the network to accept it
    pub fn send(&mut self) -> Result<()> {
        self.at.write_raw(&[CTRL_Z])?;
        self.at
            .wait_for_either(at::OK, at::ERROR, self.send_timeout_ms)
            .into_result()
            .map(drop)
    }

    /// Compose and send a complete message
    pub fn send_text(&mut self, number: &str, body: &str) -> Result<()> {
        self.start(number)?;
        self.write(body.as_bytes())?;
        self.send()
    }

    /// List stored messages, recording every index in the inbox
    ///
    /// Each entry is a header line and a body line. Both are skipped as a
    /// stream after the index is read, so entries of any length fit the
    /// response buffer.
    ///
    /// Returns the lowest pending index.
    pub fn available(&mut self, filter: SmsFilter) -> Result<Option<u8>> {
        let cmd: String<MAX_COMMAND_LEN> =
            format_command(format_args!("{}=\"{}\"", at::SMS_LIST, filter.as_str()))?;
        self.at.send_command(&cmd)?;

        loop {
            match self
                .at
                .wait_for_either(LIST_ENTRY, LIST_END, self.command_timeout_ms)
            {
                Outcome::Success(_) => {
                    let index = self.read_index(b',')?;
                    self.inbox.mark(index);
                    // Rest of the header, then the body
                    self.at.skip_until(b'\n', self.command_timeout_ms)?;
                    self.at.skip_until(b'\n', self.command_timeout_ms)?;
                }
                Outcome::Failure => break,
                other => return other.into_result().map(|_| None),
            }
        }
        Ok(self.inbox.first())
    }

    /// Check for a new-message notification
    ///
    /// Returns the newly announced index, or the lowest pending one if
    /// nothing new arrived.
    pub fn poll_notification(&mut self) -> Result<Option<u8>> {
        if !self.at.scan_pending(NEW_MESSAGE, self.char_gap_ms) {
            return Ok(self.inbox.first());
        }
        let index = self.read_index(b'\r')?;
        debug!("new message at index {}", index);
        self.inbox.mark(index);
        Ok(Some(index))
    }

    fn read_index(&mut self, end: u8) -> Result<u8> {
        let mut digits = [0u8; 4];
        let len = self
            .at
            .read_until(end, &mut digits, FIELD_TIMEOUT_MS)?;
        parse_number(&digits[..len])
    }

    /// Read a stored message
    ///
    /// Reply format:
    ///
    /// ```text
    /// +CMGR: "REC READ","15551234567","","2014/10/12 21:54:25-24"\r\n
    /// Hey hey hey\r\n
    /// \r\n
    /// OK\r\n
    /// ```
    pub fn read(&mut self, index: u8) -> Result<SmsMessage> {
        let cmd: String<MAX_COMMAND_LEN> =
            format_command(format_args!("{}={}", at::SMS_READ, index))?;
        self.at.send_command(&cmd)?;
        // Comma right before the sender
        self.at
            .wait_for_either(",", at::ERROR, self.command_timeout_ms)
            .into_result()?;

        let mut sender = [0u8; MAX_PHONE_LEN];
        let len = self
            .at
            .read_between(b'"', b'"', &mut sender, FIELD_TIMEOUT_MS)?;
        let sender = to_string(&sender[..len])?;

        // Phonebook name, usually empty
        let mut scratch = [0u8; 16];
        self.at
            .read_between(b'"', b'"', &mut scratch, FIELD_TIMEOUT_MS)?;

        let mut date = [0u8; MAX_DATE_LEN];
        let len = self
            .at
            .read_between(b'"', b'"', &mut date, FIELD_TIMEOUT_MS)?;
        let date = to_string(&date[..len])?;

        // Rest of the header line
        self.at.read_until(b'\n', &mut scratch, FIELD_TIMEOUT_MS)?;

        let mut body = [0u8; MAX_SMS_LEN];
        let (len, truncated) = match self.at.read_until(b'\r', &mut body, FIELD_TIMEOUT_MS) {
            Ok(len) => (len, false),
            Err(Error::Overrun) => (MAX_SMS_LEN, true),
            Err(e) => return Err(e),
        };
        if truncated {
            warn!("message {} truncated", index);
        }

        self.inbox.pending.remove(usize::from(index));
        Ok(SmsMessage {
            index,
            sender,
            date,
            body: Vec::from_slice(&body[..len]).map_err(|_| Error::BufferTooSmall)?,
            truncated,
        })
    }

    /// Delete a stored message
    pub fn delete(&mut self, index: u8) -> Result<()> {
        self.command(format_args!("{}={}", at::SMS_DELETE, index))?;
        self.inbox.pending.remove(usize::from(index));
        Ok(())
    }
}
