//! Voice calls

use heapless::String;

use cellshield_core::command::{at, format_command, MAX_COMMAND_LEN};
use cellshield_core::config::ModemConfig;
use cellshield_core::extract::{between, nth_field, to_string};
use cellshield_core::{AtTransport, Error, Outcome, Result};

/// Longest phone number handled, in digits
pub const MAX_PHONE_LEN: usize = 16;

/// Phone number as text
pub type PhoneNumber = String<MAX_PHONE_LEN>;

/// Call state as reported by `+CLCC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallStatus {
    Active = 0,
    Held = 1,
    /// Outgoing, not yet ringing
    Dialing = 2,
    /// Outgoing, far end ringing
    Alerting = 3,
    Incoming = 4,
    Waiting = 5,
}

impl CallStatus {
    /// Decode the numeric state field
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CallStatus::Active),
            1 => Some(CallStatus::Held),
            2 => Some(CallStatus::Dialing),
            3 => Some(CallStatus::Alerting),
            4 => Some(CallStatus::Incoming),
            5 => Some(CallStatus::Waiting),
            _ => None,
        }
    }
}

/// Audio path selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioChannel {
    #[default]
    Differential = 0,
    SingleEnded = 1,
}

/// Voice call control
pub struct Phone<'a, T> {
    at: &'a mut T,
    timeout_ms: u32,
}

impl<'a, T: AtTransport> Phone<'a, T> {
    pub fn new(at: &'a mut T) -> Self {
        Self::with_config(at, &ModemConfig::default())
    }

    /// Use the command timeout from `config`
    pub fn with_config(at: &'a mut T, config: &ModemConfig) -> Self {
        Self {
            at,
            timeout_ms: config.command_timeout_ms,
        }
    }

    fn command(&mut self, cmd: &str) -> Result<()> {
        self.at
            .transact(cmd, at::OK, self.timeout_ms)?
            .into_result()
            .map(drop)
    }

    /// State of the current call, `None` when idle
    ///
    /// A call is listed as `+CLCC: <id>,<dir>,<state>,<mode>,<mpty>,...`.
    /// An idle module answers with a bare `OK`.
    pub fn status(&mut self) -> Result<Option<CallStatus>> {
        self.at.send_command(at::CALL_STATUS)?;
        match self
            .at
            .wait_for_either(at::CALL_STATUS, at::OK, self.timeout_ms)
        {
            Outcome::Success(_) => {}
            Outcome::Failure => return Ok(None),
            other => return other.into_result().map(|_| None),
        }

        // Rest of the listing, up to the final OK
        self.at
            .wait_for(at::OK, self.timeout_ms)
            .into_result()?;
        let rsp = self.at.response();
        if nth_field(rsp, 3, b',').is_none() {
            return Err(Error::Malformed);
        }
        let state = nth_field(rsp, 2, b',').ok_or(Error::Malformed)?;
        match state.first() {
            Some(d) if d.is_ascii_digit() => {
                CallStatus::from_code(d - b'0').map(Some).ok_or(Error::Malformed)
            }
            _ => Err(Error::Malformed),
        }
    }

    /// Number of the far end of the current call
    pub fn caller_id(&mut self) -> Result<Option<PhoneNumber>> {
        if self.status()?.is_none() {
            return Ok(None);
        }
        let number = between(self.at.response(), b"\"", b"\"").ok_or(Error::Malformed)?;
        to_string(number).map(Some)
    }

    /// Answer an incoming call
    pub fn answer(&mut self) -> Result<()> {
        self.command(at::ANSWER)
    }

    pub fn hang_up(&mut self) -> Result<()> {
        self.command(at::HANG_UP)
    }

    /// Start a voice call (`ATD<number>;`)
    pub fn dial(&mut self, number: &str) -> Result<()> {
        let cmd: String<MAX_COMMAND_LEN> = format_command(format_args!("{}{};", at::DIAL, number))?;
        self.command(&cmd)
    }

    /// Redial the last number
    pub fn dial_last(&mut self) -> Result<()> {
        self.command(at::DIAL_LAST)
    }

    pub fn set_audio_channel(&mut self, channel: AudioChannel) -> Result<()> {
        let cmd: String<MAX_COMMAND_LEN> =
            format_command(format_args!("{}={}", at::SPEAKER_SELECT, channel as u8))?;
        self.command(&cmd)
    }
}
