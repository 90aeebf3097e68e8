//! AT command vocabulary
//!
//! Mnemonics are sent after the `AT` prefix, e.g. [`at::GET_IMEI`] goes out
//! as `AT+GSN\r`. Commands with parameters are built with
//! [`format_command`] into a fixed-capacity string.

use core::fmt::Write;

use heapless::String;

use crate::error::{Error, Result};

/// Terminates an SMS body
pub const CTRL_Z: u8 = 0x1A;

/// Longest command line the drivers build
pub const MAX_COMMAND_LEN: usize = 48;

/// Command mnemonics and response markers
pub mod at {
    // Responses
    pub const OK: &str = "OK";
    pub const ERROR: &str = "ERROR";
    /// Payload prompt for SMS and TCP sends
    pub const PROMPT: &str = ">";

    // Common commands
    pub const ANSWER: &str = "A";
    pub const DIAL: &str = "D";
    pub const DIAL_LAST: &str = "DL";
    pub const HANG_UP: &str = "H";
    pub const ENABLE_ECHO: &str = "E1";
    pub const DISABLE_ECHO: &str = "E0";
    pub const GET_INFORMATION: &str = "I";
    pub const READ_IMSI: &str = "+CIMI";
    pub const GET_IMEI: &str = "+GSN";
    pub const CHECK_SIM: &str = "*TSIMINS?";
    pub const CALL_STATUS: &str = "+CLCC";
    pub const SET_BAUD_RATE: &str = "+IPR";

    // ZTE extensions
    pub const GET_ICCID: &str = "+ZGETICCID";

    // Network
    pub const OPEN_GPRS: &str = "+ZPPPOPEN";
    pub const CLOSE_GPRS: &str = "+ZPPPCLOSE";
    pub const GET_IP: &str = "+ZIPGETIP";
    pub const DNS_GET_IP: &str = "+ZDNSGETIP";

    // SMS
    pub const SMS_MODE: &str = "+CMGF";
    pub const SMS_READ: &str = "+CMGR";
    pub const SMS_SEND: &str = "+CMGS";
    pub const SMS_DELETE: &str = "+CMGD";
    pub const SMS_LIST: &str = "+CMGL";

    // Phonebook
    pub const OWNERS_NUMBER: &str = "+CNUM";

    // TCP link
    pub const TCP_SETUP: &str = "+ZIPSETUP";
    pub const TCP_SEND: &str = "+ZIPSEND";
    pub const TCP_STATUS: &str = "+ZPPPSTATUS";

    // Audio
    pub const SPEAKER_SELECT: &str = "+SPEAKER";
}

/// Format a command line into a fixed-capacity string
///
/// ```
/// use cellshield_core::command::{at, format_command};
///
/// let cmd = format_command::<16>(format_args!("{}={}", at::SMS_MODE, 1)).unwrap();
/// assert_eq!(cmd.as_str(), "+CMGF=1");
/// ```
pub fn format_command<const M: usize>(args: core::fmt::Arguments<'_>) -> Result<String<M>> {
    let mut cmd = String::new();
    cmd.write_fmt(args).map_err(|_| Error::BufferTooSmall)?;
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command() {
        let cmd: String<MAX_COMMAND_LEN> =
            format_command(format_args!("{}=\"{}\"", at::SMS_SEND, "15551234567")).unwrap();
        assert_eq!(cmd.as_str(), "+CMGS=\"15551234567\"");
    }

    #[test]
    fn test_format_command_overflow() {
        let res = format_command::<4>(format_args!("{}={}", at::SET_BAUD_RATE, 115_200));
        assert_eq!(res, Err(Error::BufferTooSmall));
    }
}
