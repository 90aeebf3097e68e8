//! Module and SIM information queries

use heapless::String;

use cellshield_core::command::at;
use cellshield_core::config::ModemConfig;
use cellshield_core::extract::{between, nth_field, to_string, trim_ascii};
use cellshield_core::{AtTransport, Error, Result};

use crate::phone::{PhoneNumber, MAX_PHONE_LEN};

/// Longest manufacturer information string
pub const MAX_INFO_LEN: usize = 64;
/// IMSI and IMEI are 15 digits
pub const MAX_IDENTITY_LEN: usize = 16;
/// ICCID is up to 20 digits
pub const MAX_ICCID_LEN: usize = 24;

/// Read-only queries about the module and its SIM
pub struct ModuleInfo<'a, T> {
    at: &'a mut T,
    timeout_ms: u32,
}

impl<'a, T: AtTransport> ModuleInfo<'a, T> {
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

    /// Override the response timeout
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn query(&mut self, cmd: &str) -> Result<&[u8]> {
        self.at.send_command(cmd)?;
        self.at
            .wait_for_either(at::OK, at::ERROR, self.timeout_ms)
            .into_result()?;
        Ok(self.at.response())
    }

    /// True if a SIM card is inserted
    ///
    /// Reply looks like `*TSIMINS:0, 1`; the second field is the flag.
    pub fn sim_present(&mut self) -> Result<bool> {
        self.at.send_command(at::CHECK_SIM)?;
        self.at.wait_for(at::OK, self.timeout_ms).into_result()?;
        let flag = nth_field(self.at.response(), 1, b',').ok_or(Error::Malformed)?;
        Ok(trim_ascii(flag).first() == Some(&b'1'))
    }

    /// Manufacturer information (`ATI`)
    pub fn information(&mut self) -> Result<String<MAX_INFO_LEN>> {
        self.at.send_command(at::GET_INFORMATION)?;
        self.at.wait_for(at::OK, self.timeout_ms).into_result()?;
        let rsp = self.at.response();
        let end = rsp
            .windows(at::OK.len())
            .rposition(|w| w == at::OK.as_bytes())
            .unwrap_or(rsp.len());
        to_string(trim_ascii(&rsp[..end]))
    }

    /// International mobile subscriber identity from the SIM
    pub fn imsi(&mut self) -> Result<String<MAX_IDENTITY_LEN>> {
        let rsp = self.query(at::READ_IMSI)?;
        to_string(between(rsp, b"\n", b"\r").ok_or(Error::Malformed)?)
    }

    /// SIM card serial number
    pub fn iccid(&mut self) -> Result<String<MAX_ICCID_LEN>> {
        let rsp = self.query(at::GET_ICCID)?;
        to_string(between(rsp, b" ", b"\r").ok_or(Error::Malformed)?)
    }

    /// Module serial number
    pub fn imei(&mut self) -> Result<String<MAX_IDENTITY_LEN>> {
        let rsp = self.query(at::GET_IMEI)?;
        to_string(between(rsp, b"\n", b"\r").ok_or(Error::Malformed)?)
    }

    /// Subscriber's own number, if stored on the SIM
    pub fn phone_number(&mut self) -> Result<PhoneNumber> {
        self.at.send_command(at::OWNERS_NUMBER)?;
        self.at.wait_for("+CNUM:", self.timeout_ms).into_result()?;
        let mut number = [0u8; MAX_PHONE_LEN];
        let len = self
            .at
            .read_between(b'"', b'"', &mut number, self.timeout_ms)?;
        to_string(&number[..len])
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::testutil::modem;

    #[test]
    fn test_sim_present() {
        let time = Cell::new(0);
        let mut modem = modem(&time);
        modem
            .port()
            .reply_once("AT*TSIMINS?\r", "\r\n*TSIMINS:0, 1\r\n\r\nOK\r\n")
            .reply_once("AT*TSIMINS?\r", "\r\n*TSIMINS:0, 0\r\n\r\nOK\r\n");

        assert_eq!(ModuleInfo::new(&mut modem).sim_present(), Ok(true));
        assert_eq!(ModuleInfo::new(&mut modem).sim_present(), Ok(false));
    }

    #[test]
    fn test_information() {
        let time = Cell::new(0);
        let mut modem = modem(&time);
        modem
            .port()
            .reply("ATI\r", "\r\nZTE INCORPORATED MG2639\r\n\r\nOK\r\n");

        let info = ModuleInfo::new(&mut modem).information().unwrap();
        assert_eq!(info.as_str(), "ZTE INCORPORATED MG2639");
    }

    #[test]
    fn test_imsi_and_imei() {
        let time = Cell::new(0);
        let mut modem = modem(&time);
        modem
            .port()
            .reply("AT+CIMI\r", "\r\n460030916875923\r\n\r\nOK\r\n")
            .reply("AT+GSN\r", "\r\n864049024612345\r\n\r\nOK\r\n");

        let mut info = ModuleInfo::new(&mut modem);
        assert_eq!(info.imsi().unwrap().as_str(), "460030916875923");
        assert_eq!(info.imei().unwrap().as_str(), "864049024612345");
    }

    #[test]
    fn test_iccid_without_sim() {
        let time = Cell::new(0);
        let mut modem = modem(&time);
        modem.port().reply("AT+ZGETICCID\r", "\r\nERROR\r\n");

        assert_eq!(
            ModuleInfo::new(&mut modem).iccid(),
            Err(Error::FailureResponse)
        );
    }

    #[test]
    fn test_iccid() {
        let time = Cell::new(0);
        let mut modem = modem(&time);
        modem
            .port()
            .reply("AT+ZGETICCID\r", "+ZGETICCID: 89860042190733578148\r\nOK\r\n");

        assert_eq!(
            ModuleInfo::new(&mut modem).iccid().unwrap().as_str(),
            "89860042190733578148"
        );
    }

    #[test]
    fn test_phone_number() {
        let time = Cell::new(0);
        let mut modem = modem(&time);
        modem
            .port()
            .reply("AT+CNUM\r", "\r\n+CNUM: \"15551234567\",129,7,4\r\n\r\nOK\r\n");

        let number = ModuleInfo::new(&mut modem).phone_number().unwrap();
        assert_eq!(number.as_str(), "15551234567");
    }

    #[test]
    fn test_query_times_out() {
        let time = Cell::new(0);
        let mut modem = modem(&time);

        let mut info = ModuleInfo::new(&mut modem).with_timeout(50);
        assert_eq!(info.imei(), Err(Error::Timeout));
    }

    #[test]
    fn test_timeout_from_config() {
        let time = Cell::new(0);
        let mut modem = modem(&time);
        let config = ModemConfig {
            command_timeout_ms: 80,
            ..ModemConfig::default()
        };

        assert_eq!(
            ModuleInfo::with_config(&mut modem, &config).imsi(),
            Err(Error::Timeout)
        );
        assert!(time.get() >= 80 && time.get() < 500);
    }
}
