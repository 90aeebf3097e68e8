//! GPRS data link and TCP channels
//!
//! The MG2639 runs its own TCP/IP stack. The host opens a PPP session,
//! asks the module to set up a socket on one of its channels and then
//! pushes payloads through the command interface.

use core::net::Ipv4Addr;

use heapless::String;

use cellshield_core::command::{at, format_command, MAX_COMMAND_LEN};
use cellshield_core::config::ModemConfig;
use cellshield_core::extract::{span_of, IPV4_CHARS};
use cellshield_core::{AtTransport, Error, Outcome, Result};

/// Channel used when the caller has no preference
pub const DEFAULT_CHANNEL: u8 = 0;

/// Longest host name accepted by the DNS query
pub const MAX_DOMAIN_LEN: usize = 253;

const DNS_COMMAND_LEN: usize = MAX_DOMAIN_LEN + 16;

const SEND_DONE: &str = "+ZIPSEND: OK";

/// PPP link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    Established,
    Disconnected,
}

/// An open TCP link on one of the module's channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TcpChannel {
    id: u8,
}

impl TcpChannel {
    pub fn id(&self) -> u8 {
        self.id
    }
}

/// GPRS and TCP operations over a session
pub struct Gprs<'a, T> {
    at: &'a mut T,
    timeout_ms: u32,
}

impl<'a, T: AtTransport> Gprs<'a, T> {
    pub fn new(at: &'a mut T) -> Self {
        Self::with_config(at, &ModemConfig::default())
    }

    /// Use the network timeout from `config`
    pub fn with_config(at: &'a mut T, config: &ModemConfig) -> Self {
        Self {
            at,
            timeout_ms: config.network_timeout_ms,
        }
    }

    /// Override the network response timeout
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn command(&mut self, cmd: &str) -> Result<()> {
        self.at.send_command(cmd)?;
        self.at
            .wait_for_either(at::OK, at::ERROR, self.timeout_ms)
            .into_result()
            .map(drop)
    }

    /// Address carried in the last response
    fn response_ip(&self) -> Result<Ipv4Addr> {
        let span = span_of(self.at.response(), IPV4_CHARS).ok_or(Error::Malformed)?;
        core::str::from_utf8(span)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(Error::Malformed)
    }

    /// Open the PPP session
    pub fn open(&mut self) -> Result<()> {
        self.command(at::OPEN_GPRS)
    }

    pub fn close(&mut self) -> Result<()> {
        self.command(at::CLOSE_GPRS)
    }

    /// Address assigned to the module
    pub fn local_ip(&mut self) -> Result<Ipv4Addr> {
        self.at
            .transact(at::GET_IP, at::OK, self.timeout_ms)?
            .into_result()?;
        self.response_ip()
    }

    /// Resolve `domain` through the module's DNS client
    pub fn host_by_name(&mut self, domain: &str) -> Result<Ipv4Addr> {
        if domain.len() > MAX_DOMAIN_LEN {
            return Err(Error::BufferTooSmall);
        }
        let cmd: String<DNS_COMMAND_LEN> =
            format_command(format_args!("{}=\"{}\"", at::DNS_GET_IP, domain))?;
        self.at
            .transact(&cmd, at::OK, self.timeout_ms)?
            .into_result()?;
        self.response_ip()
    }

    /// Open a TCP link to `ip:port` on `channel`
    pub fn connect(&mut self, ip: Ipv4Addr, port: u16, channel: u8) -> Result<TcpChannel> {
        let cmd: String<MAX_COMMAND_LEN> =
            format_command(format_args!("{}={},{},{}", at::TCP_SETUP, channel, ip, port))?;
        self.at
            .transact(&cmd, at::OK, self.timeout_ms)?
            .into_result()?;
        debug!("tcp channel {} connected", channel);
        Ok(TcpChannel { id: channel })
    }

    /// Resolve `domain` and connect to it
    pub fn connect_host(&mut self, domain: &str, port: u16, channel: u8) -> Result<TcpChannel> {
        let ip = self.host_by_name(domain)?;
        self.connect(ip, port, channel)
    }

    pub fn status(&mut self) -> Result<LinkStatus> {
        self.at.send_command(at::TCP_STATUS)?;
        match self
            .at
            .wait_for_either("ESTABLISHED", "DISCONNECTED", self.timeout_ms)
        {
            Outcome::Success(_) => Ok(LinkStatus::Established),
            Outcome::Failure => Ok(LinkStatus::Disconnected),
            other => other.into_result().map(|_| LinkStatus::Disconnected),
        }
    }

    /// Send `data` over an open link
    ///
    /// Returns the number of bytes accepted by the module.
    pub fn write(&mut self, channel: TcpChannel, data: &[u8]) -> Result<usize> {
        let cmd: String<MAX_COMMAND_LEN> =
            format_command(format_args!("{}={},{}", at::TCP_SEND, channel.id, data.len()))?;
        self.at
            .transact(&cmd, at::PROMPT, self.timeout_ms)?
            .into_result()?;

        self.at.discard_input();
        self.at.write_raw(data)?;
        self.at.wait_for(SEND_DONE, self.timeout_ms).into_result()?;
        Ok(data.len())
    }

    /// Bytes received from the link and not yet read
    pub fn available(&mut self) -> usize {
        self.at.pending()
    }

    pub fn read(&mut self) -> Option<u8> {
        self.at.read_raw()
    }
}
