//! Power control and bring-up
//!
//! The module is switched on and off by holding its power key high for a
//! few seconds. Bring-up finds the module's current baud rate (power
//! cycling it if nothing answers) and then moves it to the target rate.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::String;

use cellshield_core::baud::{discover, BaudCandidates};
use cellshield_core::command::{at, format_command, MAX_COMMAND_LEN};
use cellshield_core::config::ModemConfig;
use cellshield_core::{AtTransport, Error, Outcome, Result};

/// Power key driver
pub struct PowerKey<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> PowerKey<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Take the key pin and make sure it is released (low)
    pub fn new(mut pin: P, delay: D) -> Result<Self> {
        pin.set_low().map_err(|_| Error::Pin)?;
        Ok(Self { pin, delay })
    }

    /// Hold the key for `ms`, toggling the module's power state
    pub fn pulse(&mut self, ms: u32) -> Result<()> {
        self.pin.set_high().map_err(|_| Error::Pin)?;
        self.delay.delay_ms(ms);
        self.pin.set_low().map_err(|_| Error::Pin)
    }

    pub fn wait(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

/// Turn command echo on or off
pub fn set_echo<T: AtTransport>(at: &mut T, on: bool, timeout_ms: u32) -> Result<Outcome> {
    let cmd = if on { at::ENABLE_ECHO } else { at::DISABLE_ECHO };
    at.send_command(cmd)?;
    Ok(at.wait_for(at::OK, timeout_ms))
}

/// Move the module from `from` to `to` baud
///
/// The command is sent at `from` and the local UART is switched to `to`
/// whatever the outcome, since the module may have changed rate even if
/// its reply was unreadable.
pub fn change_baud<T: AtTransport>(at: &mut T, from: u32, to: u32, timeout_ms: u32) -> Result<Outcome> {
    let cmd: String<MAX_COMMAND_LEN> =
        format_command(format_args!("{}={}", at::SET_BAUD_RATE, to))?;

    at.set_baudrate(from)?;
    at.send_command(&cmd)?;
    let outcome = at.wait_for(at::OK, timeout_ms);
    at.set_baudrate(to)?;
    Ok(outcome)
}

/// Bring the module up at `config.target_baud`
///
/// Returns the rate the session is left at.
pub fn begin<T, P, D>(at: &mut T, power: &mut PowerKey<P, D>, config: &ModemConfig) -> Result<u32>
where
    T: AtTransport,
    P: OutputPin,
    D: DelayNs,
{
    let target = config.target_baud;
    at.set_baudrate(target)?;

    // Already on and at the right rate
    if set_echo(at, false, config.command_timeout_ms)?.is_success() {
        return Ok(target);
    }

    let mut found = None;
    for round in 0..config.max_power_cycles {
        match discover(at, BaudCandidates::STANDARD, config.probe_timeout_ms) {
            Ok(rate) => {
                found = Some(rate);
                break;
            }
            Err(Error::BaudNotFound) => {
                warn!("modem silent, power cycling (round {})", round + 1);
                power.pulse(config.power_pulse_ms)?;
                power.wait(config.warm_up_ms);
            }
            Err(e) => return Err(e),
        }
    }
    let rate = found.ok_or(Error::BaudNotFound)?;

    if rate != target {
        // High rates often garble the reply even when the change worked
        match change_baud(at, rate, target, config.command_timeout_ms)? {
            Outcome::Success(_) | Outcome::Unknown(_) => {}
            Outcome::Failure => return Err(Error::FailureResponse),
            Outcome::Timeout => return Err(Error::Timeout),
        }
        info!("baud changed {} -> {}", rate, target);
    }
    at.settle(config.command_timeout_ms);
    Ok(target)
}
