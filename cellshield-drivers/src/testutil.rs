//! Shared fixtures for driver tests

use core::cell::Cell;
use core::convert::Infallible;

use cellshield_core::mock::{MockClock, MockPort};
use cellshield_core::Modem;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

pub type TestModem<'a> = Modem<MockPort<'a>, MockClock<'a>>;

/// Session at 9600 baud over a scripted port
pub fn modem(time: &Cell<u64>) -> TestModem<'_> {
    Modem::new(MockPort::new(time, 9600), MockClock::new(time), 9600)
}

/// Power key pin that counts pulses
pub struct TestPin<'a> {
    pub high: &'a Cell<bool>,
    pub pulses: &'a Cell<u32>,
}

impl ErrorType for TestPin<'_> {
    type Error = Infallible;
}

impl OutputPin for TestPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high.get() {
            self.pulses.set(self.pulses.get() + 1);
        }
        self.high.set(true);
        Ok(())
    }
}

/// Delay that advances the shared mock time
pub struct TestDelay<'a> {
    pub time: &'a Cell<u64>,
}

impl DelayNs for TestDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let ms = u64::from(ns).div_ceil(1_000_000);
        self.time.set(self.time.get() + ms);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.time.set(self.time.get() + u64::from(ms));
    }
}
