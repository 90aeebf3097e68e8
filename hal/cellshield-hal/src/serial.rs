//! Serial byte channel abstractions
//!
//! The modem is reached over a single UART that is polled, never
//! interrupt-driven. The engine only needs to know how many bytes are
//! waiting, read them one at a time, write whole commands and switch the
//! line speed during baud discovery.

/// Polled serial byte channel to the modem
pub trait SerialPort {
    /// Error type for transmit and configuration operations
    type Error;

    /// Change the line speed
    ///
    /// Any partially received frame is discarded by the implementation.
    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error>;

    /// Number of bytes that can be read without blocking
    fn available(&mut self) -> usize;

    /// Read a single byte
    ///
    /// Returns `None` if no byte is pending.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write data to the UART, preserving order
    ///
    /// Blocks until all data has been accepted or an error occurs.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Drop everything currently pending in the receive path
    fn discard_input(&mut self) {
        while self.available() > 0 {
            if self.read_byte().is_none() {
                break;
            }
        }
    }
}

/// Line speed control for `embedded-io` serial types
///
/// `embedded-io` has no notion of baud rate, so types wrapped in
/// [`IoPort`] provide it through this trait.
pub trait SetBaudrate: embedded_io::ErrorType {
    /// Reconfigure the peripheral for a new baud rate
    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error>;
}

/// [`SerialPort`] adapter for `embedded-io` serial peripherals
///
/// `ReadReady` only says whether data is pending, so [`SerialPort::available`]
/// reports at most one byte. That is all the polling loop needs.
pub struct IoPort<T> {
    inner: T,
}

impl<T> IoPort<T> {
    /// Wrap a serial peripheral
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Get access to the underlying peripheral
    pub fn inner(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Release the underlying peripheral
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> SerialPort for IoPort<T>
where
    T: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write + SetBaudrate,
{
    type Error = T::Error;

    fn set_baudrate(&mut self, baudrate: u32) -> Result<(), Self::Error> {
        SetBaudrate::set_baudrate(&mut self.inner, baudrate)
    }

    fn available(&mut self) -> usize {
        match self.inner.read_ready() {
            Ok(true) => 1,
            _ => 0,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        embedded_io::Write::write_all(&mut self.inner, data)?;
        self.inner.flush()
    }
}
