//! Error and outcome types
//!
//! Every transaction ends in exactly one [`Outcome`]. Feature code usually
//! wants a `Result` instead, so outcomes convert into [`Error`].

/// Errors reported by the transaction engine and the drivers built on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No byte arrived within the time budget
    Timeout,
    /// The module answered with the failure marker (usually `ERROR`)
    FailureResponse,
    /// Bytes arrived but neither marker matched before the deadline
    UnknownResponse,
    /// Destination filled before the terminating character arrived
    Overrun,
    /// Response matched but its contents could not be parsed
    Malformed,
    /// A command or result did not fit its fixed-capacity string
    BufferTooSmall,
    /// No candidate baud rate produced a reply to the probe
    BaudNotFound,
    /// The serial port reported a transmit or configuration error
    Port,
    /// A GPIO operation failed (power key)
    Pin,
}

impl Error {
    /// Small signed status code compatible with the classic driver API
    ///
    /// Transaction errors map to `-1..=-4`; everything else shares `-5`.
    pub const fn code(self) -> i8 {
        match self {
            Error::Timeout => -1,
            Error::FailureResponse => -2,
            Error::UnknownResponse => -3,
            Error::Overrun => -4,
            Error::Malformed
            | Error::BufferTooSmall
            | Error::BaudNotFound
            | Error::Port
            | Error::Pin => -5,
        }
    }
}

/// Result type used throughout the workspace
pub type Result<T> = core::result::Result<T, Error>;

/// Result of a single wait-for-response transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The good marker matched; carries the number of bytes consumed
    Success(usize),
    /// The failure marker matched
    Failure,
    /// Bytes arrived but no marker matched; carries the byte count
    Unknown(usize),
    /// Nothing arrived before the deadline
    Timeout,
}

impl Outcome {
    /// True for [`Outcome::Success`]
    pub const fn is_success(self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Signed status code: byte count on success, negative otherwise
    pub fn code(self) -> i32 {
        match self {
            Outcome::Success(n) => i32::try_from(n).unwrap_or(i32::MAX),
            Outcome::Timeout => -1,
            Outcome::Failure => -2,
            Outcome::Unknown(_) => -3,
        }
    }

    /// Convert into a `Result`, keeping the byte count on success
    pub fn into_result(self) -> Result<usize> {
        match self {
            Outcome::Success(n) => Ok(n),
            Outcome::Failure => Err(Error::FailureResponse),
            Outcome::Unknown(_) => Err(Error::UnknownResponse),
            Outcome::Timeout => Err(Error::Timeout),
        }
    }
}

impl From<Outcome> for Result<usize> {
    fn from(outcome: Outcome) -> Self {
        outcome.into_result()
    }
}
