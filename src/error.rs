use core::fmt::{self, Debug, Display};

/// The error type used by this library.
///
/// Every variant describes a configuration problem that is caught before the
/// bus is touched. A missing chip is not an error: it is reported as a size
/// of zero.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The GPIO cannot carry the `XIP_CS1` function.
    InvalidPin(u8),

    /// The system clock or the chip's maximum frequency is zero.
    InvalidFrequency,

    /// A derived timing value does not fit its `M1_TIMING` field.
    TimingOutOfRange,

    /// The chip has not been detected and mapped yet.
    NotInitialized,
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPin(pin) => write!(f, "Error::InvalidPin({})", pin),
            Error::InvalidFrequency => f.write_str("Error::InvalidFrequency"),
            Error::TimingOutOfRange => f.write_str("Error::TimingOutOfRange"),
            Error::NotInitialized => f.write_str("Error::NotInitialized"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPin(pin) => write!(f, "GPIO{} cannot be used as the PSRAM chip select", pin),
            Error::InvalidFrequency => {
                f.write_str("System clock and PSRAM frequency must both be non-zero")
            }
            Error::TimingOutOfRange => {
                f.write_str("PSRAM timing does not fit the QMI timing register at this clock")
            }
            Error::NotInitialized => f.write_str("The PSRAM has not been detected and mapped"),
        }
    }
}
