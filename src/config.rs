//! Board configuration for the PSRAM.

use crate::Error;

/// Direct-mode SCK divisor. Slow enough to be safe without an RX delay
/// (5 MHz at a 150 MHz `clk_sys`).
pub const DIRECT_CLKDIV: u8 = 30;

/// No-op cycles after each reset/enable command.
pub const RESET_SETTLE_NOPS: u32 = 20;

/// GPIOs that can carry the `XIP_CS1` function.
const XIP_CS1_PINS: [u8; 4] = [0, 8, 19, 47];

/// A GPIO known to support the PSRAM chip select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CsPin(u8);

impl CsPin {
    /// Validate `gpio` as a chip-select pin.
    pub fn new(gpio: u8) -> Result<Self, Error> {
        if XIP_CS1_PINS.contains(&gpio) {
            Ok(Self(gpio))
        } else {
            Err(Error::InvalidPin(gpio))
        }
    }

    /// GPIO number.
    pub fn gpio(&self) -> u8 {
        self.0
    }
}

/// Highest SCK the chip accepts. The limit depends on its supply voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaxFrequency {
    /// 109 MHz at VDD = 3.3 V.
    Vdd3V3,
    /// 133 MHz at VDD = 3.0 V.
    Vdd3V0,
    /// Board-specific limit in Hz.
    Custom(u32),
}

impl MaxFrequency {
    /// Limit in Hz.
    pub fn hz(&self) -> u32 {
        match self {
            MaxFrequency::Vdd3V3 => 109_000_000,
            MaxFrequency::Vdd3V0 => 133_000_000,
            MaxFrequency::Custom(hz) => *hz,
        }
    }
}

/// How the PSRAM is wired on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Chip select of the PSRAM.
    pub cs_pin: CsPin,
    /// SCK limit of the PSRAM.
    pub max_frequency: MaxFrequency,
}

impl Config {
    /// Creates a configuration.
    pub fn new(cs_pin: CsPin, max_frequency: MaxFrequency) -> Self {
        Self {
            cs_pin,
            max_frequency,
        }
    }

    /// SparkFun Pro Micro RP2350: chip select on GPIO19, 3.3 V supply.
    pub fn sparkfun_pro_micro_rp2350() -> Self {
        Self {
            cs_pin: CsPin(19),
            max_frequency: MaxFrequency::Vdd3V3,
        }
    }
}
