//! Clock-relative timing for the PSRAM memory window.
//!
//! All arithmetic is integer-only. Periods are held in femtoseconds so the
//! datasheet limits convert to cycle counts without rounding drift.

use crate::regs::timing as reg;
use crate::Error;

/// Divided clock above which the read delay needs an extra cycle.
const DIVISOR_LIMIT_HZ: u32 = 100_000_000;

const SEC_TO_FS: u64 = 1_000_000_000_000_000;

/// Max CS# low time is 8 us, counted in units of 64 system clocks:
/// 8_000_000_000 fs / 64.
const MAX_SELECT_FS64: u64 = 125_000_000;

/// Min CS# high time is 18 ns.
const MIN_DESELECT_FS: u64 = 18_000_000;

/// Clock cycles the QMI keeps CS# asserted after a burst, waiting for a
/// sequential access.
const COOLDOWN: u32 = 1;

/// Timing for chip-select 1, derived from the system clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingParameters {
    /// `clk_sys` cycles per SCK period.
    pub divisor: u32,
    /// Cycles from the SCK edge to sampling read data.
    pub rx_delay: u32,
    /// Longest CS# assertion, in units of 64 system clocks.
    pub max_select: u32,
    /// Shortest CS# deassertion, in system clocks.
    pub min_deselect: u32,
}

impl TimingParameters {
    /// Derive the timing for a system clock of `clock_hz` driving a chip rated
    /// for `max_psram_hz`.
    ///
    /// Both frequencies must be non-zero. A divisor of 1 is never used above
    /// 100 MHz because the smallest read delay it allows samples too late.
    pub fn compute(clock_hz: u32, max_psram_hz: u32) -> Self {
        let mut divisor = clock_hz.div_ceil(max_psram_hz).max(1);
        if divisor == 1 && clock_hz > DIVISOR_LIMIT_HZ {
            divisor = 2;
        }

        let mut rx_delay = divisor;
        if clock_hz / divisor > DIVISOR_LIMIT_HZ {
            rx_delay += 1;
        }

        let clock_period_fs = SEC_TO_FS / u64::from(clock_hz);

        let max_select = MAX_SELECT_FS64 / clock_period_fs;

        // The deselect counter starts at the last internal half-cycle edge.
        let min_deselect = MIN_DESELECT_FS
            .div_ceil(clock_period_fs)
            .saturating_sub(u64::from(divisor.div_ceil(2)));

        Self {
            divisor,
            rx_delay,
            max_select: saturate(max_select),
            min_deselect: saturate(min_deselect),
        }
    }

    /// Encode as a `QMI_M1_TIMING` value with a 1024-byte page break.
    pub fn register_bits(&self) -> Result<u32, Error> {
        if self.divisor == 0
            || self.divisor > reg::CLKDIV_MAX
            || self.rx_delay > reg::RXDELAY_MAX
            || self.max_select > reg::MAX_SELECT_MAX
            || self.min_deselect > reg::MIN_DESELECT_MAX
        {
            return Err(Error::TimingOutOfRange);
        }

        Ok(COOLDOWN << reg::COOLDOWN_LSB
            | reg::PAGEBREAK_1024 << reg::PAGEBREAK_LSB
            | self.max_select << reg::MAX_SELECT_LSB
            | self.min_deselect << reg::MIN_DESELECT_LSB
            | self.rx_delay << reg::RXDELAY_LSB
            | self.divisor << reg::CLKDIV_LSB)
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
