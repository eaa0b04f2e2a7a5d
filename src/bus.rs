//! The QMI as seen by this driver, and the direct-mode sequencer built on it.
//!
//! [`BusController`] is the narrow register-level seam between the bring-up
//! logic and the hardware. The real implementation lives in
//! `rp235x`; tests provide a simulated one.

use core::convert::Infallible;

use crate::config::{CsPin, DIRECT_CLKDIV};
use crate::format::Width;
use crate::regs::direct_tx;

/// Register-level access to the QSPI memory interface shared by the boot
/// flash (chip-select 0) and the PSRAM (chip-select 1).
///
/// The interface is a singleton. While direct mode is enabled nothing may be
/// fetched through it, so implementations must not execute from, or read
/// constants out of, the XIP window.
pub trait BusController {
    /// Current `clk_sys` frequency in Hz.
    fn system_clock_hz(&self) -> u32;

    /// Give `pin` the `XIP_CS1` function and set up its pad.
    fn select_cs1_function(&mut self, pin: CsPin);

    /// Run `f` with interrupts masked and other bus masters kept off the
    /// interface. The previous interrupt state is restored when `f` returns.
    fn interrupt_free<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R;

    /// Switch to direct mode with SCK at `clk_sys / clkdiv`.
    fn enable_direct(&mut self, clkdiv: u8);

    /// Deassert chip-select 1 and leave direct mode.
    fn disable_direct(&mut self);

    /// `WouldBlock` while a direct transfer or the XIP cooldown is running.
    fn poll_idle(&mut self) -> nb::Result<(), Infallible>;

    /// `WouldBlock` until the direct TX FIFO has drained.
    fn poll_tx_empty(&mut self) -> nb::Result<(), Infallible>;

    /// Drive chip-select 1 by hand.
    fn set_cs1(&mut self, asserted: bool);

    /// Push one entry to the direct TX FIFO.
    fn write_tx(&mut self, tx: DirectTx);

    /// Pop one entry from the direct RX FIFO.
    fn read_rx(&mut self) -> u8;

    /// Busy-wait long enough for the chip to accept the next command.
    fn settle(&mut self);

    /// Write `QMI_M1_TIMING`.
    fn write_m1_timing(&mut self, timing: u32);

    /// Write `QMI_M1_RFMT` and `QMI_M1_RCMD`.
    fn write_m1_read_format(&mut self, format: u32, command: u32);

    /// Write `QMI_M1_WFMT` and `QMI_M1_WCMD`.
    fn write_m1_write_format(&mut self, format: u32, command: u32);

    /// Allow or forbid stores to the chip-select 1 window.
    fn set_m1_writable(&mut self, writable: bool);
}

/// One `QMI_DIRECT_TX` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirectTx {
    /// Byte to shift out.
    pub data: u8,
    /// Number of lines it is shifted out on.
    pub width: Width,
    /// Drive the data lines. Only meaningful for dual and quad widths.
    pub output_enable: bool,
}

impl DirectTx {
    /// A byte on SIO0 alone.
    #[inline(always)]
    pub const fn single(data: u8) -> Self {
        Self {
            data,
            width: Width::S,
            output_enable: false,
        }
    }

    /// A byte on all four lines, as a chip in QPI mode expects.
    #[inline(always)]
    pub const fn quad(data: u8) -> Self {
        Self {
            data,
            width: Width::Q,
            output_enable: true,
        }
    }

    /// Register value.
    #[inline(always)]
    pub const fn bits(&self) -> u32 {
        let mut bits = self.data as u32 | (self.width as u32) << direct_tx::IWIDTH_LSB;
        if self.output_enable {
            bits |= direct_tx::OE;
        }
        bits
    }
}

/// Spin on a status bit. There is no timeout: a bit that never clears is a
/// hardware fault.
macro_rules! spin {
    ($poll:expr) => {
        match nb::block!($poll) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    };
}

/// The interface held in direct mode.
///
/// Entering waits for the cooldown of the last XIP access. Dropping the guard
/// deasserts chip-select and turns direct mode off, whatever path the caller
/// leaves by.
///
/// Everything here is `#[inline(always)]`. With optimisation on it is
/// compiled into the RAM-resident routine driving it. Unoptimised builds may
/// still call helpers in flash, so bring-up should run from a release build.
pub struct DirectMode<'a, B: BusController> {
    bus: &'a mut B,
}

impl<'a, B: BusController> DirectMode<'a, B> {
    /// Enter direct mode at the conservative [`DIRECT_CLKDIV`].
    #[inline(always)]
    pub fn enter(bus: &'a mut B) -> Self {
        bus.enable_direct(DIRECT_CLKDIV);
        spin!(bus.poll_idle());
        Self { bus }
    }

    /// Assert chip-select 1 until the returned guard is dropped.
    #[inline(always)]
    pub fn select(&mut self) -> Selected<'_, 'a, B> {
        self.bus.set_cs1(true);
        Selected { direct: self }
    }

    /// Command recovery delay.
    #[inline(always)]
    pub fn settle(&mut self) {
        self.bus.settle();
    }
}

impl<B: BusController> Drop for DirectMode<'_, B> {
    #[inline(always)]
    fn drop(&mut self) {
        self.bus.disable_direct();
    }
}

/// Chip-select 1 held asserted.
pub struct Selected<'d, 'a, B: BusController> {
    direct: &'d mut DirectMode<'a, B>,
}

impl<B: BusController> Selected<'_, '_, B> {
    /// Shift `tx` out and return the byte clocked in alongside it.
    #[inline(always)]
    pub fn transmit_receive(&mut self, tx: DirectTx) -> u8 {
        let bus = &mut *self.direct.bus;
        bus.write_tx(tx);
        spin!(bus.poll_tx_empty());
        spin!(bus.poll_idle());
        bus.read_rx()
    }
}

impl<B: BusController> Drop for Selected<'_, '_, B> {
    #[inline(always)]
    fn drop(&mut self) {
        self.direct.bus.set_cs1(false);
    }
}
