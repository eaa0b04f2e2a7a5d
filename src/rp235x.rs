//! [`BusController`] over the RP2350's QMI.
//!
//! Every accessor is `#[inline(always)]` so that it is compiled into the
//! RAM-resident bring-up routines rather than called out to flash.

use core::convert::Infallible;

use rp235x_pac::{IO_BANK0, PADS_BANK0, QMI, XIP_CTRL};

use crate::bus::{BusController, DirectTx};
use crate::config::{CsPin, RESET_SETTLE_NOPS};

/// `IO_BANK0_GPIOn_CTRL.FUNCSEL` value routing a pin to `XIP_CS1`.
const FUNCSEL_XIP_CS1: u8 = 9;

/// The QSPI memory interface together with the peripherals needed to route
/// the PSRAM chip select.
pub struct Qmi {
    qmi: QMI,
    xip_ctrl: XIP_CTRL,
    io_bank0: IO_BANK0,
    pads_bank0: PADS_BANK0,
    clock_hz: u32,
}

impl Qmi {
    /// Take ownership of the peripherals. `clock_hz` is the current `clk_sys`.
    pub fn new(
        qmi: QMI,
        xip_ctrl: XIP_CTRL,
        io_bank0: IO_BANK0,
        pads_bank0: PADS_BANK0,
        clock_hz: u32,
    ) -> Self {
        Self {
            qmi,
            xip_ctrl,
            io_bank0,
            pads_bank0,
            clock_hz,
        }
    }

    /// Record a new `clk_sys` frequency. Follow with `Psram::retime`.
    pub fn set_system_clock_hz(&mut self, clock_hz: u32) {
        self.clock_hz = clock_hz;
    }

    /// Release the peripherals.
    pub fn free(self) -> (QMI, XIP_CTRL, IO_BANK0, PADS_BANK0) {
        (self.qmi, self.xip_ctrl, self.io_bank0, self.pads_bank0)
    }
}

impl BusController for Qmi {
    #[inline(always)]
    fn system_clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn select_cs1_function(&mut self, pin: CsPin) {
        let n = usize::from(pin.gpio());

        self.pads_bank0.gpio(n).modify(|_, w| {
            w.ie().set_bit();
            w.od().clear_bit()
        });
        self.io_bank0
            .gpio(n)
            .gpio_ctrl()
            .write(|w| unsafe { w.funcsel().bits(FUNCSEL_XIP_CS1) });
        self.pads_bank0.gpio(n).modify(|_, w| w.iso().clear_bit());
    }

    fn interrupt_free<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        critical_section::with(|_| f(self))
    }

    #[inline(always)]
    fn enable_direct(&mut self, clkdiv: u8) {
        self.qmi.direct_csr().write(|w| unsafe {
            w.clkdiv().bits(clkdiv);
            w.en().set_bit()
        });
    }

    #[inline(always)]
    fn disable_direct(&mut self) {
        self.qmi.direct_csr().modify(|_, w| {
            w.assert_cs1n().clear_bit();
            w.en().clear_bit()
        });
    }

    #[inline(always)]
    fn poll_idle(&mut self) -> nb::Result<(), Infallible> {
        if self.qmi.direct_csr().read().busy().bit_is_set() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    #[inline(always)]
    fn poll_tx_empty(&mut self) -> nb::Result<(), Infallible> {
        if self.qmi.direct_csr().read().txempty().bit_is_clear() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    #[inline(always)]
    fn set_cs1(&mut self, asserted: bool) {
        self.qmi
            .direct_csr()
            .modify(|_, w| w.assert_cs1n().bit(asserted));
    }

    #[inline(always)]
    fn write_tx(&mut self, tx: DirectTx) {
        self.qmi.direct_tx().write(|w| unsafe { w.bits(tx.bits()) });
    }

    #[inline(always)]
    fn read_rx(&mut self) -> u8 {
        self.qmi.direct_rx().read().bits() as u8
    }

    #[inline(always)]
    fn settle(&mut self) {
        for _ in 0..RESET_SETTLE_NOPS {
            cortex_m::asm::nop();
        }
    }

    #[inline(always)]
    fn write_m1_timing(&mut self, timing: u32) {
        self.qmi.m1_timing().write(|w| unsafe { w.bits(timing) });
    }

    #[inline(always)]
    fn write_m1_read_format(&mut self, format: u32, command: u32) {
        self.qmi.m1_rfmt().write(|w| unsafe { w.bits(format) });
        self.qmi.m1_rcmd().write(|w| unsafe { w.bits(command) });
    }

    #[inline(always)]
    fn write_m1_write_format(&mut self, format: u32, command: u32) {
        self.qmi.m1_wfmt().write(|w| unsafe { w.bits(format) });
        self.qmi.m1_wcmd().write(|w| unsafe { w.bits(command) });
    }

    #[inline(always)]
    fn set_m1_writable(&mut self, writable: bool) {
        self.xip_ctrl
            .ctrl()
            .modify(|_, w| w.writable_m1().bit(writable));
    }
}
