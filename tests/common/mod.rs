//! A simulated QMI with an APS6404-style chip on chip-select 1.

#![allow(dead_code)]

use core::convert::Infallible;

use rp2_psram::bus::{BusController, DirectTx};
use rp2_psram::format::Width;
use rp2_psram::psram::Opcode;
use rp2_psram::CsPin;

pub const MHZ: u32 = 1_000_000;

/// Polls the simulated cooldown reports busy for, after direct mode is entered.
const COOLDOWN_POLLS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PinFunction(u8),
    MaskAcquired,
    MaskReleased,
    DirectEnabled(u8),
    DirectDisabled,
    /// Bytes shifted out during one chip-select window.
    Transaction(Vec<DirectTx>),
    Settle,
    Timing(u32),
    ReadFormat(u32, u32),
    WriteFormat(u32, u32),
    Writable(bool),
}

/// The PSRAM die.
#[derive(Debug, Clone)]
pub struct SimChip {
    pub kgd: u8,
    pub eid: u8,
    pub quad: bool,
    reset_armed: bool,
    pub resets: usize,
}

impl SimChip {
    pub fn new(kgd: u8, eid: u8) -> Self {
        Self {
            kgd,
            eid,
            quad: false,
            reset_armed: false,
            resets: 0,
        }
    }

    /// Byte driven back while receiving byte `index` of a window opened by `first`.
    fn respond(&self, first: &DirectTx, index: usize) -> u8 {
        if self.quad || first.width != Width::S || first.data != Opcode::ReadId as u8 {
            return 0xff;
        }
        match index {
            4 => 0x0d,
            5 => self.kgd,
            6 => self.eid,
            _ => 0x00,
        }
    }

    fn complete(&mut self, window: &[DirectTx]) {
        let Some(first) = window.first() else {
            return;
        };
        let armed = core::mem::take(&mut self.reset_armed);

        match (first.width, first.data) {
            (Width::Q, op) if op == Opcode::ExitQuadMode as u8 => self.quad = false,
            (Width::S, op) if !self.quad && op == Opcode::ResetEnable as u8 => {
                self.reset_armed = true
            }
            (Width::S, op) if !self.quad && op == Opcode::Reset as u8 && armed => {
                self.quad = false;
                self.resets += 1;
            }
            (Width::S, op) if !self.quad && op == Opcode::EnterQuadMode as u8 => self.quad = true,
            _ => {}
        }
    }
}

#[derive(Debug)]
pub struct SimBus {
    pub clock_hz: u32,
    pub chip: Option<SimChip>,
    pub events: Vec<Event>,

    pub direct_enabled: bool,
    pub cs1_asserted: bool,
    pub mask_held: bool,
    /// Direct transfers issued while the interrupt mask was not held.
    pub unmasked_transfers: usize,

    pub timing: Option<u32>,
    pub read_format: Option<(u32, u32)>,
    pub write_format: Option<(u32, u32)>,
    pub writable: bool,

    busy: u32,
    rx: Option<u8>,
    window: Vec<DirectTx>,
}

impl SimBus {
    pub fn new(clock_hz: u32, chip: Option<SimChip>) -> Self {
        Self {
            clock_hz,
            chip,
            events: Vec::new(),
            direct_enabled: false,
            cs1_asserted: false,
            mask_held: false,
            unmasked_transfers: 0,
            timing: None,
            read_format: None,
            write_format: None,
            writable: false,
            busy: 0,
            rx: None,
            window: Vec::new(),
        }
    }

    /// An 8 MiB APS6404 at 150 MHz.
    pub fn with_8mib_chip() -> Self {
        Self::new(150 * MHZ, Some(SimChip::new(0x5d, 0b010_00110)))
    }

    /// Nothing on chip-select 1.
    pub fn empty() -> Self {
        Self::new(150 * MHZ, None)
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }

    pub fn last_position(&self, event: &Event) -> Option<usize> {
        self.events.iter().rposition(|e| e == event)
    }

    /// Every chip-select window as the opcodes sent in it.
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Transaction(bytes) => Some(bytes.iter().map(|tx| tx.data).collect()),
                _ => None,
            })
            .collect()
    }

    pub fn chip(&self) -> &SimChip {
        self.chip.as_ref().expect("no chip fitted")
    }
}

impl BusController for SimBus {
    fn system_clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn select_cs1_function(&mut self, pin: CsPin) {
        self.events.push(Event::PinFunction(pin.gpio()));
    }

    fn interrupt_free<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        assert!(!self.mask_held, "interrupt mask acquired twice");
        self.mask_held = true;
        self.events.push(Event::MaskAcquired);
        let result = f(self);
        self.mask_held = false;
        self.events.push(Event::MaskReleased);
        result
    }

    fn enable_direct(&mut self, clkdiv: u8) {
        self.direct_enabled = true;
        self.busy = COOLDOWN_POLLS;
        self.events.push(Event::DirectEnabled(clkdiv));
    }

    fn disable_direct(&mut self) {
        if self.cs1_asserted {
            self.set_cs1(false);
        }
        self.direct_enabled = false;
        self.events.push(Event::DirectDisabled);
    }

    fn poll_idle(&mut self) -> nb::Result<(), Infallible> {
        if self.busy > 0 {
            self.busy -= 1;
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    fn poll_tx_empty(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }

    fn set_cs1(&mut self, asserted: bool) {
        assert!(self.direct_enabled, "chip select driven outside direct mode");
        if self.cs1_asserted && !asserted {
            let window = core::mem::take(&mut self.window);
            if let Some(chip) = self.chip.as_mut() {
                chip.complete(&window);
            }
            self.events.push(Event::Transaction(window));
        }
        self.cs1_asserted = asserted;
    }

    fn write_tx(&mut self, tx: DirectTx) {
        assert!(self.direct_enabled, "TX outside direct mode");
        assert!(self.cs1_asserted, "TX without chip select");
        assert!(self.rx.is_none(), "previous response never read");
        if !self.mask_held {
            self.unmasked_transfers += 1;
        }

        let first = self.window.first().copied().unwrap_or(tx);
        let response = match &self.chip {
            Some(chip) => chip.respond(&first, self.window.len()),
            None => 0xff,
        };
        self.window.push(tx);
        self.rx = Some(response);
        self.busy = 1;
    }

    fn read_rx(&mut self) -> u8 {
        self.rx.take().expect("RX FIFO empty")
    }

    fn settle(&mut self) {
        self.events.push(Event::Settle);
    }

    fn write_m1_timing(&mut self, timing: u32) {
        self.timing = Some(timing);
        self.events.push(Event::Timing(timing));
    }

    fn write_m1_read_format(&mut self, format: u32, command: u32) {
        self.read_format = Some((format, command));
        self.events.push(Event::ReadFormat(format, command));
    }

    fn write_m1_write_format(&mut self, format: u32, command: u32) {
        self.write_format = Some((format, command));
        self.events.push(Event::WriteFormat(format, command));
    }

    fn set_m1_writable(&mut self, writable: bool) {
        self.writable = writable;
        self.events.push(Event::Writable(writable));
    }
}
