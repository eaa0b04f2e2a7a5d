//! Detection and bring-up of an APS6404-class QSPI PSRAM on chip-select 1.
//!
//! After [`Psram::init`] reports a non-zero size, plain loads and stores to
//! [`Psram::memory_range`] are turned into quad read/write transactions by the
//! QMI, with no further software involvement.
//!
//! The routines that hold the interface in direct mode are placed in RAM on
//! the target, since the interface also serves code fetch from flash.

use core::ops::Range;

use crate::bus::{BusController, DirectMode, DirectTx};
use crate::config::Config;
use crate::format::TransactionFormat;
use crate::timing::TimingParameters;
use crate::Error;

/// Start of the cached XIP window for chip-select 1.
pub const PSRAM_BASE: usize = 0x1100_0000;

const MIB: usize = 1024 * 1024;

/// EID byte of an 8 MiB part that does not follow the density encoding.
const EID_8MIB_IRREGULAR: u8 = 0x26;

const READ_FORMAT: u32 = TransactionFormat::QUAD_READ.format_bits();
const READ_COMMAND: u32 = TransactionFormat::QUAD_READ.command_bits();
const WRITE_FORMAT: u32 = TransactionFormat::QUAD_WRITE.format_bits();
const WRITE_COMMAND: u32 = TransactionFormat::QUAD_WRITE.command_bits();

/// Known good die marker of a working part.
const KGD_GOOD: u8 = 0b0101_1101;

/// PSRAM command opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Leave QPI mode. Must itself be sent on four lines.
    ExitQuadMode = 0xF5,
    /// Enter QPI mode.
    EnterQuadMode = 0x35,
    /// Read the identification bytes, single-wire.
    ReadId = 0x9F,
    /// Arm the next `Reset`.
    ResetEnable = 0x66,
    /// Reset the device
    Reset = 0x99,
    /// Quad fast read with wait cycles.
    QuadRead = 0xEB,
    /// Quad write.
    QuadWrite = 0x38,
    /// Filler clocked out while reading a response.
    Nop = 0xFF,
}

/// The two significant bytes of the Read ID response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identification {
    /// Known good die marker.
    pub kgd: u8,
    /// First EID byte. The top three bits encode the density.
    pub eid: u8,
}

impl Identification {
    /// Build an Identification from the seven bytes clocked in during Read ID.
    ///
    /// Bytes 0 to 3 overlap the opcode and address phases, byte 4 is the
    /// manufacturer ID. Only the last two are used.
    pub fn from_bytes(buf: &[u8; 7]) -> Self {
        Self {
            kgd: buf[5],
            eid: buf[6],
        }
    }

    /// True when the marker matches the supported part.
    pub fn known_good_die(&self) -> bool {
        self.kgd == KGD_GOOD
    }

    /// Decode the capacity.
    pub fn capacity(&self) -> Capacity {
        if !self.known_good_die() {
            return Capacity::Absent;
        }

        let size_id = self.eid >> 5;
        if self.eid == EID_8MIB_IRREGULAR || size_id == 2 {
            Capacity::Mib8
        } else if size_id == 0 {
            Capacity::Mib2
        } else if size_id == 1 {
            Capacity::Mib4
        } else {
            Capacity::Unrecognized(self.eid)
        }
    }
}

/// Size of the attached PSRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capacity {
    /// Nothing answered with the expected marker.
    Absent,
    /// 2 MiB
    Mib2,
    /// 4 MiB
    Mib4,
    /// 8 MiB
    Mib8,
    /// A good die with a density code outside the known table. Counted as
    /// 1 MiB, which may under-report the part.
    Unrecognized(u8),
}

impl Capacity {
    /// Size in bytes.
    pub fn bytes(&self) -> usize {
        match self {
            Capacity::Absent => 0,
            Capacity::Mib2 => 2 * MIB,
            Capacity::Mib4 => 4 * MIB,
            Capacity::Mib8 => 8 * MIB,
            Capacity::Unrecognized(_) => MIB,
        }
    }
}

/// Probe for the PSRAM with interrupts masked.
///
/// Direct mode is off again when this returns, whatever was found.
pub fn detect<B: BusController>(bus: &mut B) -> Capacity {
    let id = bus.interrupt_free(|bus| read_id(bus));
    report(&id)
}

/// Issue Read ID in direct mode.
///
/// The caller must hold interrupts masked.
#[cfg_attr(target_os = "none", link_section = ".data")]
#[allow(unsafe_code)]
#[inline(never)]
pub fn read_id<B: BusController>(bus: &mut B) -> Identification {
    let mut direct = DirectMode::enter(bus);

    // A chip already in QPI mode would misread a single-wire Read ID.
    {
        let mut cs = direct.select();
        cs.transmit_receive(DirectTx::quad(Opcode::ExitQuadMode as u8));
    }

    let mut response = [0u8; 7];
    {
        let mut cs = direct.select();
        let mut i = 0;
        while i < response.len() {
            let op = if i == 0 { Opcode::ReadId } else { Opcode::Nop };
            response[i] = cs.transmit_receive(DirectTx::single(op as u8));
            i += 1;
        }
    }
    drop(direct);

    Identification::from_bytes(&response)
}

/// Reset the chip and switch it to QPI mode.
///
/// The chip acknowledges none of these commands, so there is nothing to
/// report. The caller must hold interrupts masked.
#[cfg_attr(target_os = "none", link_section = ".data")]
#[allow(unsafe_code)]
#[inline(never)]
pub fn reset_and_enable_quad<B: BusController>(bus: &mut B) {
    let mut direct = DirectMode::enter(bus);
    command(&mut direct, Opcode::ResetEnable);
    command(&mut direct, Opcode::Reset);
    command(&mut direct, Opcode::EnterQuadMode);
}

#[inline(always)]
fn command<B: BusController>(direct: &mut DirectMode<'_, B>, op: Opcode) {
    {
        let mut cs = direct.select();
        cs.transmit_receive(DirectTx::single(op as u8));
    }
    direct.settle();
}

/// Program timing and the quad read/write formats for chip-select 1, then
/// allow stores to its window.
///
/// Fails before touching the bus if `timing` does not fit the register.
#[cfg_attr(target_os = "none", link_section = ".data")]
#[allow(unsafe_code)]
#[inline(never)]
pub fn configure_memory_map<B: BusController>(
    bus: &mut B,
    timing: &TimingParameters,
) -> Result<(), Error> {
    bus.write_m1_timing(timing.register_bits()?);
    bus.write_m1_read_format(READ_FORMAT, READ_COMMAND);
    bus.write_m1_write_format(WRITE_FORMAT, WRITE_COMMAND);
    bus.set_m1_writable(true);
    Ok(())
}

fn report(id: &Identification) -> Capacity {
    debug!("PSRAM ID: kgd={:#x} eid={:#x}", id.kgd, id.eid);

    let capacity = id.capacity();
    match capacity {
        Capacity::Absent => info!("No PSRAM detected"),
        Capacity::Unrecognized(eid) => {
            warn!("Unknown PSRAM density code {:#x}, assuming 1 MiB", eid)
        }
        _ => info!("PSRAM detected: {} bytes", capacity.bytes()),
    }
    capacity
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unconfigured,
    Absent,
    Mapped {
        capacity: Capacity,
        timing: TimingParameters,
    },
}

/// Driver for a QSPI PSRAM on the QMI's second chip select.
///
/// # Type Parameters
///
/// * **`B`**: The QSPI memory interface, see [`BusController`].
#[derive(Debug)]
pub struct Psram<B: BusController> {
    bus: B,
    config: Config,
    state: State,
}

impl<B: BusController> Psram<B> {
    /// Creates a new PSRAM driver. Nothing is touched until [`Psram::init`].
    ///
    /// # Parameters
    ///
    /// * **`bus`**: The QSPI memory interface.
    /// * **`config`**: Chip-select pin and maximum SCK of the board's PSRAM.
    pub fn new(bus: B, config: Config) -> Self {
        Self {
            bus,
            config,
            state: State::Unconfigured,
        }
    }

    /// Detect the chip and, if present, reset it, switch it to QPI mode and
    /// map it. Returns its size in bytes, or 0 when no chip answers.
    ///
    /// An absent chip leaves the memory map as it was. Calling this again
    /// repeats the whole sequence.
    pub fn init(&mut self) -> Result<usize, Error> {
        // Validate up front so an error leaves the bus untouched.
        let timing = self.compute_timing()?;

        if let State::Mapped { .. } = self.state {
            info!("PSRAM already mapped, reconfiguring");
        }

        self.bus.select_cs1_function(self.config.cs_pin);

        let id = self.bus.interrupt_free(|bus| {
            let id = read_id(bus);
            if id.known_good_die() {
                reset_and_enable_quad(bus);
                configure_memory_map(bus, &timing)?;
            }
            Ok::<_, Error>(id)
        })?;

        let capacity = report(&id);
        self.state = match capacity {
            Capacity::Absent => State::Absent,
            _ => State::Mapped { capacity, timing },
        };
        Ok(capacity.bytes())
    }

    /// Recompute the timing for the current system clock and reprogram it.
    ///
    /// Call after changing `clk_sys`. Formats and write enable are kept.
    pub fn retime(&mut self) -> Result<TimingParameters, Error> {
        let State::Mapped { capacity, .. } = self.state else {
            return Err(Error::NotInitialized);
        };

        let timing = self.compute_timing()?;
        let bits = timing.register_bits()?;
        self.bus.interrupt_free(|bus| bus.write_m1_timing(bits));

        self.state = State::Mapped { capacity, timing };
        Ok(timing)
    }

    fn compute_timing(&self) -> Result<TimingParameters, Error> {
        let clock_hz = self.bus.system_clock_hz();
        let max_psram_hz = self.config.max_frequency.hz();
        if clock_hz == 0 || max_psram_hz == 0 {
            return Err(Error::InvalidFrequency);
        }

        let timing = TimingParameters::compute(clock_hz, max_psram_hz);
        debug!(
            "PSRAM timing at {} Hz: clkdiv={} rxdelay={} max_select={} min_deselect={}",
            clock_hz,
            timing.divisor,
            timing.rx_delay,
            timing.max_select,
            timing.min_deselect,
        );
        timing.register_bits()?;
        Ok(timing)
    }

    /// Detected capacity, [`Capacity::Absent`] before a successful init.
    pub fn capacity(&self) -> Capacity {
        match self.state {
            State::Mapped { capacity, .. } => capacity,
            _ => Capacity::Absent,
        }
    }

    /// Size in bytes, 0 before a successful init.
    pub fn size(&self) -> usize {
        self.capacity().bytes()
    }

    /// Timing currently programmed, if the chip is mapped.
    pub fn timing(&self) -> Option<TimingParameters> {
        match self.state {
            State::Mapped { timing, .. } => Some(timing),
            _ => None,
        }
    }

    /// True once [`Psram::init`] has run, whether or not a chip was found.
    pub fn is_probed(&self) -> bool {
        self.state != State::Unconfigured
    }

    /// Address range the PSRAM is mapped at. Empty when nothing is mapped.
    pub fn memory_range(&self) -> Range<usize> {
        PSRAM_BASE..PSRAM_BASE + self.size()
    }

    /// The board configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the underlying interface.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the underlying interface, e.g. to record a new system
    /// clock before [`Psram::retime`].
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give back the underlying interface. The memory map stays programmed.
    pub fn release(self) -> B {
        self.bus
    }
}
