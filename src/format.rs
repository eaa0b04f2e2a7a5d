//! Memory-mapped transaction formats for chip-select 1.

use crate::psram::Opcode;
use crate::regs::{cmd, fmt};

/// Number of data lines used by one phase of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum Width {
    /// Single
    S = 0,
    /// Dual
    D = 1,
    /// Quad
    Q = 2,
}

/// Length of the dummy phase, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum DummyLen {
    /// No dummy phase
    None = 0,
    /// 4 bits
    Bits4 = 1,
    /// 8 bits
    Bits8 = 2,
    /// 12 bits
    Bits12 = 3,
    /// 16 bits
    Bits16 = 4,
    /// 20 bits
    Bits20 = 5,
    /// 24 bits
    Bits24 = 6,
    /// 28 bits
    Bits28 = 7,
}

/// Length of the suffix phase, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum SuffixLen {
    /// No suffix
    None = 0,
    /// 8 bits
    Bits8 = 2,
    /// 16 bits
    Bits16 = 3,
}

/// How the QMI turns a load or store into a chip transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransactionFormat {
    /// Width of the command prefix.
    pub prefix_width: Width,
    /// Width of the 24-bit address.
    pub addr_width: Width,
    /// Width of the suffix.
    pub suffix_width: Width,
    /// Width of the dummy phase.
    pub dummy_width: Width,
    /// Width of the data phase.
    pub data_width: Width,
    /// Send an 8-bit command prefix.
    pub prefix: bool,
    /// Dummy phase length.
    pub dummy_len: DummyLen,
    /// Suffix phase length.
    pub suffix_len: SuffixLen,
    /// Opcode sent in the prefix phase.
    pub command: u8,
}

impl TransactionFormat {
    /// Quad fast read: 24-bit address, 6 wait cycles.
    pub const QUAD_READ: Self = Self {
        prefix_width: Width::Q,
        addr_width: Width::Q,
        suffix_width: Width::Q,
        dummy_width: Width::Q,
        data_width: Width::Q,
        prefix: true,
        dummy_len: DummyLen::Bits24,
        suffix_len: SuffixLen::None,
        command: Opcode::QuadRead as u8,
    };

    /// Quad write: same shape as the read, without wait cycles.
    pub const QUAD_WRITE: Self = Self {
        dummy_len: DummyLen::None,
        command: Opcode::QuadWrite as u8,
        ..Self::QUAD_READ
    };

    /// `QMI_M1_RFMT`/`QMI_M1_WFMT` value.
    pub const fn format_bits(&self) -> u32 {
        (self.prefix_width as u32) << fmt::PREFIX_WIDTH_LSB
            | (self.addr_width as u32) << fmt::ADDR_WIDTH_LSB
            | (self.suffix_width as u32) << fmt::SUFFIX_WIDTH_LSB
            | (self.dummy_width as u32) << fmt::DUMMY_WIDTH_LSB
            | (self.data_width as u32) << fmt::DATA_WIDTH_LSB
            | (self.prefix as u32) << fmt::PREFIX_LEN_LSB
            | (self.suffix_len as u32) << fmt::SUFFIX_LEN_LSB
            | (self.dummy_len as u32) << fmt::DUMMY_LEN_LSB
    }

    /// `QMI_M1_RCMD`/`QMI_M1_WCMD` value. The suffix byte is left zero.
    pub const fn command_bits(&self) -> u32 {
        (self.command as u32) << cmd::PREFIX_LSB
    }
}
