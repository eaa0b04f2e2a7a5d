//! Bring-up driver for APS6404-class QSPI PSRAM on the RP2350.
//!
//! The PSRAM shares the QSPI memory interface (QMI) with the boot flash and
//! sits on its second chip select. [`Psram::init`] detects the chip, resets it
//! into QPI mode, derives the interface timing from the system clock and
//! programs the memory-mapped read and write formats. From then on the chip
//! is ordinary memory at [`Psram::memory_range`].
//!
//! The hardware is reached through the [`BusController`] trait. Enable the
//! `rp235x` feature for the implementation over the real peripherals.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs, unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bus;
pub mod config;
mod error;
pub mod format;
pub mod psram;
mod regs;
#[cfg(feature = "rp235x")]
#[allow(unsafe_code)]
pub mod rp235x;
pub mod timing;

pub use crate::bus::BusController;
pub use crate::config::{Config, CsPin, MaxFrequency};
pub use crate::error::Error;
pub use crate::psram::{Capacity, Identification, Psram};
pub use crate::timing::TimingParameters;
