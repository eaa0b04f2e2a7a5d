//! Bit layout of the QMI registers whose values this driver encodes itself.
//!
//! Values follow the RP2350 datasheet, chapter "QSPI Memory Interface".

/// `QMI_DIRECT_TX`
pub mod direct_tx {
    pub const IWIDTH_LSB: u32 = 16;
    pub const OE: u32 = 1 << 19;
}

/// `QMI_M1_TIMING`
pub mod timing {
    pub const COOLDOWN_LSB: u32 = 30;
    pub const PAGEBREAK_LSB: u32 = 28;
    pub const PAGEBREAK_1024: u32 = 2;
    pub const MAX_SELECT_LSB: u32 = 17;
    pub const MAX_SELECT_MAX: u32 = 0x3f;
    pub const MIN_DESELECT_LSB: u32 = 12;
    pub const MIN_DESELECT_MAX: u32 = 0x1f;
    pub const RXDELAY_LSB: u32 = 8;
    pub const RXDELAY_MAX: u32 = 0x7;
    pub const CLKDIV_LSB: u32 = 0;
    pub const CLKDIV_MAX: u32 = 0xff;
}

/// `QMI_M1_RFMT` and `QMI_M1_WFMT` share one layout.
pub mod fmt {
    pub const PREFIX_WIDTH_LSB: u32 = 0;
    pub const ADDR_WIDTH_LSB: u32 = 2;
    pub const SUFFIX_WIDTH_LSB: u32 = 4;
    pub const DUMMY_WIDTH_LSB: u32 = 6;
    pub const DATA_WIDTH_LSB: u32 = 8;
    pub const PREFIX_LEN_LSB: u32 = 12;
    pub const SUFFIX_LEN_LSB: u32 = 14;
    pub const DUMMY_LEN_LSB: u32 = 16;
}

/// `QMI_M1_RCMD` and `QMI_M1_WCMD` share one layout.
pub mod cmd {
    pub const PREFIX_LSB: u32 = 0;
}
