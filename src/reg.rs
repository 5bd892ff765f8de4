//! SX1276 register map and fixed bit patterns.

/// Value of the `Version` register on a supported chip.
pub const VERSION_ID: u8 = 0x12;

/// Register addresses of the SX1276 control/status space.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    Fifo = 0x00,
    OpMode = 0x01,
    FrfMsb = 0x06,
    FrfMid = 0x07,
    FrfLsb = 0x08,
    PaConfig = 0x09,
    Lna = 0x0C,
    FifoAddrPtr = 0x0D,
    FifoTxBaseAddr = 0x0E,
    FifoRxBaseAddr = 0x0F,
    FifoRxCurrentAddr = 0x10,
    IrqFlagsMask = 0x11,
    IrqFlags = 0x12,
    RxNbBytes = 0x13,
    PktSnrValue = 0x19,
    PktRssiValue = 0x1A,
    ModemConfig1 = 0x1D,
    ModemConfig2 = 0x1E,
    PreambleMsb = 0x20,
    PreambleLsb = 0x21,
    PayloadLength = 0x22,
    ModemConfig3 = 0x26,
    DetectionOptimize = 0x31,
    DetectionThreshold = 0x37,
    SyncWord = 0x39,
    DioMapping1 = 0x40,
    Version = 0x42,
}

impl Register {
    pub fn addr(self) -> u8 {
        self as u8
    }
}

/// Operating-mode bits of the `OpMode` register.
pub mod mode {
    pub const LONG_RANGE_MODE: u8 = 0x80;
    pub const SLEEP: u8 = 0x00;
    pub const STDBY: u8 = 0x01;
    pub const TX: u8 = 0x03;
    pub const RX_CONTINUOUS: u8 = 0x05;
    pub const RX_SINGLE: u8 = 0x06;
}

/// Completion/error bits of the `IrqFlags` register.
pub mod irq {
    pub const TX_DONE: u8 = 0x08;
    pub const PAYLOAD_CRC_ERROR: u8 = 0x20;
    pub const RX_DONE: u8 = 0x40;
}

/// PA boost output selection bit of `PaConfig`.
pub const PA_BOOST: u8 = 0x80;

/// Detection tuning values. SF6 needs its own optimize/threshold pair, all
/// other spreading factors share the defaults.
pub mod detection {
    pub const OPTIMIZE_DEFAULT: u8 = 0xC3;
    pub const OPTIMIZE_SF6: u8 = 0xC5;
    pub const THRESHOLD_DEFAULT: u8 = 0x0A;
    pub const THRESHOLD_SF6: u8 = 0x0C;
}
