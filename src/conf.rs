//! Radio configuration parameters and operating modes.

/// LoRa header mode. Explicit headers carry the payload length on air,
/// implicit mode relies on the configured `PayloadLength` register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderMode {
    Explicit,
    Implicit,
}

/// Operating mode of the transceiver. Exactly one is active at a time; the
/// driver tracks the last mode it programmed so transitions are observable
/// without a register read-back.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoraMode {
    Sleep,
    Idle,
    Tx,
    RxContinuous,
    RxSingle,
}

/// The full set of radio parameters.
///
/// Once a field has been applied by the driver it always holds the
/// clamped/quantized value actually programmed into hardware, never the
/// caller's raw request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Transmit power in dBm, accepted range 2..=17 (PA_BOOST output).
    pub tx_power: u8,
    /// Spreading factor, accepted range 6..=12.
    pub spreading_factor: u8,
    /// Channel bandwidth in Hz, quantized to one of the eight chip steps.
    pub bandwidth: u64,
    /// Forward-error-correction denominator, accepted range 5..=8 (4/5..4/8).
    pub coding_rate: u8,
    /// Preamble length in symbols.
    pub preamble_length: u16,
    /// Sync word; 0x12 for private networks, 0x34 for LoRaWAN.
    pub sync_word: u8,
    /// Carrier frequency in Hz.
    pub frequency: u32,
    /// Header mode.
    pub header: HeaderMode,
    /// Payload CRC generation/checking.
    pub crc_on: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tx_power: 17,
            spreading_factor: 7,
            bandwidth: 125_000,
            coding_rate: 5,
            preamble_length: 8,
            sync_word: 0x12,
            frequency: 868_000_000,
            header: HeaderMode::Explicit,
            crc_on: true,
        }
    }
}
