//! Pure register encoding/decoding rules.
//!
//! Everything in this module is stateless bit arithmetic; no I/O happens
//! here. The read-modify-write helpers (`coding_rate_bits`, `crc_bits`,
//! `header_bits`, and the nibble merges done by the driver for SF/BW) take
//! the current register value as an argument — the driver must read that
//! value immediately before calling them so unrelated bits are preserved.

use embassy_time::Duration;

use crate::conf::{Config, HeaderMode, LoraMode};
use crate::reg::{irq, mode, PA_BOOST};

/// Crystal frequency the frequency-register resolution is derived from.
pub const F_XOSC: u64 = 32_000_000;

/// The eight bandwidth quantization thresholds, in Hz.
pub const BW_STEPS: [u64; 8] = [
    10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000,
];

/// Sets the direction bit for a register write.
pub fn write_mask(reg: u8) -> u8 {
    reg | 0x80
}

/// Clears the direction bit for a register read.
pub fn read_mask(reg: u8) -> u8 {
    reg & 0x7F
}

/// `OpMode` register value for an operating mode, with the long-range
/// (LoRa) bit always set.
pub fn mode_bits(m: LoraMode) -> u8 {
    let status = match m {
        LoraMode::Sleep => mode::SLEEP,
        LoraMode::Idle => mode::STDBY,
        LoraMode::Tx => mode::TX,
        LoraMode::RxContinuous => mode::RX_CONTINUOUS,
        LoraMode::RxSingle => mode::RX_SINGLE,
    };
    mode::LONG_RANGE_MODE | status
}

/// `PaConfig` value for a transmit power already clamped to 2..=17 dBm.
/// The chip encodes PA_BOOST output power as `dBm - 2`.
pub fn tx_power_bits(power: u8) -> u8 {
    (power - 2) | PA_BOOST
}

/// Converts a carrier frequency in Hz into the 24-bit `Frf` register value.
pub fn frf_from_hz(hz: u32) -> u64 {
    ((hz as u64) << 19) / F_XOSC
}

/// Splits an `Frf` value into its three register bytes, most significant
/// first. Anything above the low 24 bits is truncated.
pub fn freq_bits(frf: u64) -> [u8; 3] {
    [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8]
}

/// High nibble of `ModemConfig2` for a spreading factor. The caller merges
/// this with the low nibble of the current register value.
pub fn sf_bits(sf: u8) -> u8 {
    (sf << 4) & 0xF0
}

/// Quantizes a bandwidth request to a chip step. Returns the 1-based step
/// index and the threshold value that will be stored in the configuration;
/// requests above the top threshold map to index 9 at the top threshold.
pub fn bw_step(bw: u64) -> (u8, u64) {
    for (i, &threshold) in BW_STEPS.iter().enumerate() {
        if bw <= threshold {
            return (i as u8 + 1, threshold);
        }
    }
    (9, BW_STEPS[7])
}

/// High nibble of `ModemConfig1` for a bandwidth step index.
pub fn bw_bits(step: u8) -> u8 {
    (step << 4) & 0xF0
}

/// Merges a coding rate (`denominator - 4`) into bits 1..=3 of the current
/// `ModemConfig1` value, preserving all other bits.
pub fn coding_rate_bits(cr: u8, current: u8) -> u8 {
    (current & 0xF1) | ((cr << 1) & 0x0E)
}

/// Sets or clears the CRC-enable bit (bit 2) of the current `ModemConfig2`
/// value, preserving all other bits.
pub fn crc_bits(enable: bool, current: u8) -> u8 {
    if enable {
        current | 0x04
    } else {
        current & 0xFB
    }
}

/// Sets the header-mode bit (bit 0) of the current `ModemConfig1` value:
/// cleared for explicit headers, set for implicit.
pub fn header_bits(header: HeaderMode, current: u8) -> u8 {
    match header {
        HeaderMode::Explicit => current & 0xFE,
        HeaderMode::Implicit => current | 0x01,
    }
}

/// Big-endian register byte pair for a preamble length.
pub fn preamble_bits(length: u16) -> [u8; 2] {
    [(length >> 8) as u8, length as u8]
}

/// Receive-status classification of an `IrqFlags` value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IrqStatus {
    /// RX-done is set and the payload passed the CRC check.
    PacketReady,
    /// RX-done is clear; nothing has been received.
    NoPacket,
    /// The payload arrived damaged (CRC error bit set).
    CrcError,
}

/// Classifies the `IrqFlags` register after a receive attempt.
pub fn irq_status(flags: u8) -> IrqStatus {
    if flags & irq::RX_DONE == 0 {
        IrqStatus::NoPacket
    } else if flags & irq::PAYLOAD_CRC_ERROR != 0 {
        IrqStatus::CrcError
    } else {
        IrqStatus::PacketReady
    }
}

/// Closed-form LoRa airtime estimate for a payload of `payload_length`
/// bytes under the given configuration.
pub fn airtime(conf: &Config, payload_length: u16) -> Duration {
    let sf = conf.spreading_factor as f64;
    let cr = (conf.coding_rate - 4) as f64;
    let pl = payload_length as f64;
    let h = match conf.header {
        HeaderMode::Implicit => 1.0,
        HeaderMode::Explicit => 0.0,
    };
    // Low-data-rate optimization kicks in above SF11.
    let de = if conf.spreading_factor > 11 { 1.0 } else { 0.0 };

    let t_symbol = (1u64 << conf.spreading_factor) as f64 / conf.bandwidth as f64;
    let t_preamble = (conf.preamble_length as f64 + 4.25) * t_symbol;
    let numerator = 8.0 * pl - 4.0 * sf + 28.0 + 16.0 - 20.0 * h;
    let extra_symbols = ceil(numerator / (4.0 * (sf - 2.0 * de))) * (cr + 4.0);
    let payload_symbols = 8.0 + if extra_symbols > 0.0 { extra_symbols } else { 0.0 };

    let total_secs = t_preamble + payload_symbols * t_symbol;
    Duration::from_micros((total_secs * 1_000_000.0) as u64)
}

// core has no f64::ceil; payload symbol counts are small positive values.
fn ceil(v: f64) -> f64 {
    let truncated = v as i64 as f64;
    if v > truncated {
        truncated + 1.0
    } else {
        truncated
    }
}
