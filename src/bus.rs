//! Capability contracts consumed by the driver core.
//!
//! The core never talks to a concrete peripheral. It is written against a
//! register transport ([`RegisterBus`]), a reset line
//! (`embedded_hal::digital::OutputPin`) and an interrupt-sense line
//! (`embedded_hal::digital::InputPin`). [`SpiRegisterBus`] is a ready-made
//! transport for the common case of an `embedded-hal-async` SPI device.

use embedded_hal_async::spi::SpiDevice;

/// Byte-level register transport.
///
/// The address passed in already carries the direction bit: bit 7 set for a
/// write, cleared for a read. Implementations move exactly one value byte
/// per call and must not retry on failure.
#[allow(async_fn_in_trait)]
pub trait RegisterBus {
    type Error: core::fmt::Debug;

    /// Sends a register/value pair to the chip.
    async fn write(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Reads the value of a register.
    async fn read(&mut self, reg: u8) -> Result<u8, Self::Error>;
}

/// [`RegisterBus`] implementation over an async SPI device.
///
/// Uses the SX1276 single-access framing: one address byte followed by one
/// value byte within a single chip-select assertion.
pub struct SpiRegisterBus<TSPI> {
    spi: TSPI,
}

impl<TSPI> SpiRegisterBus<TSPI> {
    pub fn new(spi: TSPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn free(self) -> TSPI {
        self.spi
    }
}

impl<TSPI: SpiDevice> RegisterBus for SpiRegisterBus<TSPI> {
    type Error = TSPI::Error;

    async fn write(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.spi.write(&[reg, value]).await
    }

    async fn read(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut buf = [reg, 0x00];
        self.spi.transfer_in_place(&mut buf).await?;
        Ok(buf[1])
    }
}
