//! Error types for the SX1276 driver.

use core::fmt::{self, Debug};

/// An error related to GPIO line operations.
pub enum PinError<TPINERR> {
    /// Driving the reset line failed.
    Output(TPINERR),
    /// Reading the interrupt-sense line failed.
    Input(TPINERR),
}

impl<TPINERR: Debug> Debug for PinError<TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(err) => write!(f, "Output({err:?})"),
            Self::Input(err) => write!(f, "Input({err:?})"),
        }
    }
}

/// The main error type for the SX1276 driver.
///
/// Hardware I/O failures (`Bus`, `Pin`) are propagated verbatim to the
/// immediate caller; the driver never retries on its own.
pub enum Error<TBUSERR, TPINERR> {
    /// A register-transport error.
    Bus(TBUSERR),
    /// A reset or interrupt line error.
    Pin(PinError<TPINERR>),
    /// The version register did not identify a supported chip at `begin`.
    /// Carries the value that was read.
    UnsupportedDevice(u8),
    /// The version register check of `check_connection` failed.
    ConnectionError,
    /// No packet is waiting in the receive buffer.
    NoPacketReceived,
    /// A packet arrived but its payload failed the CRC check.
    PacketDamaged,
    /// A bounded wait exceeded its deadline.
    Timeout,
    /// The event kind cannot be polled for.
    UnknownEvent,
    /// A batched register write was given mismatched register/value counts.
    LengthMismatch,
    /// Another packet operation or event poller currently owns the driver.
    Busy,
}

impl<TBUSERR: Debug, TPINERR: Debug> Debug for Error<TBUSERR, TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus({err:?})"),
            Self::Pin(err) => write!(f, "Pin({err:?})"),
            Self::UnsupportedDevice(version) => {
                write!(f, "UnsupportedDevice(0x{version:02X})")
            }
            Self::ConnectionError => write!(f, "ConnectionError"),
            Self::NoPacketReceived => write!(f, "NoPacketReceived"),
            Self::PacketDamaged => write!(f, "PacketDamaged"),
            Self::Timeout => write!(f, "Timeout"),
            Self::UnknownEvent => write!(f, "UnknownEvent"),
            Self::LengthMismatch => write!(f, "LengthMismatch"),
            Self::Busy => write!(f, "Busy"),
        }
    }
}

impl<TBUSERR, TPINERR> From<PinError<TPINERR>> for Error<TBUSERR, TPINERR> {
    fn from(pin_err: PinError<TPINERR>) -> Self {
        Error::Pin(pin_err)
    }
}
