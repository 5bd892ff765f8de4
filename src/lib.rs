//! An asynchronous, `no_std` driver for the Semtech SX1276 LoRa transceiver.
//!
//! The SX1276 is controlled through a register-oriented serial bus: every
//! interaction with the chip is a single-byte read or write of an addressable
//! register. This crate implements the driver core on top of three narrow
//! capability contracts (a register transport, a reset line and an
//! interrupt-sense line, see [`bus`]) and stays agnostic of the concrete
//! platform underneath.
//!
//! The main entry point is the [`Sx1276`] struct. Besides configuration and
//! blocking-style packet TX/RX it provides a background event subsystem
//! ([`event`]) that polls the chip for receive/transmit completion and fires
//! a user callback, without requiring a hardware interrupt callback from the
//! runtime.
//!
//! All bus traffic is serialized through a single `embassy-sync` mutex owned
//! by the driver instance, so a concurrently running event poller can never
//! interleave register transactions with a caller-driven operation.

#![no_std]

pub mod bus;
pub mod codec;
pub mod conf;
pub mod event;
pub mod reg;

mod sx;
pub use sx::*;
