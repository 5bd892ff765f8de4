//! Shared mock transport and GPIO lines for driver tests.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use sx1276_async::bus::RegisterBus;

/// Error raised by the mock bus when programmed to fail.
#[derive(Debug)]
pub struct BusFault;

/// Register file plus a trace of every write that reached the bus.
pub struct BusState {
    /// Values by register address (direction bit stripped).
    pub regs: [u8; 0x80],
    /// Every write in arrival order, with the direction bit still set.
    pub writes: Vec<(u8, u8)>,
    /// Bytes handed out for sequential reads of the FIFO register.
    pub fifo_data: Vec<u8>,
    fifo_pos: usize,
    /// When set, every read fails with [`BusFault`].
    pub fail_reads: bool,
}

impl BusState {
    pub fn new() -> Self {
        Self {
            regs: [0; 0x80],
            writes: Vec::new(),
            fifo_data: Vec::new(),
            fifo_pos: 0,
            fail_reads: false,
        }
    }

    /// State for a chip that identifies itself with `version`.
    pub fn with_version(version: u8) -> Rc<RefCell<Self>> {
        let mut state = Self::new();
        state.regs[0x42] = version;
        Rc::new(RefCell::new(state))
    }

    /// True if `(reg | 0x80, value)` appears in the write trace.
    pub fn wrote(&self, reg: u8, value: u8) -> bool {
        self.writes.contains(&(reg | 0x80, value))
    }
}

/// Mock register transport backed by a shared [`BusState`].
pub struct MockBus(pub Rc<RefCell<BusState>>);

impl RegisterBus for MockBus {
    type Error = BusFault;

    async fn write(&mut self, reg: u8, value: u8) -> Result<(), BusFault> {
        let mut state = self.0.borrow_mut();
        state.writes.push((reg, value));
        state.regs[(reg & 0x7F) as usize] = value;
        Ok(())
    }

    async fn read(&mut self, reg: u8) -> Result<u8, BusFault> {
        let mut state = self.0.borrow_mut();
        if state.fail_reads {
            return Err(BusFault);
        }
        let addr = (reg & 0x7F) as usize;
        if addr == 0x00 && state.fifo_pos < state.fifo_data.len() {
            let byte = state.fifo_data[state.fifo_pos];
            state.fifo_pos += 1;
            return Ok(byte);
        }
        Ok(state.regs[addr])
    }
}

/// Mock GPIO line usable as both the reset output and the DIO0 input.
#[derive(Clone)]
pub struct MockPin {
    level: Rc<Cell<bool>>,
}

impl MockPin {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
        }
    }

    pub fn set(&self, level: bool) {
        self.level.set(level);
    }

    pub fn get(&self) -> bool {
        self.level.get()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}
