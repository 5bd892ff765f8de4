//! The core implementation of the SX1276 driver.

pub(crate) mod err;

use core::fmt::Debug;
use core::future::Future;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::bus::RegisterBus;
use crate::codec::{self, IrqStatus};
use crate::conf::{Config, HeaderMode, LoraMode};
use crate::event::{Checker, Event, EventPoller};
use crate::reg::{detection, irq, Register, VERSION_ID};

pub use err::{Error, PinError};

/// Largest payload the chip FIFO can carry.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Number of registers covered by [`Sx1276::dump_registers`] (0x00..=0x42).
pub const REG_DUMP_LEN: usize = 0x43;

/// Hold time of the reset line during a hardware reset.
const RESET_HOLD: Duration = Duration::from_millis(300);
/// Power-up settle time after releasing the reset line.
const RESET_SETTLE: Duration = Duration::from_millis(1000);
/// Sleep between iterations of a bounded completion wait.
const POLL_TICK: Duration = Duration::from_millis(1);
/// Deadline of the event-cooperating transmit wait.
const TX_EVENT_TIMEOUT: Duration = Duration::from_millis(300);
/// Deadline the event checkers give the interrupt-sense line per tick.
const EVENT_WAIT: Duration = Duration::from_millis(500);

// Operation-slot states. The slot is a higher-level token on top of the bus
// lock: a direct packet operation and a background event poller both change
// the operating mode, so only one of them may own the driver at a time.
const SLOT_FREE: u8 = 0;
const SLOT_DIRECT: u8 = 1;
const SLOT_POLLER: u8 = 2;

/// One observed (address, value) pair of a register dump.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegVal {
    pub reg: u8,
    pub val: u8,
}

/// A driver for the Semtech SX1276 LoRa transceiver.
///
/// Generic over the register transport `TBUS`, the reset line `TRST` and the
/// interrupt-sense line `TDIO`. All methods take `&self`; the device state
/// lives behind a single mutex so an event poller and the caller can share
/// one instance.
pub struct Sx1276<TBUS, TRST, TDIO> {
    inner: Mutex<CriticalSectionRawMutex, Inner<TBUS, TRST, TDIO>>,
    op_slot: AtomicU8,
    tx_done: AtomicBool,
    cancel: Signal<CriticalSectionRawMutex, ()>,
}

struct Inner<TBUS, TRST, TDIO> {
    bus: TBUS,
    rst_pin: TRST,
    dio0_pin: TDIO,
    conf: Config,
    mode: LoraMode,
}

/// Releases the operation slot when a direct packet operation finishes,
/// whichever way it exits.
struct SlotGuard<'a>(&'a AtomicU8);

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.0.store(SLOT_FREE, Ordering::Release);
    }
}

/// Polls `check` until it reports completion, sleeping [`POLL_TICK`] between
/// attempts and failing with [`Error::Timeout`] once the deadline passes.
///
/// This is the single wait primitive behind every completion wait in the
/// driver (TX-done flag, cross-task done flag, interrupt-sense level).
async fn wait_condition<TBUSERR, TPINERR, F, Fut>(
    timeout: Duration,
    mut check: F,
) -> Result<(), Error<TBUSERR, TPINERR>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, Error<TBUSERR, TPINERR>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout);
        }
        Timer::after(POLL_TICK).await;
    }
}

impl<TBUS, TRST, TDIO, TPINERR> Sx1276<TBUS, TRST, TDIO>
where
    TBUS: RegisterBus,
    TRST: OutputPin<Error = TPINERR>,
    TDIO: InputPin<Error = TPINERR>,
    TPINERR: Debug,
{
    /// Creates a new driver instance around a register transport, a reset
    /// line and the DIO0 interrupt-sense line. No I/O happens until
    /// [`begin`](Self::begin) is called.
    pub fn new(bus: TBUS, rst_pin: TRST, dio0_pin: TDIO, conf: Config) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bus,
                rst_pin,
                dio0_pin,
                conf,
                mode: LoraMode::Sleep,
            }),
            op_slot: AtomicU8::new(SLOT_FREE),
            tx_done: AtomicBool::new(false),
            cancel: Signal::new(),
        }
    }

    /// Initializes the chip: hardware reset, version check, FIFO and LNA
    /// setup, then the full configuration sequence, leaving the chip in
    /// Idle mode.
    ///
    /// Fails with [`Error::UnsupportedDevice`] before touching any
    /// configuration register if the version identifier does not match.
    pub async fn begin(&self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let mut inner = self.inner.lock().await;
        inner.reset().await?;

        let version = inner.read_reg(Register::Version).await?;
        log::trace!("sx1276::begin version 0x{version:02X}");
        if version != VERSION_ID {
            return Err(Error::UnsupportedDevice(version));
        }

        inner.change_mode(LoraMode::Sleep).await?;

        let lna = inner.read_reg(Register::Lna).await?;
        inner
            .write_many(
                &[
                    Register::FifoRxBaseAddr,
                    Register::FifoTxBaseAddr,
                    Register::Lna,
                    Register::ModemConfig3,
                ],
                &[0x00, 0x00, lna | 0x03, 0x04],
            )
            .await?;

        inner.configure().await?;
        inner.change_mode(LoraMode::Idle).await?;
        log::trace!("sx1276::begin done");
        Ok(())
    }

    /// Performs the hardware reset sequence on the reset line.
    pub async fn reset(&self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.reset().await
    }

    /// Reads the version register and fails with [`Error::ConnectionError`]
    /// unless it identifies a supported chip.
    pub async fn check_connection(&self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let mut inner = self.inner.lock().await;
        let version = inner.read_reg(Register::Version).await?;
        if version != VERSION_ID {
            return Err(Error::ConnectionError);
        }
        Ok(())
    }

    /// Writes the operating-mode register and records the new mode.
    pub async fn change_mode(&self, m: LoraMode) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.change_mode(m).await
    }

    /// Sets the transmit power, clamped to 2..=17 dBm.
    pub async fn set_tx_power(&self, power: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_tx_power(power).await
    }

    /// Sets the spreading factor, clamped to 6..=12. SF6 additionally
    /// selects the chip's low-SF detection tuning.
    pub async fn set_spreading_factor(&self, sf: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_spreading_factor(sf).await
    }

    /// Sets the channel bandwidth, quantized up to the nearest chip step.
    pub async fn set_bandwidth(&self, bw: u64) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_bandwidth(bw).await
    }

    /// Sets the coding-rate denominator, clamped to 5..=8.
    pub async fn set_coding_rate(&self, denominator: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_coding_rate(denominator).await
    }

    /// Sets the preamble length in symbols.
    pub async fn set_preamble_length(&self, length: u16) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_preamble_length(length).await
    }

    /// Sets the sync word.
    pub async fn set_sync_word(&self, sync_word: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_sync_word(sync_word).await
    }

    /// Sets the carrier frequency in Hz.
    pub async fn set_frequency(&self, hz: u32) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_frequency(hz).await
    }

    /// Selects explicit or implicit header mode.
    pub async fn set_header_mode(&self, header: HeaderMode) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_header_mode(header).await
    }

    /// Enables or disables payload CRC.
    pub async fn set_crc(&self, enable: bool) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.set_crc(enable).await
    }

    /// Transmits a payload and waits for the TX-done IRQ bit, polling the
    /// flags register until `timeout` expires.
    ///
    /// Fails with [`Error::Busy`] while an event poller is registered; use
    /// [`send_packet_with_event`](Self::send_packet_with_event) together
    /// with a [`Event::TxDone`] poller instead.
    pub async fn send_packet(
        &self,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let _slot = self.claim_direct()?;
        {
            let mut inner = self.inner.lock().await;
            inner.start_transmit(payload).await?;
        }
        wait_condition(timeout, move || async move {
            let mut inner = self.inner.lock().await;
            let flags = inner.read_reg(Register::IrqFlags).await?;
            Ok(flags & irq::TX_DONE != 0)
        })
        .await?;
        let mut inner = self.inner.lock().await;
        inner.write_reg(Register::IrqFlags, irq::TX_DONE).await
    }

    /// Transmits a payload and waits for the cross-task done flag set by an
    /// active [`Event::TxDone`] poller, failing with [`Error::Timeout`]
    /// after 300 ms.
    pub async fn send_packet_with_event(
        &self,
        payload: &[u8],
    ) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.tx_done.store(false, Ordering::Release);
        {
            let mut inner = self.inner.lock().await;
            inner.start_transmit(payload).await?;
        }
        wait_condition(TX_EVENT_TIMEOUT, move || async move {
            Ok(self.tx_done.load(Ordering::Acquire))
        })
        .await?;
        self.tx_done.store(false, Ordering::Release);
        Ok(())
    }

    /// Retrieves a received packet from the chip FIFO.
    ///
    /// Fails with [`Error::NoPacketReceived`] if nothing is waiting and with
    /// [`Error::PacketDamaged`] (after clearing only the CRC-error bit) if
    /// the payload failed its CRC check. Partially read data is discarded on
    /// a transport failure.
    pub async fn receive_packet(
        &self,
    ) -> Result<Vec<u8, MAX_PAYLOAD_LEN>, Error<TBUS::Error, TPINERR>> {
        let mut inner = self.inner.lock().await;
        inner.receive().await
    }

    /// Probes the RX-done IRQ bit without consuming the packet.
    pub async fn is_packet_ready(&self) -> Result<bool, Error<TBUS::Error, TPINERR>> {
        let mut inner = self.inner.lock().await;
        let flags = inner.read_reg(Register::IrqFlags).await?;
        Ok(flags & irq::RX_DONE != 0)
    }

    /// Raw RSSI register value of the last received packet. Conversion to
    /// dBm is left to the caller.
    pub async fn last_packet_rssi(&self) -> Result<u8, Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.read_reg(Register::PktRssiValue).await
    }

    /// Raw SNR register value of the last received packet.
    pub async fn last_packet_snr(&self) -> Result<u8, Error<TBUS::Error, TPINERR>> {
        self.inner.lock().await.read_reg(Register::PktSnrValue).await
    }

    /// Estimated on-air duration of a packet with `payload_length` bytes
    /// under the current configuration.
    pub async fn estimated_airtime(&self, payload_length: u16) -> Duration {
        let inner = self.inner.lock().await;
        codec::airtime(&inner.conf, payload_length)
    }

    /// Snapshot of the currently programmed configuration.
    pub async fn config(&self) -> Config {
        self.inner.lock().await.conf.clone()
    }

    /// The operating mode last programmed by this driver.
    pub async fn mode(&self) -> LoraMode {
        self.inner.lock().await.mode
    }

    /// Reads every register in 0x00..=0x42 under one lock hold, aborting on
    /// the first read failure.
    pub async fn dump_registers(
        &self,
    ) -> Result<Vec<RegVal, REG_DUMP_LEN>, Error<TBUS::Error, TPINERR>> {
        let mut inner = self.inner.lock().await;
        let mut dump = Vec::new();
        for reg in 0..REG_DUMP_LEN as u8 {
            let val = inner.read_raw(reg).await?;
            let _ = dump.push(RegVal { reg, val });
        }
        Ok(dump)
    }

    /// Registers a background poller for `event` that fires `callback` each
    /// time the event is observed.
    ///
    /// The returned [`EventPoller`] does nothing until its
    /// [`run`](EventPoller::run) future is polled; spawn it or drive it
    /// alongside other work. Only [`Event::RxDone`] and [`Event::TxDone`]
    /// can be polled for; anything else fails with [`Error::UnknownEvent`].
    /// A second registration while one poller is alive fails with
    /// [`Error::Busy`] instead of silently orphaning the first.
    pub fn listen<F>(
        &self,
        event: Event,
        callback: F,
    ) -> Result<EventPoller<'_, TBUS, TRST, TDIO, F>, Error<TBUS::Error, TPINERR>>
    where
        F: FnMut(),
    {
        let checker = match event {
            Event::RxDone => Checker::RxDone,
            Event::TxDone => Checker::TxDone,
            _ => return Err(Error::UnknownEvent),
        };
        self.op_slot
            .compare_exchange(SLOT_FREE, SLOT_POLLER, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        self.cancel.reset();
        self.tx_done.store(false, Ordering::Release);
        Ok(EventPoller::new(self, checker, callback))
    }

    /// Clean-shutdown path: cancels any active poller, forces Sleep mode
    /// and resets the chip.
    pub async fn destroy(&self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.cancel_event();
        let mut inner = self.inner.lock().await;
        inner.change_mode(LoraMode::Sleep).await?;
        inner.reset().await
    }

    fn claim_direct(&self) -> Result<SlotGuard<'_>, Error<TBUS::Error, TPINERR>> {
        self.op_slot
            .compare_exchange(SLOT_FREE, SLOT_DIRECT, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| SlotGuard(&self.op_slot))
            .map_err(|_| Error::Busy)
    }

    /// Polls the interrupt-sense line until it reads high or the deadline
    /// passes.
    async fn wait_for_interrupt(
        &self,
        timeout: Duration,
    ) -> Result<(), Error<TBUS::Error, TPINERR>> {
        wait_condition(timeout, move || async move {
            let mut inner = self.inner.lock().await;
            inner
                .dio0_pin
                .is_high()
                .map_err(|err| Error::Pin(PinError::Input(err)))
        })
        .await
    }

    async fn arm_rx_poll(&self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let mut inner = self.inner.lock().await;
        inner.change_mode(LoraMode::Idle).await?;
        inner.write_reg(Register::IrqFlags, irq::RX_DONE).await?;
        inner.write_reg(Register::DioMapping1, 0x00).await?;
        inner.change_mode(LoraMode::RxContinuous).await
    }

    async fn arm_tx_poll(&self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let mut inner = self.inner.lock().await;
        inner.change_mode(LoraMode::Idle).await?;
        inner.write_reg(Register::DioMapping1, 0x40).await
    }

    /// One RxDone checker pass: route the RX-done interrupt to DIO0, enter
    /// continuous receive and watch the interrupt line. `false` means "not
    /// yet"; hardware errors are logged and treated the same way.
    pub(crate) async fn poll_rx_event(&self) -> bool {
        if let Err(err) = self.arm_rx_poll().await {
            log::warn!("sx1276::poll_rx_event arming failed: {err:?}");
            return false;
        }
        match self.wait_for_interrupt(EVENT_WAIT).await {
            Ok(()) => true,
            Err(Error::Timeout) => false,
            Err(err) => {
                log::warn!("sx1276::poll_rx_event wait failed: {err:?}");
                false
            }
        }
    }

    /// One TxDone checker pass, clearing the TX-done bit once the interrupt
    /// line reports completion.
    pub(crate) async fn poll_tx_event(&self) -> bool {
        if let Err(err) = self.arm_tx_poll().await {
            log::warn!("sx1276::poll_tx_event arming failed: {err:?}");
            return false;
        }
        match self.wait_for_interrupt(EVENT_WAIT).await {
            Ok(()) => {}
            Err(Error::Timeout) => return false,
            Err(err) => {
                log::warn!("sx1276::poll_tx_event wait failed: {err:?}");
                return false;
            }
        }
        let mut inner = self.inner.lock().await;
        if let Err(err) = inner.write_reg(Register::IrqFlags, irq::TX_DONE).await {
            log::warn!("sx1276::poll_tx_event flag clear failed: {err:?}");
        }
        true
    }
}

// Slot and signal plumbing shared with the event subsystem. Kept free of
// the HAL bounds so `EventPoller`'s `Drop` impl can reach it.
impl<TBUS, TRST, TDIO> Sx1276<TBUS, TRST, TDIO> {
    /// Signals the active event poller to stop. The poller observes the
    /// signal before its next tick; an in-flight hardware wait is not
    /// preempted.
    pub fn cancel_event(&self) {
        self.cancel.signal(());
    }

    pub(crate) fn mark_tx_done(&self) {
        self.tx_done.store(true, Ordering::Release);
    }

    pub(crate) async fn cancelled(&self) {
        self.cancel.wait().await;
    }

    pub(crate) fn release_op_slot(&self) {
        self.op_slot.store(SLOT_FREE, Ordering::Release);
    }
}

impl<TBUS, TRST, TDIO, TPINERR> Inner<TBUS, TRST, TDIO>
where
    TBUS: RegisterBus,
    TRST: OutputPin<Error = TPINERR>,
    TDIO: InputPin<Error = TPINERR>,
    TPINERR: Debug,
{
    async fn read_raw(&mut self, reg: u8) -> Result<u8, Error<TBUS::Error, TPINERR>> {
        self.bus.read(codec::read_mask(reg)).await.map_err(Error::Bus)
    }

    async fn read_reg(&mut self, reg: Register) -> Result<u8, Error<TBUS::Error, TPINERR>> {
        self.read_raw(reg.addr()).await
    }

    async fn write_reg(
        &mut self,
        reg: Register,
        value: u8,
    ) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.bus
            .write(codec::write_mask(reg.addr()), value)
            .await
            .map_err(Error::Bus)
    }

    /// Writes register/value pairs in order, failing fast on the first
    /// error. No partial retry: registers already written stay changed.
    async fn write_many(
        &mut self,
        regs: &[Register],
        values: &[u8],
    ) -> Result<(), Error<TBUS::Error, TPINERR>> {
        if regs.len() != values.len() {
            return Err(Error::LengthMismatch);
        }
        for (&reg, &value) in regs.iter().zip(values) {
            self.write_reg(reg, value).await?;
        }
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.rst_pin
            .set_low()
            .map_err(|err| Error::Pin(PinError::Output(err)))?;
        Timer::after(RESET_HOLD).await;
        self.rst_pin
            .set_high()
            .map_err(|err| Error::Pin(PinError::Output(err)))?;
        Timer::after(RESET_SETTLE).await;
        Ok(())
    }

    async fn change_mode(&mut self, m: LoraMode) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.write_reg(Register::OpMode, codec::mode_bits(m)).await?;
        self.mode = m;
        Ok(())
    }

    /// Applies every configuration field in a fixed order. Each setter
    /// clamps its input, so the stored config ends up reflecting what was
    /// actually programmed.
    async fn configure(&mut self) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let conf = self.conf.clone();
        self.set_tx_power(conf.tx_power).await?;
        self.set_spreading_factor(conf.spreading_factor).await?;
        self.set_bandwidth(conf.bandwidth).await?;
        self.set_coding_rate(conf.coding_rate).await?;
        self.set_preamble_length(conf.preamble_length).await?;
        self.set_sync_word(conf.sync_word).await?;
        self.set_frequency(conf.frequency).await?;
        self.set_header_mode(conf.header).await?;
        self.set_crc(conf.crc_on).await
    }

    async fn set_tx_power(&mut self, power: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let clamped = power.clamp(2, 17);
        if clamped != power {
            log::warn!("sx1276: tx power {power} dBm out of range, using {clamped}");
        }
        self.write_reg(Register::PaConfig, codec::tx_power_bits(clamped))
            .await?;
        self.conf.tx_power = clamped;
        Ok(())
    }

    async fn set_spreading_factor(&mut self, sf: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let clamped = sf.clamp(6, 12);
        if clamped != sf {
            log::warn!("sx1276: spreading factor {sf} out of range, using {clamped}");
        }
        let current = self.read_reg(Register::ModemConfig2).await?;
        let merged = codec::sf_bits(clamped) | (current & 0x0F);
        let (optimize, threshold) = if clamped == 6 {
            (detection::OPTIMIZE_SF6, detection::THRESHOLD_SF6)
        } else {
            (detection::OPTIMIZE_DEFAULT, detection::THRESHOLD_DEFAULT)
        };
        self.write_many(
            &[
                Register::ModemConfig2,
                Register::DetectionOptimize,
                Register::DetectionThreshold,
            ],
            &[merged, optimize, threshold],
        )
        .await?;
        self.conf.spreading_factor = clamped;
        Ok(())
    }

    async fn set_bandwidth(&mut self, bw: u64) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let (step, stored) = codec::bw_step(bw);
        if stored != bw {
            log::warn!("sx1276: bandwidth {bw} Hz quantized to {stored} Hz");
        }
        let current = self.read_reg(Register::ModemConfig1).await?;
        let merged = (current & 0x0F) | codec::bw_bits(step);
        self.write_reg(Register::ModemConfig1, merged).await?;
        self.conf.bandwidth = stored;
        Ok(())
    }

    async fn set_coding_rate(&mut self, denominator: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let clamped = denominator.clamp(5, 8);
        if clamped != denominator {
            log::warn!("sx1276: coding rate 4/{denominator} out of range, using 4/{clamped}");
        }
        let current = self.read_reg(Register::ModemConfig1).await?;
        self.write_reg(
            Register::ModemConfig1,
            codec::coding_rate_bits(clamped - 4, current),
        )
        .await?;
        self.conf.coding_rate = clamped;
        Ok(())
    }

    async fn set_preamble_length(&mut self, length: u16) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let bytes = codec::preamble_bits(length);
        self.write_many(&[Register::PreambleMsb, Register::PreambleLsb], &bytes)
            .await?;
        self.conf.preamble_length = length;
        Ok(())
    }

    async fn set_sync_word(&mut self, sync_word: u8) -> Result<(), Error<TBUS::Error, TPINERR>> {
        self.write_reg(Register::SyncWord, sync_word).await?;
        self.conf.sync_word = sync_word;
        Ok(())
    }

    async fn set_frequency(&mut self, hz: u32) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let bytes = codec::freq_bits(codec::frf_from_hz(hz));
        self.write_many(
            &[Register::FrfMsb, Register::FrfMid, Register::FrfLsb],
            &bytes,
        )
        .await?;
        self.conf.frequency = hz;
        Ok(())
    }

    async fn set_header_mode(&mut self, header: HeaderMode) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let current = self.read_reg(Register::ModemConfig1).await?;
        self.write_reg(Register::ModemConfig1, codec::header_bits(header, current))
            .await?;
        self.conf.header = header;
        Ok(())
    }

    async fn set_crc(&mut self, enable: bool) -> Result<(), Error<TBUS::Error, TPINERR>> {
        let current = self.read_reg(Register::ModemConfig2).await?;
        self.write_reg(Register::ModemConfig2, codec::crc_bits(enable, current))
            .await?;
        self.conf.crc_on = enable;
        Ok(())
    }

    /// Loads the FIFO with a payload and enters transmit mode. The caller
    /// is responsible for waiting on completion.
    async fn start_transmit(&mut self, payload: &[u8]) -> Result<(), Error<TBUS::Error, TPINERR>> {
        debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);
        self.change_mode(LoraMode::Idle).await?;
        self.write_reg(Register::FifoAddrPtr, 0x00).await?;
        for &byte in payload {
            self.write_reg(Register::Fifo, byte).await?;
        }
        self.write_reg(Register::PayloadLength, payload.len() as u8)
            .await?;
        self.change_mode(LoraMode::Tx).await
    }

    async fn receive(&mut self) -> Result<Vec<u8, MAX_PAYLOAD_LEN>, Error<TBUS::Error, TPINERR>> {
        let flags = self.read_reg(Register::IrqFlags).await?;
        match codec::irq_status(flags) {
            IrqStatus::NoPacket => return Err(Error::NoPacketReceived),
            IrqStatus::CrcError => {
                // Clear only the CRC-error bit; best effort on the way out.
                let _ = self
                    .write_reg(Register::IrqFlags, irq::PAYLOAD_CRC_ERROR)
                    .await;
                return Err(Error::PacketDamaged);
            }
            IrqStatus::PacketReady => {}
        }

        self.change_mode(LoraMode::Idle).await?;

        let len = match self.conf.header {
            HeaderMode::Explicit => self.read_reg(Register::RxNbBytes).await?,
            HeaderMode::Implicit => self.read_reg(Register::PayloadLength).await?,
        };
        let current = self.read_reg(Register::FifoRxCurrentAddr).await?;
        self.write_reg(Register::FifoAddrPtr, current).await?;

        let mut data = Vec::new();
        for _ in 0..len {
            let _ = data.push(self.read_reg(Register::Fifo).await?);
        }
        Ok(data)
    }
}
