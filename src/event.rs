//! Background event notification.
//!
//! The runtime gives the driver no hardware interrupt callback, so event
//! delivery is built on a polling task: [`Sx1276::listen`] hands out an
//! [`EventPoller`] whose [`run`](EventPoller::run) future ticks once per
//! millisecond, asks the chip whether the event has happened and fires the
//! registered callback when it has. Cancellation is cooperative: the poller
//! checks the driver's cancellation signal once per tick.

use core::fmt::Debug;

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};
use embedded_hal::digital::{InputPin, OutputPin};

use crate::bus::RegisterBus;
use crate::Sx1276;

/// Interval between event checker passes.
const POLL_TICK: Duration = Duration::from_millis(1);

/// Chip conditions a callback can be registered for.
///
/// Only [`Event::RxDone`] and [`Event::TxDone`] are currently pollable;
/// registering one of the other DIO0 events fails with
/// [`Error::UnknownEvent`](crate::Error::UnknownEvent).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A packet has been received.
    RxDone,
    /// A transmission has completed.
    TxDone,
    /// Channel-activity detection finished (not pollable).
    CadDone,
    /// Frequency-hopping channel change (not pollable).
    FhssChangeChannel,
}

/// The checker an [`EventPoller`] runs each tick. Closed subset of
/// [`Event`], so the poller body never has to handle unsupported kinds.
#[derive(Copy, Clone)]
pub(crate) enum Checker {
    RxDone,
    TxDone,
}

/// A registered event poller.
///
/// Created by [`Sx1276::listen`]; does nothing until [`run`](Self::run) is
/// polled. Dropping the poller releases the driver's operation slot so a
/// new registration or a direct packet operation can proceed.
pub struct EventPoller<'a, TBUS, TRST, TDIO, F> {
    radio: &'a Sx1276<TBUS, TRST, TDIO>,
    checker: Checker,
    callback: F,
}

impl<'a, TBUS, TRST, TDIO, F> EventPoller<'a, TBUS, TRST, TDIO, F> {
    pub(crate) fn new(radio: &'a Sx1276<TBUS, TRST, TDIO>, checker: Checker, callback: F) -> Self {
        Self {
            radio,
            checker,
            callback,
        }
    }
}

impl<TBUS, TRST, TDIO, TPINERR, F> EventPoller<'_, TBUS, TRST, TDIO, F>
where
    TBUS: RegisterBus,
    TRST: OutputPin<Error = TPINERR>,
    TDIO: InputPin<Error = TPINERR>,
    TPINERR: Debug,
    F: FnMut(),
{
    /// Drives the poller until [`Sx1276::cancel_event`] is called.
    ///
    /// Each tick runs the event checker; on success the callback fires and
    /// polling continues. A checker timeout simply means "not yet" and is
    /// not an error. The TxDone checker additionally sets the driver's
    /// cross-task done flag consumed by
    /// [`Sx1276::send_packet_with_event`].
    pub async fn run(&mut self) {
        let mut ticker = Ticker::every(POLL_TICK);
        loop {
            if let Either::First(()) = select(self.radio.cancelled(), ticker.next()).await {
                log::trace!("sx1276::event poller cancelled");
                return;
            }
            let fired = match self.checker {
                Checker::RxDone => self.radio.poll_rx_event().await,
                Checker::TxDone => self.radio.poll_tx_event().await,
            };
            if fired {
                if let Checker::TxDone = self.checker {
                    self.radio.mark_tx_done();
                }
                (self.callback)();
            }
        }
    }
}

impl<TBUS, TRST, TDIO, F> Drop for EventPoller<'_, TBUS, TRST, TDIO, F> {
    fn drop(&mut self) {
        self.radio.release_op_slot();
    }
}
