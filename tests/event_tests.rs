//! Event subsystem scenarios: registration, polling, cancellation.

mod mock;

use core::cell::Cell;
use std::rc::Rc;

use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use mock::{BusState, MockBus, MockPin};
use sx1276_async::conf::{Config, LoraMode};
use sx1276_async::event::Event;
use sx1276_async::{Error, Sx1276};

fn radio_with_dio(
    state: &std::rc::Rc<core::cell::RefCell<BusState>>,
    dio: MockPin,
) -> Sx1276<MockBus, MockPin, MockPin> {
    Sx1276::new(
        MockBus(state.clone()),
        MockPin::new(true),
        dio,
        Config::default(),
    )
}

#[test]
fn listen_rejects_unpollable_events() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(false));

        assert!(matches!(
            radio.listen(Event::CadDone, || {}).map(drop),
            Err(Error::UnknownEvent)
        ));
        assert!(matches!(
            radio.listen(Event::FhssChangeChannel, || {}).map(drop),
            Err(Error::UnknownEvent)
        ));
        // A failed registration must not claim the operation slot.
        assert!(radio.listen(Event::RxDone, || {}).is_ok());
    });
}

#[test]
fn second_registration_is_rejected_while_poller_alive() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(false));

        let poller = radio.listen(Event::RxDone, || {}).unwrap();
        assert!(matches!(
            radio.listen(Event::TxDone, || {}).map(drop),
            Err(Error::Busy)
        ));

        drop(poller);
        assert!(radio.listen(Event::TxDone, || {}).is_ok());
    });
}

#[test]
fn direct_send_is_rejected_while_poller_alive() {
    block_on(async {
        let state = BusState::with_version(0x12);
        state.borrow_mut().regs[0x12] = 0x08;
        let radio = radio_with_dio(&state, MockPin::new(false));

        let poller = radio.listen(Event::RxDone, || {}).unwrap();
        assert!(matches!(
            radio.send_packet(b"x", Duration::from_millis(10)).await,
            Err(Error::Busy)
        ));

        drop(poller);
        radio
            .send_packet(b"x", Duration::from_millis(100))
            .await
            .unwrap();
    });
}

#[test]
fn rx_poller_fires_callback_and_enters_rx_continuous() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(true));

        let fired = Rc::new(Cell::new(0u32));
        let counter = fired.clone();
        let mut poller = radio
            .listen(Event::RxDone, move || counter.set(counter.get() + 1))
            .unwrap();

        select(poller.run(), Timer::after(Duration::from_millis(20))).await;

        assert!(fired.get() >= 1);
        let state = state.borrow();
        assert!(state.wrote(0x01, 0x81)); // Idle while arming
        assert!(state.wrote(0x12, 0x40)); // RX-done bit cleared
        assert!(state.wrote(0x40, 0x00)); // DIO0 routed to RxDone
        assert!(state.wrote(0x01, 0x85)); // continuous receive entered
    });
}

#[test]
fn rx_poller_stays_quiet_without_interrupt() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(false));

        let fired = Rc::new(Cell::new(0u32));
        let counter = fired.clone();
        let mut poller = radio
            .listen(Event::RxDone, move || counter.set(counter.get() + 1))
            .unwrap();

        // The checker's interrupt wait is still pending when we stop.
        select(poller.run(), Timer::after(Duration::from_millis(30))).await;
        assert_eq!(fired.get(), 0);
    });
}

#[test]
fn cancellation_stops_the_poller_before_its_next_tick() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(false));

        let fired = Rc::new(Cell::new(0u32));
        let counter = fired.clone();
        let mut poller = radio
            .listen(Event::RxDone, move || counter.set(counter.get() + 1))
            .unwrap();

        radio.cancel_event();
        match select(poller.run(), Timer::after(Duration::from_secs(2))).await {
            Either::First(()) => {}
            Either::Second(()) => panic!("poller ignored cancellation"),
        }
        assert_eq!(fired.get(), 0);
    });
}

#[test]
fn tx_poller_handshakes_with_send_packet_with_event() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(true));

        let fired = Rc::new(Cell::new(false));
        let done = fired.clone();
        let mut poller = radio
            .listen(Event::TxDone, move || done.set(true))
            .unwrap();

        let sender = async {
            radio.send_packet_with_event(b"hi").await.unwrap();
            radio.cancel_event();
        };
        join(poller.run(), sender).await;

        assert!(fired.get());
        let state = state.borrow();
        assert!(state.wrote(0x40, 0x40)); // DIO0 routed to TxDone
        assert!(state.wrote(0x12, 0x08)); // TX-done bit cleared by checker
        assert!(state.wrote(0x00, b'h'));
        assert!(state.wrote(0x00, b'i'));
    });
}

#[test]
fn send_packet_with_event_times_out_without_a_poller() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(false));
        let err = radio.send_packet_with_event(b"x").await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    });
}

#[test]
fn destroy_cancels_poller_and_sleeps() {
    block_on(async {
        let state = BusState::with_version(0x12);
        let radio = radio_with_dio(&state, MockPin::new(false));

        let mut poller = radio.listen(Event::RxDone, || {}).unwrap();
        let teardown = async {
            radio.destroy().await.unwrap();
        };
        match select(
            join(poller.run(), teardown),
            Timer::after(Duration::from_secs(5)),
        )
        .await
        {
            Either::First(_) => {}
            Either::Second(()) => panic!("destroy did not stop the poller"),
        }
        assert_eq!(radio.mode().await, LoraMode::Sleep);
        assert!(state.borrow().wrote(0x01, 0x80));
    });
}
