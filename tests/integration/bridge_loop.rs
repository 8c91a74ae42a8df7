//! Bridge startup checks and poll loop timing, against the mock instrument.
//!
//! Loop tests run on paused tokio time: the bridge polls at t=0, 2 and 4
//! seconds and is cancelled at t=5, so every run sees three iterations.

use std::time::Duration;

use potlog::bridge::mock::RecordingSink;
use potlog::bridge::{run_bridge, Bridge, BridgeExit, BridgeState};
use potlog::config::DEFAULT_IDENTITY;
use potlog::device::mock::{MockInstrument, MockReply, Operation};
use potlog::device::{Instrument, IDENTITY_QUERY, MEASURE_QUERY};
use potlog::error::PotError;
use tokio_util::sync::CancellationToken;

use crate::common::init_test_logging;

const INTERVAL: Duration = Duration::from_secs(2);

fn cancel_after(delay: Duration) -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        token.cancel();
    });
    cancel
}

#[tokio::test(start_paused = true)]
async fn polls_every_interval_until_cancelled() {
    init_test_logging();
    let instrument =
        MockInstrument::sensor_kit().with_reply(MEASURE_QUERY, MockReply::line("512"));
    let mut bridge = Bridge::new(instrument, RecordingSink::new(), DEFAULT_IDENTITY, INTERVAL);

    let cancel = cancel_after(Duration::from_secs(5));
    let exit = run_bridge(&mut bridge, &cancel).await.unwrap();

    assert_eq!(
        exit,
        BridgeExit {
            iterations: 3,
            delivered: 3,
            skipped: 0
        }
    );
    assert_eq!(bridge.sink().attempts(), vec![512, 512, 512]);
    assert_eq!(bridge.state(), BridgeState::Terminated);
    assert!(!bridge.instrument().is_connected());
}

#[tokio::test(start_paused = true)]
async fn wrong_identity_never_measures() {
    let instrument = MockInstrument::new("/dev/mock0")
        .with_identity("SomeOtherDevice,v2.0,SN:XYZ")
        .with_reply(MEASURE_QUERY, MockReply::line("512"));
    let mut bridge = Bridge::new(instrument, RecordingSink::new(), DEFAULT_IDENTITY, INTERVAL);

    let cancel = cancel_after(Duration::from_secs(5));
    match run_bridge(&mut bridge, &cancel).await {
        Err(PotError::WrongInstrument { expected, actual }) => {
            assert_eq!(expected, DEFAULT_IDENTITY);
            assert_eq!(actual.as_deref(), Some("SomeOtherDevice,v2.0,SN:XYZ"));
        }
        other => panic!("expected WrongInstrument, got {other:?}"),
    }

    bridge.instrument().assert_never_queried(MEASURE_QUERY);
    assert_eq!(bridge.sink().attempt_count(), 0);
    assert_eq!(
        bridge.instrument().operations(),
        &[
            Operation::Connect,
            Operation::Query {
                command: IDENTITY_QUERY.to_string()
            },
            Operation::Disconnect,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unreachable_port_terminates_before_any_query() {
    let instrument = MockInstrument::sensor_kit().failing_connect("No such file or directory");
    let mut bridge = Bridge::new(instrument, RecordingSink::new(), DEFAULT_IDENTITY, INTERVAL);

    let cancel = CancellationToken::new();
    let err = run_bridge(&mut bridge, &cancel).await.unwrap_err();

    assert!(matches!(err, PotError::DeviceOpenFailed { .. }));
    assert!(err.is_user_recoverable());
    assert!(bridge.instrument().queries().is_empty());
    assert_eq!(bridge.state(), BridgeState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn non_integer_reading_is_skipped_and_loop_continues() {
    let instrument = MockInstrument::sensor_kit()
        .with_queued(MEASURE_QUERY, [MockReply::line("abc"), MockReply::line("12")])
        .with_reply(MEASURE_QUERY, MockReply::line("40"));
    let mut bridge = Bridge::new(instrument, RecordingSink::new(), DEFAULT_IDENTITY, INTERVAL);

    let cancel = cancel_after(Duration::from_secs(5));
    let exit = run_bridge(&mut bridge, &cancel).await.unwrap();

    assert_eq!(exit.iterations, 3);
    assert_eq!(exit.skipped, 1);
    assert_eq!(bridge.sink().attempts(), vec![12, 40]);
}

#[tokio::test(start_paused = true)]
async fn silent_and_failing_instrument_keep_polling() {
    let instrument = MockInstrument::sensor_kit().with_queued(
        MEASURE_QUERY,
        [
            MockReply::Silent,
            MockReply::Fail("device reports not ready".into()),
            MockReply::line("  256\r"),
        ],
    );
    let mut bridge = Bridge::new(instrument, RecordingSink::new(), DEFAULT_IDENTITY, INTERVAL);

    let cancel = cancel_after(Duration::from_secs(5));
    let exit = run_bridge(&mut bridge, &cancel).await.unwrap();

    assert_eq!(exit.iterations, 3);
    assert_eq!(exit.delivered, 1);
    assert_eq!(bridge.sink().attempts(), vec![256]);
    assert_eq!(bridge.instrument().query_count(MEASURE_QUERY), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_is_dropped_not_retried() {
    let instrument =
        MockInstrument::sensor_kit().with_reply(MEASURE_QUERY, MockReply::line("99"));
    let mut bridge = Bridge::new(
        instrument,
        RecordingSink::failing("connection refused"),
        DEFAULT_IDENTITY,
        INTERVAL,
    );

    let cancel = cancel_after(Duration::from_secs(5));
    let exit = run_bridge(&mut bridge, &cancel).await.unwrap();

    assert_eq!(exit.iterations, 3);
    assert_eq!(exit.delivered, 0);
    // One attempt per reading
    assert_eq!(bridge.sink().attempt_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancellation_cuts_the_sleep_short() {
    let instrument =
        MockInstrument::sensor_kit().with_reply(MEASURE_QUERY, MockReply::line("1"));
    let mut bridge = Bridge::new(
        instrument,
        RecordingSink::new(),
        DEFAULT_IDENTITY,
        Duration::from_secs(3600),
    );

    let started = tokio::time::Instant::now();
    let cancel = cancel_after(Duration::from_secs(1));
    let exit = run_bridge(&mut bridge, &cancel).await.unwrap();

    assert_eq!(exit.iterations, 1);
    assert!(started.elapsed() < Duration::from_secs(2));
    bridge.instrument().assert_contains(&Operation::Disconnect);
}
