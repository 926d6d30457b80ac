mod common;

use common::memory_router;
use rask_log_shipper::app::{App, ConfigOverrides, ServiceError, ShipperService};
use rask_log_shipper::domain::{Destination, LogEvent, LogLevel};
use rask_log_shipper::sink::MemorySink;
use std::sync::Arc;
use std::time::Duration;

fn info(message: &str) -> LogEvent {
    LogEvent::new(LogLevel::Info, message)
}

#[tokio::test]
async fn test_flush_is_ordered_against_surrounding_logs() {
    let sink = MemorySink::new();
    let shipper = ShipperService::start(memory_router(&sink, 8));

    shipper.log(info("a")).await.unwrap();
    shipper.log(info("b")).await.unwrap();
    let flushing = shipper.clone();
    let flush = tokio::spawn(async move { flushing.flush().await });
    // Flush from another handle; "c" is logged only once it has completed.
    flush.await.unwrap().unwrap();
    shipper.log(info("c")).await.unwrap();
    shipper.flush().await.unwrap();

    assert_eq!(sink.sent_to(Destination::System), vec!["a\nb", "c"]);
    shipper.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_commands_from_one_handle_apply_in_order() {
    let sink = MemorySink::new();
    let shipper = ShipperService::start(memory_router(&sink, 8));

    shipper.log(info("buffered")).await.unwrap();
    shipper.set_verbose(true).await.unwrap();
    shipper.log(info("direct")).await.unwrap();
    shipper.set_verbose(false).await.unwrap();
    shipper.log(info("buffered again")).await.unwrap();
    shipper.flush().await.unwrap();

    assert_eq!(
        sink.sent_to(Destination::System),
        vec!["direct", "buffered\nbuffered again"]
    );
    shipper.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reconfigure_sink_through_handle() {
    let first = MemorySink::new();
    let second = MemorySink::new();
    let shipper = ShipperService::start(memory_router(&first, 1));

    shipper.log(info("old")).await.unwrap();
    shipper
        .reconfigure(ConfigOverrides::new().with_sink(Arc::new(second.clone())))
        .await
        .unwrap();
    shipper.log(info("new")).await.unwrap();
    shipper.flush().await.unwrap();

    assert_eq!(first.sent_to(Destination::System), vec!["old"]);
    assert_eq!(second.sent_to(Destination::System), vec!["new"]);
    shipper.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dropping_every_handle_flushes() {
    let sink = MemorySink::new();
    let shipper = ShipperService::start(memory_router(&sink, 8));
    let other = shipper.clone();

    shipper.log(info("left behind")).await.unwrap();
    drop(shipper);
    drop(other);

    tokio::time::timeout(Duration::from_secs(5), async {
        while sink.is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("worker flushed after the last handle was dropped");
    assert_eq!(sink.sent_to(Destination::System), vec!["left behind"]);
}

#[tokio::test]
async fn test_stopped_service_rejects_commands() {
    let sink = MemorySink::new();
    let shipper = ShipperService::start(memory_router(&sink, 8));
    shipper.shutdown().await.unwrap();

    assert_eq!(shipper.flush().await, Err(ServiceError::Stopped));
    assert_eq!(shipper.toggle_verbose().await, Err(ServiceError::Stopped));
    // A second shutdown is harmless.
    assert_eq!(shipper.shutdown().await, Ok(()));
}

#[tokio::test]
async fn test_app_reads_lines_and_control_commands() {
    let sink = MemorySink::new();
    let shipper = ShipperService::start(memory_router(&sink, 8));
    let stats = shipper.clone();
    let app = App::new(shipper);

    let input: &[u8] = b"first\nsecond\n!flush\n!verbose\nthird\n[health_check] ok\nfourth\n";
    app.run_with(input).await.unwrap();

    assert_eq!(
        sink.sent_to(Destination::System),
        vec!["first\nsecond", "third", "fourth"]
    );
    assert_eq!(sink.sent_to(Destination::Application), vec!["[health_check] ok"]);
    let snapshot = stats.stats();
    assert_eq!(snapshot.received, 5);
    assert_eq!(snapshot.immediate_sent, 1);
    assert_eq!(snapshot.verbose_sent, 2);
    assert!(!stats.is_running());
}

#[tokio::test]
async fn test_app_replaces_invalid_utf8_and_keeps_reading() {
    let sink = MemorySink::new();
    let shipper = ShipperService::start(memory_router(&sink, 10));
    let stats = shipper.clone();
    let app = App::new(shipper);

    let input: &[u8] = b"one\n\xff\xfe\ntwo\r\n!flush\n";
    app.run_with(input).await.unwrap();

    assert_eq!(
        sink.sent_to(Destination::System),
        vec!["one\n\u{FFFD}\u{FFFD}\ntwo"]
    );
    assert_eq!(stats.stats().received, 3);
}

#[tokio::test]
async fn test_app_flushes_pending_lines_at_eof() {
    let sink = MemorySink::new();
    let app = App::new(ShipperService::start(memory_router(&sink, 8)));

    let input: &[u8] = b"one\ntwo";
    app.run_with(input).await.unwrap();

    assert_eq!(sink.sent_to(Destination::System), vec!["one\ntwo"]);
}
