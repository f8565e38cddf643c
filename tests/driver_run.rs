/*!
 * Demo Driver Integration Tests
 *
 * Short supervised runs of the reader/writer workers.
 */

use pretty_assertions::assert_eq;
use rw_gate::driver::{DriverConfig, Supervisor};
use rw_gate::DriverError;
use std::time::{Duration, Instant};

fn quick_config(readers: usize, writers: usize) -> DriverConfig {
    DriverConfig {
        readers,
        writers,
        seed: Some(7),
        ..DriverConfig::quick()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timed_run_reports_consistent_totals() {
    let supervisor = Supervisor::new(quick_config(2, 2)).unwrap();
    let report = supervisor.run().await.unwrap();

    assert_eq!(report.reader_cycles.len(), 2);
    assert_eq!(report.writer_cycles.len(), 2);
    assert!(report.total_reads() + report.total_writes() > 0);

    // Every completed writer cycle published exactly one revision
    assert_eq!(report.final_version, report.total_writes());
    assert_eq!(report.gate.writes_admitted, report.total_writes());
    assert_eq!(report.gate.reads_admitted, report.total_reads());
    assert!(report.elapsed_ms >= 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_writers_only_run() {
    let supervisor = Supervisor::new(quick_config(0, 3)).unwrap();
    let report = supervisor.run().await.unwrap();

    assert!(report.reader_cycles.is_empty());
    assert_eq!(report.total_reads(), 0);
    assert_eq!(report.gate.reader_group_acquisitions, 0);
    assert_eq!(report.final_version, report.total_writes());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_handle_stops_open_ended_run() {
    let config = DriverConfig {
        run_for: None,
        ..quick_config(3, 1)
    };
    let supervisor = Supervisor::new(config).unwrap();
    let shutdown = supervisor.shutdown_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.trigger();
    });

    let started = Instant::now();
    let report = supervisor.run().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.final_version, report.total_writes());
}

#[test]
fn test_invalid_config_rejected() {
    let config = DriverConfig {
        work_min: Duration::from_millis(50),
        work_max: Duration::from_millis(10),
        ..DriverConfig::quick()
    };
    assert!(matches!(
        Supervisor::new(config),
        Err(DriverError::InvalidConfig(_))
    ));
}

#[test]
fn test_report_serializes() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let report = runtime
        .block_on(Supervisor::new(quick_config(1, 1)).unwrap().run())
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["final_version"], report.final_version);
    assert_eq!(json["gate"]["writes_admitted"], report.gate.writes_admitted);
}
