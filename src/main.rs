/*!
 * rwgate - Reader-Writer Gate Demo
 *
 * Runs readers and writers against one shared document:
 * - Readers share access and check they never see a half-written revision
 * - Writers get exclusive access and publish revisions
 * - Writer starvation under reader load is reported as it happens
 *
 * Configured through RWGATE_* environment variables; stops on Ctrl-C or
 * after RWGATE_RUN_SECS.
 */

use miette::IntoDiagnostic;
use tracing::info;

use rw_gate::{init_tracing, DriverConfig, Supervisor};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize structured tracing
    init_tracing();

    let config = DriverConfig::from_env()?;
    info!(
        readers = config.readers,
        writers = config.writers,
        work_min_ms = config.work_min.as_millis() as u64,
        work_max_ms = config.work_max.as_millis() as u64,
        "rwgate starting"
    );
    match config.run_for {
        Some(limit) => info!(run_secs = limit.as_secs(), "running for a fixed time"),
        None => info!("Press Ctrl+C to exit"),
    }

    let report = Supervisor::new(config)?.run().await?;

    let summary = serde_json::to_string_pretty(&report).into_diagnostic()?;
    info!(
        reads = report.total_reads(),
        writes = report.total_writes(),
        longest_writer_wait_ms = report.longest_writer_wait_ms,
        "run finished"
    );
    println!("{summary}");
    Ok(())
}
