/*!
 * Worker Supervisor
 *
 * Spawns reader and writer workers on blocking tasks of the tokio runtime,
 * watches them for starvation, and stops them cooperatively.
 */

use super::config::DriverConfig;
use super::role::{WorkerState, WorkerStatus};
use super::worker::{run_worker, ReaderTask, RoleTask, WriterTask};
use super::workload::{Document, Pacing};
use crate::core::errors::{DriverError, DriverResult};
use crate::core::sync::{GateConfig, GateStatsSnapshot, GatedCell};
use crate::core::types::{CallerId, Role};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How often the supervisor checks on its workers
const MONITOR_INTERVAL: Duration = Duration::from_millis(250);

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub elapsed_ms: u64,
    pub reader_cycles: Vec<u64>,
    pub writer_cycles: Vec<u64>,
    pub final_version: u64,
    /// Longest time any writer was seen waiting for exclusive access
    pub longest_writer_wait_ms: u64,
    pub gate: GateStatsSnapshot,
}

impl RunReport {
    pub fn total_reads(&self) -> u64 {
        self.reader_cycles.iter().sum()
    }

    pub fn total_writes(&self) -> u64 {
        self.writer_cycles.iter().sum()
    }
}

/// Cooperative stop signal shared with every worker
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns the shared document and the worker lifecycle
pub struct Supervisor {
    config: DriverConfig,
    document: Arc<GatedCell<Document>>,
    shutdown: ShutdownHandle,
}

impl Supervisor {
    pub fn new(config: DriverConfig) -> DriverResult<Self> {
        config.validate()?;
        let document = Arc::new(GatedCell::with_config(
            Document::new(),
            GateConfig::named("document").with_slow_hold_threshold(config.work_max * 2),
        ));

        Ok(Self {
            config,
            document,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Handle for stopping the run from elsewhere
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run all workers until `run_for` elapses, Ctrl-C, a shutdown trigger,
    /// or a worker failure
    pub async fn run(self) -> DriverResult<RunReport> {
        let started = Instant::now();
        info!(
            readers = self.config.readers,
            writers = self.config.writers,
            run_for_ms = self.config.run_for.map(|d| d.as_millis() as u64),
            "starting workers"
        );

        let mut workers = Vec::with_capacity(self.config.readers + self.config.writers);
        for index in 0..self.config.readers {
            let pacing = Pacing::from_config(&self.config, index as u64);
            workers.push(self.spawn(ReaderTask::new(index, self.document.clone(), pacing)));
        }
        for index in 0..self.config.writers {
            let stream = (self.config.readers + index) as u64;
            let pacing = Pacing::from_config(&self.config, stream);
            workers.push(self.spawn(WriterTask::new(index, self.document.clone(), pacing)));
        }

        let longest_writer_wait = self.monitor(&workers, started).await;
        self.shutdown.trigger();
        info!("stopping workers");

        let statuses: Vec<_> = workers.iter().map(|(status, _)| status.clone()).collect();

        let mut first_error = None;
        for (status, handle) in workers {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(join_err) if join_err.is_panic() => Err(DriverError::WorkerPanicked {
                    role: status.role(),
                    index: status.index(),
                    message: panic_message(join_err.into_panic()),
                }),
                Err(join_err) => Err(DriverError::Join(join_err.to_string())),
            };
            if let Err(err) = outcome {
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let report = self.report(started, longest_writer_wait, &statuses);
        info!(
            reads = report.total_reads(),
            writes = report.total_writes(),
            final_version = report.final_version,
            "all workers stopped"
        );
        Ok(report)
    }

    fn spawn<T>(&self, task: T) -> (Arc<WorkerStatus>, JoinHandle<DriverResult<()>>)
    where
        T: RoleTask + 'static,
    {
        let status = task.status().clone();
        let flag = self.shutdown.0.clone();
        let handle = tokio::task::spawn_blocking(move || run_worker(task, flag));
        (status, handle)
    }

    /// Wait for the stop condition while reporting starving writers
    ///
    /// Returns the longest writer wait observed.
    async fn monitor(
        &self,
        workers: &[(Arc<WorkerStatus>, JoinHandle<DriverResult<()>>)],
        started: Instant,
    ) -> Duration {
        let mut ticker = tokio::time::interval(MONITOR_INTERVAL);
        let mut longest_writer_wait = Duration::ZERO;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    match result {
                        Ok(()) => info!("received Ctrl-C"),
                        Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
                    }
                    break;
                }
                _ = ticker.tick() => {
                    for (status, _) in workers {
                        if status.role() != Role::Writer {
                            continue;
                        }
                        let (state, since) = status.state_for();
                        if state != WorkerState::Waiting {
                            continue;
                        }
                        longest_writer_wait = longest_writer_wait.max(since);
                        if since >= self.config.starvation_warn {
                            warn!(
                                worker = %status,
                                waiting_ms = since.as_millis() as u64,
                                active_readers = self.document.gate().active_readers(),
                                "writer starving: readers keep the write permit"
                            );
                        }
                    }

                    if self.shutdown.is_triggered() {
                        break;
                    }
                    if let Some(limit) = self.config.run_for {
                        if started.elapsed() >= limit {
                            break;
                        }
                    }
                }
            }
        }

        longest_writer_wait
    }

    fn report(
        &self,
        started: Instant,
        longest_writer_wait: Duration,
        statuses: &[Arc<WorkerStatus>],
    ) -> RunReport {
        let cycles_of = |role: Role| -> Vec<u64> {
            statuses
                .iter()
                .filter(|status| status.role() == role)
                .map(|status| status.cycles())
                .collect()
        };

        // Snapshot before our own read shows up in the counters
        let gate = self.document.gate().stats();
        // Workers are gone; an uncontended read is immediate
        let final_version = self
            .document
            .with_read(CallerId::ANONYMOUS, |doc| doc.version());
        RunReport {
            elapsed_ms: started.elapsed().as_millis() as u64,
            reader_cycles: cycles_of(Role::Reader),
            writer_cycles: cycles_of(Role::Writer),
            final_version,
            longest_writer_wait_ms: longest_writer_wait.as_millis() as u64,
            gate,
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
