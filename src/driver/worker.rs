/*!
 * Reader and Writer Workers
 *
 * Each worker performs one begin/end cycle per call to `cycle`. The loop
 * around it lives in `run_worker`, owned by the supervisor; the gate itself
 * never owns a thread.
 */

use super::role::WorkerStatus;
use super::workload::{Document, Pacing};
use crate::core::errors::{DriverError, DriverResult};
use crate::core::sync::GatedCell;
use crate::core::types::{CallerId, Role};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Sleep granularity while pausing, so shutdown is noticed promptly
const PAUSE_SLICE: Duration = Duration::from_millis(25);

/// One role's begin/end cycle
pub trait RoleTask: Send {
    fn status(&self) -> &Arc<WorkerStatus>;

    /// Perform one full cycle: wait for admission, work, release
    fn cycle(&mut self) -> DriverResult<()>;

    /// Pause to take before the next cycle
    fn pause(&mut self) -> Duration;
}

/// Reader worker: checks the document is never observed half-written
pub struct ReaderTask {
    caller: CallerId,
    document: Arc<GatedCell<Document>>,
    pacing: Pacing,
    status: Arc<WorkerStatus>,
}

impl ReaderTask {
    pub fn new(index: usize, document: Arc<GatedCell<Document>>, pacing: Pacing) -> Self {
        Self {
            caller: CallerId::from(index),
            document,
            pacing,
            status: Arc::new(WorkerStatus::new(Role::Reader, index)),
        }
    }
}

impl RoleTask for ReaderTask {
    fn status(&self) -> &Arc<WorkerStatus> {
        &self.status
    }

    fn cycle(&mut self) -> DriverResult<()> {
        self.status.advance();
        let document = self.document.read(self.caller);
        self.status.advance();

        info!("Reader {} is reading.", self.status.index());
        thread::sleep(self.pacing.work());

        let verdict = document.verify();
        drop(document);
        self.status.advance();

        match verdict {
            Ok(version) => {
                debug!(reader = self.status.index(), version, "read consistent document");
                Ok(())
            }
            Err(detail) => Err(DriverError::InconsistentRead {
                reader: self.status.index(),
                detail,
            }),
        }
    }

    fn pause(&mut self) -> Duration {
        self.pacing.pause()
    }
}

/// Writer worker: publishes a new document revision per cycle
pub struct WriterTask {
    caller: CallerId,
    document: Arc<GatedCell<Document>>,
    pacing: Pacing,
    status: Arc<WorkerStatus>,
}

impl WriterTask {
    pub fn new(index: usize, document: Arc<GatedCell<Document>>, pacing: Pacing) -> Self {
        Self {
            caller: CallerId::from(index),
            document,
            pacing,
            status: Arc::new(WorkerStatus::new(Role::Writer, index)),
        }
    }
}

impl RoleTask for WriterTask {
    fn status(&self) -> &Arc<WorkerStatus> {
        &self.status
    }

    fn cycle(&mut self) -> DriverResult<()> {
        self.status.advance();
        let mut document = self.document.write(self.caller);
        self.status.advance();

        info!("Writer {} is writing.", self.status.index());
        let version = document.begin_revision();
        thread::sleep(self.pacing.work());
        document.finish_revision();

        drop(document);
        self.status.advance();
        debug!(writer = self.status.index(), version, "published revision");
        Ok(())
    }

    fn pause(&mut self) -> Duration {
        self.pacing.pause()
    }
}

/// Drive `task` until `shutdown` is set or a cycle fails
///
/// A failing cycle raises `shutdown` so the other workers wind down too.
pub fn run_worker<T: RoleTask>(mut task: T, shutdown: Arc<AtomicBool>) -> DriverResult<()> {
    let status = task.status().clone();
    debug!(worker = %status, "worker started");

    while !shutdown.load(Ordering::Acquire) {
        if let Err(err) = task.cycle() {
            error!(worker = %status, error = %err, "worker cycle failed");
            shutdown.store(true, Ordering::Release);
            return Err(err);
        }
        pause_unless_shutdown(task.pause(), &shutdown);
    }

    debug!(worker = %status, cycles = status.cycles(), "worker stopped");
    Ok(())
}

fn pause_unless_shutdown(pause: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + pause;
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep(PAUSE_SLICE.min(deadline - now));
    }
}
