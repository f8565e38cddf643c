/*!
 * Demo Driver
 *
 * A fixed set of reader and writer workers contending for one gated
 * document. Used by the `rwgate` binary and the end-to-end tests.
 */

mod config;
mod role;
mod supervisor;
mod worker;
mod workload;

pub use config::DriverConfig;
pub use role::{WorkerState, WorkerStatus};
pub use supervisor::{RunReport, ShutdownHandle, Supervisor};
pub use worker::{run_worker, ReaderTask, RoleTask, WriterTask};
pub use workload::{Document, Pacing};
