/*!
 * Monitoring
 * Structured tracing for gate activity
 */

mod tracer;

pub use tracer::{init_tracing, CriticalSectionSpan};
