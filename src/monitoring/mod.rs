/*!
 * Monitoring
 * Tracing setup and per-syscall spans
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, SyscallSpan};
