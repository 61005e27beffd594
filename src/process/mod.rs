/*!
 * Process Module
 * Process table, thread control blocks and the join/detach/exit lifecycle
 */

pub(crate) mod lifecycle;
pub mod pcb;
pub mod table;
pub mod thread;
pub mod types;

// Re-export public API
pub use pcb::ProcessControlBlock;
pub use table::ProcessTable;
pub use thread::{ThreadControlBlock, ThreadInfo, ThreadStart, ThreadTable};
pub use types::{
    ProcessError, ProcessInfo, ProcessResult, ProcessState, Task, ThreadError, ThreadResult,
};
