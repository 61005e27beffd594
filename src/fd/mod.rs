/*!
 * Descriptor Module
 * Reference-counted file control blocks and per-process file id tables
 */

pub(crate) mod ops;
pub mod table;
pub mod types;

pub use table::{FidTable, FileControlBlock, FileTable};
pub use types::{FdError, FdResult, Stream};
