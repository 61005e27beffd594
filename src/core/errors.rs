/*!
 * Error Taxonomy
 * Every subsystem error classifies itself into one of four kinds
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a failed system call went wrong
///
/// No kind is retried by the kernel; all of them surface synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad descriptor, port or thread id; no state was touched
    InvalidArgument,
    /// Operation not valid for the current socket/thread/process state
    StateConflict,
    /// The other half of a pipe or socket went away, or a wait ran out
    PeerGone,
    /// A bounded table is full
    ResourceExhausted,
}

impl ErrorKind {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::StateConflict => "state_conflict",
            Self::PeerGone => "peer_gone",
            Self::ResourceExhausted => "resource_exhausted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
