/*!
 * Socket Module
 * Port-addressed stream sockets: listeners queue connection requests and
 * connected peers talk over a pair of pipes
 */

pub(crate) mod ops;
pub mod request;
pub mod socket;
pub mod table;
pub mod types;

pub(crate) use ops::close;

// Re-export public API
pub use request::{ConnectionRequest, RequestState};
pub use socket::{SocketControlBlock, SocketKind};
pub use table::{PortTable, SocketTable};
pub use types::{ShutdownMode, SocketError, SocketResult, SocketState, SocketStats};
