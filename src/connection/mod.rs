//! Database target management and hot-swap switching.
//!
//! Provides thread-safe connection state with support for switching
//! between the `local` and `cloud` targets at runtime.

mod state;
mod target;

pub use state::{ConnectionError, ConnectionManager, ConnectionStatus, SwitchLogEntry};
pub use target::{Target, UnknownTarget};
