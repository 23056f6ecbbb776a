//! HTTP API module.
//!
//! Server, session state, response types and the log stream.

pub mod logs;
pub mod server;
pub mod state;
pub mod types;

pub use logs::*;
pub use server::{router, start_server, AppState};
pub use state::{Activity, ActivityKind, SessionState, SessionStats};
pub use types::*;
