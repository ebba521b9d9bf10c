//! Execution orchestrator
//!
//! Owns the send lifecycle of a tab: variable resolution, scripts, the
//! transport call, cancellation and history.

mod send_request;
mod tab_handle;

pub use send_request::{SendOutcome, SendReport, SendRequest};
pub use tab_handle::TabHandle;
