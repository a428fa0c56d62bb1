//! Scripting module - Rhai bridge into the editor's buffers
//!
//! Scripts reach the editor through:
//! - global functions: `system`, `alert`/`message`, `buf_cnt`, `buf_nr`
//! - `Buffer` proxies returned by `buf_nr`, with accessor methods
//!   (`number`, `fname`, `line`, `lines`, `next`, `prev`, ...)

mod api;
mod bridge;
mod class;
mod diagnostics;
mod engine;
mod error;
mod proxy;

pub use bridge::{Bridge, LineRange, NameField, Sibling};
pub use engine::ScriptEnv;
pub use error::{BridgeError, InitError, ScriptError};
pub use proxy::{EntityKind, EntityProxy, EntityRef};
