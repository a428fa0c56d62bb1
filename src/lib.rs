//! Script access to editor buffers.
//!
//! The editor owns its buffers; scripts get `Buffer` proxies that look them
//! up again on every call, so closing a buffer never leaves a script
//! pointing at freed state.

pub mod config;
pub mod editor;
pub mod scripting;
