use std::io;
use std::path::PathBuf;

use rhai::EvalAltResult;
use thiserror::Error;

/// Failure while building the script environment. The host must not run
/// scripts after seeing one of these.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("a script environment is already live on this thread")]
    AlreadyInitialized,
    #[error("engine allocation failed: {0}")]
    EngineAlloc(String),
    #[error("execution context allocation failed: {0}")]
    ContextAlloc(String),
    #[error("global namespace allocation failed: {0}")]
    GlobalAlloc(String),
    #[error("standard library install failed: {0}")]
    StdlibInstall(String),
    #[error("bridge function install failed: {0}")]
    BridgeInstall(String),
}

/// A script that could not be loaded, compiled or run
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{file}:{line}:{message}")]
    Compile {
        file: String,
        line: usize,
        message: String,
    },
    #[error("{file}:{line}:{message}")]
    Runtime {
        file: String,
        line: usize,
        message: String,
    },
}

impl ScriptError {
    pub fn message(&self) -> String {
        match self {
            Self::Read { .. } => self.to_string(),
            Self::Compile { message, .. } | Self::Runtime { message, .. } => message.clone(),
        }
    }
}

/// Errors raised by bridge functions. Scripts see them as exceptions
/// they can catch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("{method}() called on something that is not a {class}")]
    NotABoundProxy {
        method: &'static str,
        class: &'static str,
    },
    #[error("buffer field '{field}' is empty")]
    UnboundField { field: &'static str },
    #[error("no buffer with number {0}")]
    EntityNotFound(i64),
    #[error("buffer was closed by the editor")]
    StaleEntity,
    #[error("command failed with exit code {0}")]
    CommandFailed(i32),
    #[error("could not run `{command}`: {reason}")]
    ShellUnavailable { command: String, reason: String },
    #[error("{function}(): {reason}")]
    InvalidArguments {
        function: &'static str,
        reason: String,
    },
}

impl BridgeError {
    pub fn invalid_args(function: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function,
            reason: reason.into(),
        }
    }
}

impl From<BridgeError> for Box<EvalAltResult> {
    fn from(err: BridgeError) -> Self {
        err.to_string().into()
    }
}
