//! Turns engine errors into status-line messages

use std::rc::Rc;

use rhai::{EvalAltResult, ParseError, Position};

use super::bridge::first_line;
use super::error::ScriptError;
use crate::editor::MessageSink;

/// Reports script failures to the host, one line each
#[derive(Clone)]
pub struct DiagnosticsRelay {
    sink: Rc<dyn MessageSink>,
}

impl DiagnosticsRelay {
    pub fn new(sink: Rc<dyn MessageSink>) -> Self {
        Self { sink }
    }

    pub fn compile_error(&self, file: &str, err: &ParseError) -> ScriptError {
        let ParseError(kind, pos) = err;
        let err = ScriptError::Compile {
            file: file.to_string(),
            line: line_of(*pos),
            message: kind.to_string(),
        };
        self.report(&err);
        err
    }

    pub fn runtime_error(&self, file: &str, err: EvalAltResult) -> ScriptError {
        let mut err = err;
        let pos = err.take_position();
        let message = match err {
            EvalAltResult::ErrorRuntime(value, _) => value.to_string(),
            other => other.to_string(),
        };
        let err = ScriptError::Runtime {
            file: file.to_string(),
            line: line_of(pos),
            message,
        };
        self.report(&err);
        err
    }

    /// Show `err` on the status line
    pub fn report(&self, err: &ScriptError) {
        let text = format!("Script Error: {}", err);
        let line = first_line(&text);
        tracing::warn!(error = %err, "script failed");
        self.sink.show(line);
    }

    /// Output of the script's own `print`/`debug`
    pub fn print(&self, text: &str) {
        self.sink.show(first_line(text));
    }
}

fn line_of(pos: Position) -> usize {
    pos.line().unwrap_or(0)
}
