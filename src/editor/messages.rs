use std::cell::RefCell;

/// Where the editor shows one-line messages to the user.
///
/// The status line has room for a single line; callers strip anything after
/// the first newline before handing text over.
pub trait MessageSink {
    fn show(&self, line: &str);
}

/// Keeps every message shown, newest last
#[derive(Default)]
pub struct MessageLog {
    lines: RefCell<Vec<String>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The message currently on the status line
    pub fn last(&self) -> Option<String> {
        self.lines.borrow().last().cloned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl MessageSink for MessageLog {
    fn show(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Prints messages to stdout, one per line
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn show(&self, line: &str) {
        println!("{}", line);
    }
}
