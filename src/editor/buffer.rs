use ropey::Rope;
use std::{fs::File, io, path::Path};

/// One open document as the host sees it.
///
/// The name fields mirror the three ways a buffer can be referred to: the
/// absolute path, the path as the user typed it, and the display name. Any
/// of them may be unset (a scratch buffer has none).
pub struct Buffer {
    text: Rope,
    number: i64,
    full_name: Option<String>,
    short_name: Option<String>,
    name: Option<String>,
    windows: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            number: 0,
            full_name: None,
            short_name: None,
            name: None,
            windows: 0,
        }
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = Rope::from_reader(File::open(path)?)?;
        let short = path.to_string_lossy().into_owned();
        let full = std::fs::canonicalize(path)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| short.clone());

        Ok(Self {
            text,
            number: 0,
            full_name: Some(full),
            short_name: Some(short.clone()),
            name: Some(short),
            windows: 0,
        })
    }

    /// Create a buffer from a string (scratch buffers, tests)
    pub fn from_text(s: &str) -> Self {
        Self {
            text: Rope::from_str(s),
            ..Self::new()
        }
    }

    pub fn with_names(
        mut self,
        full_name: Option<&str>,
        short_name: Option<&str>,
        name: Option<&str>,
    ) -> Self {
        self.full_name = full_name.map(str::to_string);
        self.short_name = short_name.map(str::to_string);
        self.name = name.map(str::to_string);
        self
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub(super) fn set_number(&mut self, number: i64) {
        self.number = number;
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of windows currently showing this buffer
    pub fn windows(&self) -> usize {
        self.windows
    }

    pub fn open_window(&mut self) {
        self.windows += 1;
    }

    pub fn close_window(&mut self) {
        self.windows = self.windows.saturating_sub(1);
    }

    /// Number of lines, counted the way the editor shows them: a trailing
    /// newline does not start a new line.
    pub fn line_count(&self) -> usize {
        let lines = self.text.len_lines();
        if lines > 1 && self.text.line(lines - 1).len_chars() == 0 {
            lines - 1
        } else {
            lines
        }
    }

    /// Text of line `lnum` (1-based) without its terminator.
    /// Line 0 and lines past the end read as empty.
    pub fn line(&self, lnum: usize) -> String {
        if lnum == 0 || lnum > self.line_count() {
            return String::new();
        }
        let mut line = self.text.line(lnum - 1).to_string();
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
