//! Native side of every bridge call
//!
//! These functions take and return plain Rust values. Converting script
//! arguments and results happens one layer up, in `api`.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use rhai::Dynamic;

use super::error::BridgeError;
use super::proxy::{EntityKind, EntityProxy, EntityRef, ProxyCache};
use crate::editor::{Buffer, BufferId, BufferList, Host, MessageSink, Shell};

/// Optional name fields of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    /// Absolute path
    Full,
    /// Path as given by the user
    Short,
    /// Display name
    Display,
}

impl NameField {
    /// The name scripts know the field by
    pub fn script_name(self) -> &'static str {
        match self {
            NameField::Full => "ffname",
            NameField::Short => "sfname",
            NameField::Display => "fname",
        }
    }

    fn read(self, buffer: &Buffer) -> Option<&str> {
        match self {
            NameField::Full => buffer.full_name(),
            NameField::Short => buffer.short_name(),
            NameField::Display => buffer.name(),
        }
    }
}

/// Half-open range of line numbers after clamping; always `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    /// Turn script-supplied inclusive bounds into a valid range. Negative
    /// bounds clamp to line 0; an end before the start gives an empty range.
    pub fn clamp(start: i64, end: i64) -> Self {
        let to_line = |n: i64| usize::try_from(n.max(0)).unwrap_or(usize::MAX);
        let (start, end) = (to_line(start), to_line(end));
        if end < start {
            Self { start, end: start }
        } else {
            Self {
                start,
                end: end.saturating_add(1),
            }
        }
    }

    /// Cut the range off after the last of `line_count` lines
    pub fn limit(self, line_count: usize) -> Self {
        let end = self.end.min(line_count.saturating_add(1));
        Self {
            start: self.start.min(end),
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Direction for sibling navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sibling {
    Next,
    Prev,
}

/// Shared state behind every registered bridge function
pub struct Bridge {
    buffers: Rc<RefCell<BufferList>>,
    messages: Rc<dyn MessageSink>,
    shell: Rc<dyn Shell>,
    cache: RefCell<ProxyCache>,
}

impl Bridge {
    pub fn new(host: Host) -> Self {
        Self {
            buffers: host.buffers,
            messages: host.messages,
            shell: host.shell,
            cache: RefCell::new(ProxyCache::new()),
        }
    }

    fn buffers(&self) -> Ref<'_, BufferList> {
        self.buffers.borrow()
    }

    /// The proxy for a buffer, reusing the live one if there is one
    pub fn proxy_for(&self, id: BufferId) -> EntityProxy {
        self.cache.borrow_mut().get_or_create(EntityRef::Buffer(id))
    }

    /// Number of proxies scripts still hold
    pub fn live_proxies(&self) -> usize {
        self.cache.borrow().live()
    }

    /// Unwrap a script receiver into a proxy of the expected kind
    pub fn receiver(
        &self,
        value: &Dynamic,
        kind: EntityKind,
        method: &'static str,
    ) -> Result<EntityProxy, BridgeError> {
        let not_bound = || BridgeError::NotABoundProxy {
            method,
            class: kind.class_name(),
        };
        let proxy = value.clone().try_cast::<EntityProxy>().ok_or_else(not_bound)?;
        if proxy.kind() != kind {
            return Err(not_bound());
        }
        Ok(proxy)
    }

    /// Run `f` against the live buffer behind `proxy`
    fn with_buffer<R>(
        &self,
        proxy: &EntityProxy,
        f: impl FnOnce(&Buffer) -> R,
    ) -> Result<R, BridgeError> {
        let EntityRef::Buffer(id) = proxy.target();
        let buffers = self.buffers();
        let buffer = buffers.get(id).ok_or(BridgeError::StaleEntity)?;
        Ok(f(buffer))
    }

    // Buffer accessors

    pub fn number(&self, proxy: &EntityProxy) -> Result<i64, BridgeError> {
        self.with_buffer(proxy, Buffer::number)
    }

    pub fn window_count(&self, proxy: &EntityProxy) -> Result<i64, BridgeError> {
        self.with_buffer(proxy, |b| b.windows() as i64)
    }

    pub fn name_field(
        &self,
        proxy: &EntityProxy,
        field: NameField,
    ) -> Result<String, BridgeError> {
        self.with_buffer(proxy, |b| field.read(b).map(str::to_string))?
            .ok_or(BridgeError::UnboundField {
                field: field.script_name(),
            })
    }

    pub fn line(&self, proxy: &EntityProxy, lnum: i64) -> Result<String, BridgeError> {
        let lnum = usize::try_from(lnum.max(0)).unwrap_or(usize::MAX);
        self.with_buffer(proxy, |b| b.line(lnum))
    }

    /// Lines `start..=end`, in ascending order
    pub fn lines(
        &self,
        proxy: &EntityProxy,
        start: i64,
        end: i64,
    ) -> Result<Vec<String>, BridgeError> {
        let range = LineRange::clamp(start, end);
        self.with_buffer(proxy, |b| {
            let range = range.limit(b.line_count());
            (range.start..range.end).map(|n| b.line(n)).collect()
        })
    }

    /// The neighbouring buffer's proxy, or None at either end of the list
    pub fn sibling(
        &self,
        proxy: &EntityProxy,
        direction: Sibling,
    ) -> Result<Option<EntityProxy>, BridgeError> {
        let EntityRef::Buffer(id) = proxy.target();
        let neighbour = {
            let buffers = self.buffers();
            if !buffers.contains(id) {
                return Err(BridgeError::StaleEntity);
            }
            match direction {
                Sibling::Next => buffers.next(id),
                Sibling::Prev => buffers.prev(id),
            }
        };
        Ok(neighbour.map(|id| self.proxy_for(id)))
    }

    /// How a proxy prints in scripts
    pub fn describe(&self, proxy: &EntityProxy) -> String {
        let class = proxy.kind().class_name();
        match self.number(proxy) {
            Ok(n) => format!("{}({})", class, n),
            Err(_) => format!("{}(<stale>)", class),
        }
    }

    // Global functions

    pub fn buffer_count(&self) -> i64 {
        self.buffers().len() as i64
    }

    /// Find a buffer by number, scanning the list in host order
    pub fn buffer_by_number(&self, number: i64) -> Result<EntityProxy, BridgeError> {
        let found = self
            .buffers()
            .iter()
            .find(|(_, b)| b.number() == number)
            .map(|(id, _)| id);
        match found {
            Some(id) => Ok(self.proxy_for(id)),
            None => Err(BridgeError::EntityNotFound(number)),
        }
    }

    /// Run a shell command; blocks until it exits
    pub fn system(&self, command: &str) -> Result<(), BridgeError> {
        let status = self
            .shell
            .run(command)
            .map_err(|e| BridgeError::ShellUnavailable {
                command: command.to_string(),
                reason: e.to_string(),
            })?;
        if status != 0 {
            tracing::info!(command, status, "shell command failed");
            return Err(BridgeError::CommandFailed(status));
        }
        Ok(())
    }

    /// Join the parts with spaces and show everything before the first newline
    pub fn message(&self, parts: &[String]) {
        let joined = parts.join(" ");
        let line = first_line(&joined);
        tracing::debug!(line, "script message");
        self.messages.show(line);
    }
}

/// Everything before the first newline
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default()
}
