mod buffer;
mod buffer_list;
mod host;
mod messages;
mod shell;

pub use buffer::Buffer;
pub use buffer_list::{BufferId, BufferList};
pub use host::Host;
pub use messages::{MessageLog, MessageSink, StdoutSink};
pub use shell::{Shell, SystemShell};
