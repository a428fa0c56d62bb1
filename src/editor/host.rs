use std::cell::RefCell;
use std::rc::Rc;

use super::{BufferList, MessageSink, Shell, StdoutSink, SystemShell};

/// The pieces of the editor that scripts can reach
#[derive(Clone)]
pub struct Host {
    pub buffers: Rc<RefCell<BufferList>>,
    pub messages: Rc<dyn MessageSink>,
    pub shell: Rc<dyn Shell>,
}

impl Host {
    pub fn new(
        buffers: Rc<RefCell<BufferList>>,
        messages: Rc<dyn MessageSink>,
        shell: Rc<dyn Shell>,
    ) -> Self {
        Self {
            buffers,
            messages,
            shell,
        }
    }

    /// Host for command-line use: messages on stdout, real shell
    pub fn terminal(buffers: BufferList) -> Self {
        Self::new(
            Rc::new(RefCell::new(buffers)),
            Rc::new(StdoutSink),
            Rc::new(SystemShell),
        )
    }
}
