use std::io;
use std::path::Path;

use super::Buffer;

/// Stable handle to a buffer in a [`BufferList`].
///
/// The generation changes every time a slot is reused, so a handle kept
/// around after its buffer was removed never resolves to the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    index: u32,
    generation: u32,
}

impl BufferId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

struct Entry {
    buffer: Buffer,
    prev: Option<u32>,
    next: Option<u32>,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// The editor's list of open buffers, kept in creation order.
pub struct BufferList {
    slots: Vec<Slot>,
    free: Vec<u32>,
    first: Option<u32>,
    last: Option<u32>,
    len: usize,
    next_number: i64,
}

impl BufferList {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            first: None,
            last: None,
            len: 0,
            next_number: 1,
        }
    }

    /// Append a buffer to the end of the list, assigning it the next buffer number
    pub fn add(&mut self, mut buffer: Buffer) -> BufferId {
        buffer.set_number(self.next_number);
        self.next_number += 1;

        let entry = Entry {
            buffer,
            prev: self.last,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].entry = Some(entry);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                (self.slots.len() - 1) as u32
            }
        };

        match self.last {
            Some(last) => {
                if let Some(e) = self.slots[last as usize].entry.as_mut() {
                    e.next = Some(index);
                }
            }
            None => self.first = Some(index),
        }
        self.last = Some(index);
        self.len += 1;

        BufferId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Open a file into a new buffer
    pub fn open(&mut self, path: &Path) -> io::Result<BufferId> {
        let buffer = Buffer::from_file(path)?;
        Ok(self.add(buffer))
    }

    /// Remove a buffer. Every outstanding id for it goes stale.
    pub fn remove(&mut self, id: BufferId) -> Option<Buffer> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);

        match entry.prev {
            Some(prev) => {
                if let Some(e) = self.slots[prev as usize].entry.as_mut() {
                    e.next = entry.next;
                }
            }
            None => self.first = entry.next,
        }
        match entry.next {
            Some(next) => {
                if let Some(e) = self.slots[next as usize].entry.as_mut() {
                    e.prev = entry.prev;
                }
            }
            None => self.last = entry.prev,
        }

        self.free.push(id.index);
        self.len -= 1;
        Some(entry.buffer)
    }

    fn entry(&self, id: BufferId) -> Option<&Entry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn id_at(&self, index: u32) -> BufferId {
        BufferId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    pub fn get(&self, id: BufferId) -> Option<&Buffer> {
        self.entry(id).map(|e| &e.buffer)
    }

    pub fn get_mut(&mut self, id: BufferId) -> Option<&mut Buffer> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut().map(|e| &mut e.buffer)
    }

    pub fn contains(&self, id: BufferId) -> bool {
        self.entry(id).is_some()
    }

    pub fn first(&self) -> Option<BufferId> {
        self.first.map(|i| self.id_at(i))
    }

    pub fn last(&self) -> Option<BufferId> {
        self.last.map(|i| self.id_at(i))
    }

    /// The buffer after `id`, or None at the end of the list (or if `id` is stale)
    pub fn next(&self, id: BufferId) -> Option<BufferId> {
        self.entry(id)?.next.map(|i| self.id_at(i))
    }

    pub fn prev(&self, id: BufferId) -> Option<BufferId> {
        self.entry(id)?.prev.map(|i| self.id_at(i))
    }

    /// Walk the list in host order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.first,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for BufferList {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a> {
    list: &'a BufferList,
    cursor: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (BufferId, &'a Buffer);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let entry = self.list.slots[index as usize].entry.as_ref()?;
        self.cursor = entry.next;
        Some((self.list.id_at(index), &entry.buffer))
    }
}
