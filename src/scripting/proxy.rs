//! Script-side handles to editor entities
//!
//! A proxy never borrows the entity it stands for. It carries the entity's
//! generation-tagged id and is re-resolved against the host on every call,
//! so a proxy that outlives its buffer reports `StaleEntity` instead of
//! reading freed state.

use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::editor::BufferId;

/// The kinds of editor entity scripts can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Buffer,
}

impl EntityKind {
    pub fn class_name(self) -> &'static str {
        match self {
            EntityKind::Buffer => "Buffer",
        }
    }
}

/// What a proxy points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Buffer(BufferId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Buffer(_) => EntityKind::Buffer,
        }
    }
}

/// A script value standing for one editor entity.
///
/// Clones share the same allocation; two proxies are the same script object
/// exactly when [`EntityProxy::same`] holds.
#[derive(Clone)]
pub struct EntityProxy {
    target: Rc<EntityRef>,
}

impl EntityProxy {
    pub fn target(&self) -> EntityRef {
        *self.target
    }

    pub fn kind(&self) -> EntityKind {
        self.target.kind()
    }

    pub fn buffer_id(&self) -> Option<BufferId> {
        match *self.target {
            EntityRef::Buffer(id) => Some(id),
        }
    }

    /// Identity comparison
    pub fn same(&self, other: &EntityProxy) -> bool {
        Rc::ptr_eq(&self.target, &other.target)
    }
}

impl fmt::Debug for EntityProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityProxy").field(&*self.target).finish()
    }
}

/// Hands out at most one live proxy per entity.
///
/// The cache only holds weak references: once scripts drop every copy of a
/// proxy it is gone, and the next lookup builds a fresh one. Ids carry their
/// generation, so an entry for a closed buffer can never answer for the
/// buffer that reuses its slot.
#[derive(Default)]
pub struct ProxyCache {
    proxies: HashMap<EntityRef, Weak<EntityRef>>,
}

impl ProxyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, target: EntityRef) -> EntityProxy {
        if let Some(live) = self.proxies.get(&target).and_then(Weak::upgrade) {
            tracing::trace!(?target, "proxy cache hit");
            return EntityProxy { target: live };
        }

        self.prune();
        let proxy = Rc::new(target);
        self.proxies.insert(target, Rc::downgrade(&proxy));
        tracing::debug!(?target, "created proxy");
        EntityProxy { target: proxy }
    }

    /// Number of proxies still referenced from scripts
    pub fn live(&self) -> usize {
        self.proxies
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    fn prune(&mut self) {
        self.proxies.retain(|_, weak| weak.strong_count() > 0);
    }
}
