//! Shapes of the script-visible surface: which names exist and how many
//! arguments each one takes.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use super::proxy::EntityKind;

/// Positional arguments a bridge function accepts (receiver not counted)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Any count from zero up to the limit
    UpTo(usize),
}

impl Arity {
    pub fn counts(self) -> RangeInclusive<usize> {
        match self {
            Arity::Exact(n) => n..=n,
            Arity::UpTo(n) => 0..=n,
        }
    }

    pub fn accepts(self, count: usize) -> bool {
        self.counts().contains(&count)
    }
}

/// One method on a proxy class
#[derive(Debug)]
pub struct MethodSpec<M: 'static> {
    pub name: &'static str,
    pub args: usize,
    pub method: M,
}

/// The method table shared by every proxy of one entity kind
#[derive(Debug)]
pub struct ProxyClass<M: 'static> {
    pub kind: EntityKind,
    pub methods: &'static [MethodSpec<M>],
}

impl<M: 'static> ProxyClass<M> {
    pub fn name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn method_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.iter().map(|m| m.name)
    }

    /// Method names must be unique within a class
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for m in self.methods {
            if !seen.insert(m.name) {
                return Err(format!("{} defines `{}` twice", self.name(), m.name));
            }
        }
        Ok(())
    }
}
