//! Structured facts visitors hand to later stages.

use std::any::Any;
use std::fmt;

/// A heterogeneous, append-only list of records.
///
/// Any `Send + Sync` value can be recorded; consumers pull out the records
/// of one type with [`Records::of`].
#[derive(Default)]
pub struct Records {
    items: Vec<Box<dyn Any + Send + Sync>>,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<R: Any + Send + Sync>(&mut self, record: R) {
        self.items.push(Box::new(record));
    }

    /// Records of type `R`, in insertion order.
    pub fn of<R: Any>(&self) -> impl Iterator<Item = &R> {
        self.items.iter().filter_map(|item| item.downcast_ref::<R>())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Records {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Records").field("len", &self.items.len()).finish()
    }
}
