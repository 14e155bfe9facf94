//! In-place editing of a list slot while it is being walked.

use std::sync::Arc;

use sapling_ast::NodeRef;

use crate::signal::Signal;

/// How many times one position may be rewritten before the walk gives up.
pub(crate) const MAX_REVISITS: usize = 100;

/// A list slot being walked left to right while its items are edited.
///
/// `index` always points into the edited list, so removing an item leaves
/// the cursor on the next one, and inserted or replaced items are walked
/// before the cursor moves past them.
#[derive(Debug)]
pub(crate) struct ListSplice {
    items: Vec<NodeRef>,
    index: usize,
    revisits: usize,
}

impl ListSplice {
    pub(crate) fn new(items: Vec<NodeRef>) -> Self {
        ListSplice {
            items,
            index: 0,
            revisits: 0,
        }
    }

    /// Position and node to visit next.
    pub(crate) fn current(&self) -> Option<(usize, NodeRef)> {
        self.items
            .get(self.index)
            .map(|node| (self.index, node.clone()))
    }

    /// Apply the signal returned for the current item.
    ///
    /// Returns `Ok(true)` when the list changed and `Err` with the signal
    /// when it is a [`Signal::Parent`] that has to bubble further.
    pub(crate) fn apply(&mut self, signal: Signal) -> Result<bool, Signal> {
        match signal {
            Signal::Retain | Signal::Skip => {
                self.advance();
                Ok(false)
            }
            Signal::Replace(node) if Arc::ptr_eq(&node, &self.items[self.index]) => {
                self.advance();
                Ok(false)
            }
            Signal::Remove => {
                self.items.remove(self.index);
                self.revisits = 0;
                Ok(true)
            }
            Signal::ReplaceList(nodes) => {
                if nodes.is_empty() {
                    self.items.remove(self.index);
                    self.revisits = 0;
                } else {
                    self.items.splice(self.index..=self.index, nodes);
                    self.revisits += 1;
                }
                Ok(true)
            }
            Signal::Replace(node) => {
                self.items[self.index] = node;
                self.revisits += 1;
                Ok(true)
            }
            parent @ Signal::Parent { .. } => Err(parent),
        }
    }

    fn advance(&mut self) {
        self.index += 1;
        self.revisits = 0;
    }

    /// Consecutive rewrites of the current position.
    pub(crate) fn revisits(&self) -> usize {
        self.revisits
    }

    pub(crate) fn items(&self) -> &[NodeRef] {
        &self.items
    }
}
