//! Per-visitor state scoped to the traversal stack.
//!
//! A visitor that needs context from its ancestors (the enclosing function,
//! the comments already handled) keeps it in a [`VisitorState`]. Pushing is
//! deferred: [`VisitorState::reset`] queues a value, and the engine pushes it
//! right after the hook returns, tagged with the current path's token. When
//! the traversal leaves that path the frame is popped, no matter how the
//! path's processing ended. The stack therefore always mirrors the branch of
//! the tree currently being walked.

use std::fmt;

use crate::error::{ReduceError, ReduceResult, StateError};
use crate::path::PathToken;

fn state_error(visitor: &str, source: StateError) -> ReduceError {
    ReduceError::State {
        visitor: visitor.to_string(),
        source,
    }
}

struct Frame<S> {
    token: PathToken,
    value: S,
}

pub struct VisitorState<S> {
    visitor: String,
    stack: Vec<Frame<S>>,
    queued: Option<S>,
    current: Option<PathToken>,
}

impl<S> VisitorState<S> {
    pub fn new(visitor: impl Into<String>) -> Self {
        VisitorState {
            visitor: visitor.into(),
            stack: Vec::new(),
            queued: None,
            current: None,
        }
    }

    /// Queue `value` to become the top frame once the current hook returns.
    ///
    /// Reads made in the same hook still see the enclosing frame. A second
    /// call in the same hook replaces the queued value.
    pub fn reset(&mut self, value: S) {
        self.queued = Some(value);
    }

    /// Whether a value is queued by the current hook.
    pub fn is_queued(&self) -> bool {
        self.queued.is_some()
    }

    /// The nearest frame.
    pub fn get(&self) -> ReduceResult<&S> {
        self.get_optional()
            .ok_or_else(|| state_error(&self.visitor, StateError::Empty))
    }

    pub fn get_mut(&mut self) -> ReduceResult<&mut S> {
        match self.stack.last_mut() {
            Some(frame) => Ok(&mut frame.value),
            None => Err(state_error(&self.visitor, StateError::Empty)),
        }
    }

    pub fn get_optional(&self) -> Option<&S> {
        self.stack.last().map(|frame| &frame.value)
    }

    /// The nearest frame satisfying `predicate`.
    pub fn find(&self, predicate: impl Fn(&S) -> bool) -> ReduceResult<&S> {
        self.find_optional(predicate)
            .ok_or_else(|| state_error(&self.visitor, StateError::NoMatch))
    }

    pub fn find_optional(&self, predicate: impl Fn(&S) -> bool) -> Option<&S> {
        self.stack
            .iter()
            .rev()
            .map(|frame| &frame.value)
            .find(|value| predicate(value))
    }

    pub fn find_mut(&mut self, predicate: impl Fn(&S) -> bool) -> ReduceResult<&mut S> {
        let position = self.stack.iter().rposition(|frame| predicate(&frame.value));
        match position {
            Some(index) => Ok(&mut self.stack[index].value),
            None => Err(state_error(&self.visitor, StateError::NoMatch)),
        }
    }

    /// Update the nearest frame in place.
    pub fn set(&mut self, update: impl FnOnce(&mut S)) -> ReduceResult<()> {
        update(self.get_mut()?);
        Ok(())
    }

    /// Update the nearest frame if there is one. Returns whether it did.
    pub fn set_optional(&mut self, update: impl FnOnce(&mut S)) -> bool {
        match self.stack.last_mut() {
            Some(frame) => {
                update(&mut frame.value);
                true
            }
            None => false,
        }
    }

    /// Update the nearest frame satisfying `predicate`.
    pub fn set_where(
        &mut self,
        predicate: impl Fn(&S) -> bool,
        update: impl FnOnce(&mut S),
    ) -> ReduceResult<()> {
        update(self.find_mut(predicate)?);
        Ok(())
    }

    /// Whether the nearest frame was pushed by the path being visited.
    pub fn owns(&self) -> bool {
        match (self.stack.last(), self.current) {
            (Some(frame), Some(token)) => frame.token == token,
            _ => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn bind(&mut self, token: PathToken) {
        self.current = Some(token);
        self.queued = None;
    }

    /// Push the queued value, if any. Returns whether a frame was pushed.
    pub(crate) fn check_pushed(&mut self) -> bool {
        let (Some(value), Some(token)) = (self.queued.take(), self.current) else {
            return false;
        };
        self.stack.push(Frame { token, value });
        true
    }

    /// Drop the frame pushed at `token`.
    pub(crate) fn pop(&mut self, token: PathToken) {
        if let Some(index) = self.stack.iter().rposition(|frame| frame.token == token) {
            debug_assert_eq!(index + 1, self.stack.len(), "visitor state popped out of order");
            self.stack.remove(index);
        }
    }
}

impl<S> fmt::Debug for VisitorState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorState")
            .field("visitor", &self.visitor)
            .field("depth", &self.stack.len())
            .field("queued", &self.queued.is_some())
            .finish()
    }
}
