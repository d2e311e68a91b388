//! Mutation consumers.

use std::cell::RefCell;
use std::rc::Rc;

use wsdom_protocols::Mutation;

/// Receives every mutation an [`InstrumentedDom`](super::InstrumentedDom)
/// emits, in emission order.
pub trait MutationSink {
    fn emit(&mut self, mutation: Mutation);
}

impl<F: FnMut(Mutation)> MutationSink for F {
    fn emit(&mut self, mutation: Mutation) {
        self(mutation)
    }
}

/// Shared, drainable list of emitted mutations.
///
/// Clones share the same list, so one clone can be handed to the
/// instrumented DOM while another is drained by its owner.
#[derive(Debug, Clone, Default)]
pub struct MutationLog(Rc<RefCell<Vec<Mutation>>>);

impl MutationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Mutation> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl MutationSink for MutationLog {
    fn emit(&mut self, mutation: Mutation) {
        self.0.borrow_mut().push(mutation);
    }
}
