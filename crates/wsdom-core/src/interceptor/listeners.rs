//! Event listener registry.

use std::fmt;
use std::rc::Rc;

use wsdom_dom::{Document, Event, NodeId};

use super::InstrumentedDom;

/// Handle returned by [`InstrumentedDom::add_event_listener`].
pub type ListenerId = u64;

/// State visible to a listener during dispatch.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub event: Event,
    /// Node the event was dispatched at.
    pub target: NodeId,
    /// Node whose listener is running.
    pub current_target: NodeId,
}

pub(crate) type Listener = Rc<dyn Fn(&mut InstrumentedDom, &mut EventContext)>;

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    event_type: String,
    listener: Listener,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: Vec<ListenerEntry>,
    next_id: ListenerId,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, node: NodeId, event_type: &str, listener: Listener) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(ListenerEntry {
            id,
            node,
            event_type: event_type.to_string(),
            listener,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    /// Listeners for `event_type` on `node`, in registration order.
    pub(crate) fn matching(&self, node: NodeId, event_type: &str) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|e| e.node == node && e.event_type == event_type)
            .map(|e| Rc::clone(&e.listener))
            .collect()
    }

    /// Drop listeners on nodes `doc` has released.
    pub(crate) fn retain_live(&mut self, doc: &Document) {
        self.entries.retain(|e| doc.contains(e.node));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .finish()
    }
}
