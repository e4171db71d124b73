//! Hierarchical dispatch index keyed by conversation thread.

use std::collections::HashMap;

use colloquy_acl::Message;
use uuid::Uuid;

use crate::dispatch::{BehaviorId, PerformativeDispatcher, RegisteredBehavior};
use crate::template::{MessageTemplate, PredicateError};

/// Indexes [`PerformativeDispatcher`]s by the thread their entries' templates
/// name.
///
/// The wildcard key holds the behaviors whose template is not scoped to any
/// thread; it is consulted when the message's own thread yields no match.
/// Lookups therefore touch only the behaviors relevant to one thread and one
/// performative, never the agent's whole behavior set.
#[derive(Debug, Default)]
pub struct ThreadDispatcher {
    dispatchers_by_thread: HashMap<Option<Uuid>, PerformativeDispatcher>,
}

impl ThreadDispatcher {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes the entry to the dispatcher keyed by its template's thread id,
    /// creating one if absent, and adds it there.
    pub fn add(&mut self, entry: RegisteredBehavior) {
        let key = entry.template.thread_id();
        self.dispatchers_by_thread
            .entry(key)
            .or_default()
            .add(entry);
    }

    /// Routes the removal by the template's thread id; drops the nested
    /// dispatcher when it empties.
    ///
    /// The cascade keeps finished conversations from leaving empty per-thread
    /// structures behind. A no-op when the id is not present.
    pub fn remove(&mut self, id: BehaviorId, template: &MessageTemplate) {
        let key = template.thread_id();
        let Some(dispatcher) = self.dispatchers_by_thread.get_mut(&key) else {
            return;
        };
        dispatcher.remove(id, template);
        if dispatcher.is_empty() {
            self.dispatchers_by_thread.remove(&key);
        }
    }

    /// Finds the first entry whose template matches the message.
    ///
    /// Delegates to the dispatcher keyed by the message's exact thread id;
    /// when that yields nothing (no such dispatcher, or a dispatcher with no
    /// matching entry), delegates to the wildcard dispatcher. A message
    /// without a thread id consults only the wildcard slot, once.
    ///
    /// # Errors
    ///
    /// A failing custom predicate aborts the lookup and propagates; the index
    /// is left unchanged.
    pub fn find(&self, message: &Message) -> Result<Option<BehaviorId>, PredicateError> {
        if let Some(thread_id) = message.thread_id {
            if let Some(dispatcher) = self.dispatchers_by_thread.get(&Some(thread_id)) {
                if let Some(found) = dispatcher.find(message)? {
                    return Ok(Some(found));
                }
            }
        }
        match self.dispatchers_by_thread.get(&None) {
            Some(dispatcher) => dispatcher.find(message),
            None => Ok(None),
        }
    }

    /// True iff no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.dispatchers_by_thread.is_empty()
    }

    /// Number of registered entries across all threads.
    pub fn len(&self) -> usize {
        self.dispatchers_by_thread
            .values()
            .map(PerformativeDispatcher::len)
            .sum()
    }

    /// True iff a nested dispatcher exists for the given thread key.
    pub fn contains_thread(&self, thread_id: Option<Uuid>) -> bool {
        self.dispatchers_by_thread.contains_key(&thread_id)
    }
}
