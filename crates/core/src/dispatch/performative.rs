//! Flat dispatch index keyed by performative.

use std::collections::HashMap;

use colloquy_acl::Message;

use crate::dispatch::{BehaviorId, RegisteredBehavior};
use crate::template::{MessageTemplate, PredicateError};

/// Indexes behavior entries by the performative their template names.
///
/// Entries whose template leaves the performative unset live under the
/// wildcard key and are only consulted when the exact key yields nothing.
/// Within a key, entries keep insertion order.
#[derive(Debug, Default)]
pub struct PerformativeDispatcher {
    behaviors_by_performative: HashMap<Option<String>, Vec<RegisteredBehavior>>,
}

impl PerformativeDispatcher {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to the sequence keyed by its template's performative,
    /// creating the sequence if absent.
    pub fn add(&mut self, entry: RegisteredBehavior) {
        let key = entry.template.performative().map(str::to_owned);
        self.behaviors_by_performative
            .entry(key)
            .or_default()
            .push(entry);
    }

    /// Removes the first entry with the given id from the sequence its
    /// template keys to; drops the sequence when it empties.
    ///
    /// A no-op when the id is not present; the delivery loop and external
    /// teardown may both try to remove the same completed behavior.
    pub fn remove(&mut self, id: BehaviorId, template: &MessageTemplate) {
        let key = template.performative().map(str::to_owned);
        let Some(entries) = self.behaviors_by_performative.get_mut(&key) else {
            return;
        };
        if let Some(position) = entries.iter().position(|entry| entry.id == id) {
            entries.remove(position);
        }
        if entries.is_empty() {
            self.behaviors_by_performative.remove(&key);
        }
    }

    /// Finds the first entry whose template matches the message.
    ///
    /// Scans the sequence keyed by the message's exact performative in
    /// insertion order; when that yields nothing, scans the wildcard
    /// sequence the same way.
    ///
    /// # Errors
    ///
    /// A failing custom predicate aborts the scan and propagates; the index
    /// is left unchanged.
    pub fn find(&self, message: &Message) -> Result<Option<BehaviorId>, PredicateError> {
        let exact = Some(message.performative.clone());
        if let Some(found) = self.scan(&exact, message)? {
            return Ok(Some(found));
        }
        self.scan(&None, message)
    }

    /// True iff no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.behaviors_by_performative.is_empty()
    }

    /// Number of registered entries across all keys.
    pub fn len(&self) -> usize {
        self.behaviors_by_performative.values().map(Vec::len).sum()
    }

    /// True iff a sequence exists for the given key.
    pub fn contains_key(&self, performative: Option<&str>) -> bool {
        self.behaviors_by_performative
            .contains_key(&performative.map(str::to_owned))
    }

    fn scan(
        &self,
        key: &Option<String>,
        message: &Message,
    ) -> Result<Option<BehaviorId>, PredicateError> {
        let Some(entries) = self.behaviors_by_performative.get(key) else {
            return Ok(None);
        };
        for entry in entries {
            if entry.template.matches(message)? {
                return Ok(Some(entry.id));
            }
        }
        Ok(None)
    }
}
