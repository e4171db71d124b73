//! The two-level dispatch index.
//!
//! Routing happens in two dimensions, outer first:
//! - [`ThreadDispatcher`]: conversation thread → [`PerformativeDispatcher`]
//! - [`PerformativeDispatcher`]: performative → ordered behavior entries
//!
//! Both levels share the same lookup discipline: try the slot keyed by the
//! message's exact value, then fall back to the wildcard slot (entries whose
//! template left that dimension unset). Within a slot, entries are scanned in
//! insertion order. The net tie-break: more specific registrations beat
//! catch-alls, and among equals, earlier registrations win.
//!
//! The index references behaviors by [`BehaviorId`] and keeps a clone of each
//! registration-time template; the owning agent's registry holds the
//! behaviors themselves. Empty containers are dropped eagerly at both levels,
//! so a long-running agent never accumulates husks of finished conversations.

pub mod performative;
pub mod thread;

use std::fmt;

pub use performative::PerformativeDispatcher;
pub use thread::ThreadDispatcher;

use crate::template::MessageTemplate;

/// Identifier of a behavior within one agent's registry.
///
/// Allocated monotonically per agent; never reused for the agent's lifetime,
/// so a stale id is at worst a no-op on removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorId(u64);

impl BehaviorId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One index entry: a behavior id plus a clone of its registration-time
/// template.
///
/// Templates are immutable, so the clone stays truthful for the behavior's
/// whole lifetime.
#[derive(Clone, Debug)]
pub struct RegisteredBehavior {
    /// Registry id of the behavior.
    pub id: BehaviorId,

    /// The filter the behavior registered with.
    pub template: MessageTemplate,
}

impl RegisteredBehavior {
    /// Creates an index entry.
    pub fn new(id: BehaviorId, template: MessageTemplate) -> Self {
        Self { id, template }
    }
}
