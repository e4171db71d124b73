//! Message templates: the declarative filters behaviors register with.
//!
//! A template describes which messages a behavior accepts along three
//! independent dimensions: conversation thread, performative, and an optional
//! custom predicate over the whole message. An unset dimension means "don't
//! care"; a template with nothing set matches every message.

use std::fmt;
use std::sync::Arc;

use colloquy_acl::{performative, Message};
use thiserror::Error;
use uuid::Uuid;

/// Error produced by a custom template predicate.
///
/// A failing predicate aborts the `find` call it was evaluated in; the
/// dispatch index is left untouched and the error surfaces to whoever asked
/// for the dispatch. Predicates are expected to be cheap and total; this
/// exists for the cases where one genuinely cannot decide (e.g. a malformed
/// metadata entry it relies on).
#[derive(Debug, Clone, Error)]
#[error("template predicate failed: {reason}")]
pub struct PredicateError {
    reason: String,
}

impl PredicateError {
    /// Creates a predicate error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Custom matching logic over a whole message.
pub type MessagePredicate = Arc<dyn Fn(&Message) -> Result<bool, PredicateError> + Send + Sync>;

/// Immutable filter describing which messages a behavior accepts.
///
/// Built once at behavior construction time and never mutated. All set
/// dimensions must hold for a message to match (conjunction); unset
/// dimensions match anything.
///
/// # Example
///
/// ```
/// use colloquy_core::template::MessageTemplate;
/// use uuid::Uuid;
///
/// let thread = Uuid::new_v4();
/// let template = MessageTemplate::request().in_thread(thread);
///
/// assert_eq!(template.performative(), Some("request"));
/// assert_eq!(template.thread_id(), Some(thread));
/// ```
#[derive(Clone, Default)]
pub struct MessageTemplate {
    thread_id: Option<Uuid>,
    performative: Option<String>,
    predicate: Option<MessagePredicate>,
}

impl MessageTemplate {
    /// Creates the wildcard template, matching every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the template to one conversation thread.
    #[must_use]
    pub fn in_thread(mut self, thread_id: Uuid) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Restricts the template to one performative.
    #[must_use]
    pub fn with_performative(mut self, performative: impl Into<String>) -> Self {
        self.performative = Some(performative.into());
        self
    }

    /// Attaches a custom predicate evaluated after the field checks.
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Message) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Shorthand for a template accepting `request` messages.
    pub fn request() -> Self {
        Self::new().with_performative(performative::REQUEST)
    }

    /// Shorthand for a template accepting `request_proposal` messages.
    pub fn request_proposal() -> Self {
        Self::new().with_performative(performative::REQUEST_PROPOSAL)
    }

    /// Shorthand for a template accepting `request_approval` messages.
    pub fn request_approval() -> Self {
        Self::new().with_performative(performative::REQUEST_APPROVAL)
    }

    /// Shorthand for a template accepting `inform` messages.
    pub fn inform() -> Self {
        Self::new().with_performative(performative::INFORM)
    }

    /// Shorthand for a template accepting `acknowledge` messages.
    pub fn acknowledge() -> Self {
        Self::new().with_performative(performative::ACKNOWLEDGE)
    }

    /// Shorthand for a template accepting `failure` messages.
    pub fn failure() -> Self {
        Self::new().with_performative(performative::FAILURE)
    }

    /// Shorthand for a template accepting `propose` messages.
    pub fn propose() -> Self {
        Self::new().with_performative(performative::PROPOSE)
    }

    /// Shorthand for a template accepting `accept` messages.
    pub fn accept() -> Self {
        Self::new().with_performative(performative::ACCEPT)
    }

    /// Shorthand for a template accepting `refuse` messages.
    pub fn refuse() -> Self {
        Self::new().with_performative(performative::REFUSE)
    }

    /// Shorthand for a wildcard template whose predicate requires the sender
    /// to belong to `agent_type`.
    pub fn from_sender(agent_type: impl Into<String>) -> Self {
        let agent_type = agent_type.into();
        Self::new().with_predicate(move |message: &Message| {
            Ok(message.sender.agent_type == agent_type)
        })
    }

    /// Conversation thread this template is scoped to, if any.
    pub fn thread_id(&self) -> Option<Uuid> {
        self.thread_id
    }

    /// Performative this template is scoped to, if any.
    pub fn performative(&self) -> Option<&str> {
        self.performative.as_deref()
    }

    /// Whether a custom predicate is attached.
    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Evaluates the template against a message.
    ///
    /// Returns `Ok(true)` iff every set dimension accepts the message: the
    /// thread id matches (when set), the performative matches (when set), and
    /// the predicate returns `Ok(true)` (when attached). Pure; no side
    /// effects.
    ///
    /// # Errors
    ///
    /// Propagates the error of a failing custom predicate unchanged.
    pub fn matches(&self, message: &Message) -> Result<bool, PredicateError> {
        if let Some(thread_id) = self.thread_id {
            if message.thread_id != Some(thread_id) {
                return Ok(false);
            }
        }
        if let Some(performative) = &self.performative {
            if message.performative != *performative {
                return Ok(false);
            }
        }
        if let Some(predicate) = &self.predicate {
            if !predicate(message)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageTemplate")
            .field("thread_id", &self.thread_id)
            .field("performative", &self.performative)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
