//! Fluent construction of messages and replies.
//!
//! `MessageBuilder` is the one place message assembly rules live: a message
//! is only produced once sender and receiver are known, replies inherit the
//! thread of the message they answer, and typed payloads are serialized to
//! JSON content in one step.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::AgentId;
use crate::message::Message;
use crate::performative;

/// Error returned when a builder is finalized with required fields missing
/// or a typed payload fails to serialize.
#[derive(Debug, Error)]
pub enum MessageBuildError {
    /// No sender was set before finalizing.
    #[error("message has no sender")]
    MissingSender,

    /// No receiver was set before finalizing.
    #[error("message has no receiver")]
    MissingReceiver,

    /// The typed payload could not be serialized to JSON.
    #[error("failed to serialize message payload")]
    Payload(#[from] serde_json::Error),
}

/// Accumulates message fields and produces a [`Message`].
///
/// # Example
///
/// ```
/// use colloquy_acl::{AgentId, MessageBuilder};
///
/// let msg = MessageBuilder::request()
///     .from_agent(AgentId::new("planner", "p-1"))
///     .to_agent(AgentId::new("executor", "e-1"))
///     .with_content("compile module A")
///     .unwrap();
///
/// assert_eq!(msg.performative, "request");
/// assert!(msg.thread_id.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    performative: String,
    sender: Option<AgentId>,
    receiver: Option<AgentId>,
    thread_id: Option<Uuid>,
    metadata: HashMap<String, String>,
}

impl MessageBuilder {
    /// Starts a builder for an arbitrary performative.
    pub fn new(performative: impl Into<String>) -> Self {
        Self {
            performative: performative.into(),
            sender: None,
            receiver: None,
            thread_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Starts a `request` message.
    pub fn request() -> Self {
        Self::new(performative::REQUEST)
    }

    /// Starts a `request_proposal` message.
    pub fn request_proposal() -> Self {
        Self::new(performative::REQUEST_PROPOSAL)
    }

    /// Starts a `request_approval` message.
    pub fn request_approval() -> Self {
        Self::new(performative::REQUEST_APPROVAL)
    }

    /// Starts an `inform` message.
    pub fn inform() -> Self {
        Self::new(performative::INFORM)
    }

    /// Starts an `acknowledge` message.
    pub fn acknowledge() -> Self {
        Self::new(performative::ACKNOWLEDGE)
    }

    /// Starts a `failure` message.
    pub fn failure() -> Self {
        Self::new(performative::FAILURE)
    }

    /// Starts a `propose` message.
    pub fn propose() -> Self {
        Self::new(performative::PROPOSE)
    }

    /// Starts an `accept` message.
    pub fn accept() -> Self {
        Self::new(performative::ACCEPT)
    }

    /// Starts a `refuse` message.
    pub fn refuse() -> Self {
        Self::new(performative::REFUSE)
    }

    /// Starts a reply to `msg`: addressed back to its sender, sent from its
    /// receiver, within the same thread (if any).
    pub fn reply(msg: &Message, performative: impl Into<String>) -> Self {
        let mut builder = Self::new(performative)
            .from_agent(msg.receiver.clone())
            .to_agent(msg.sender.clone());
        builder.thread_id = msg.thread_id;
        builder
    }

    /// Starts an `inform` reply to `msg`.
    pub fn reply_with_inform(msg: &Message) -> Self {
        Self::reply(msg, performative::INFORM)
    }

    /// Starts an `acknowledge` reply to `msg`.
    pub fn reply_with_acknowledge(msg: &Message) -> Self {
        Self::reply(msg, performative::ACKNOWLEDGE)
    }

    /// Starts a `failure` reply to `msg`.
    pub fn reply_with_failure(msg: &Message) -> Self {
        Self::reply(msg, performative::FAILURE)
    }

    /// Starts a `propose` reply to `msg`.
    pub fn reply_with_propose(msg: &Message) -> Self {
        Self::reply(msg, performative::PROPOSE)
    }

    /// Starts an `accept` reply to `msg`.
    pub fn reply_with_accept(msg: &Message) -> Self {
        Self::reply(msg, performative::ACCEPT)
    }

    /// Starts a `refuse` reply to `msg`.
    pub fn reply_with_refuse(msg: &Message) -> Self {
        Self::reply(msg, performative::REFUSE)
    }

    /// Scopes the message to a conversation thread.
    #[must_use]
    pub fn in_thread(mut self, thread_id: Uuid) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Sets the receiving agent.
    #[must_use]
    pub fn to_agent(mut self, receiver: AgentId) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Sets the sending agent.
    #[must_use]
    pub fn from_agent(mut self, sender: AgentId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Finalizes the message with a raw content string.
    ///
    /// # Errors
    ///
    /// Fails when sender or receiver was never set.
    pub fn with_content(self, content: impl Into<String>) -> Result<Message, MessageBuildError> {
        let sender = self.sender.ok_or(MessageBuildError::MissingSender)?;
        let receiver = self.receiver.ok_or(MessageBuildError::MissingReceiver)?;
        Ok(Message {
            sender,
            receiver,
            performative: self.performative,
            thread_id: self.thread_id,
            metadata: self.metadata,
            content: content.into(),
        })
    }

    /// Finalizes the message with a typed payload serialized to JSON content.
    ///
    /// # Errors
    ///
    /// Fails when sender or receiver was never set, or the payload cannot be
    /// serialized.
    pub fn with_payload<T: Serialize>(self, payload: &T) -> Result<Message, MessageBuildError> {
        let content = serde_json::to_string(payload)?;
        self.with_content(content)
    }
}
