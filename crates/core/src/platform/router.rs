//! Message routing between co-located agents.
//!
//! The [`Router`] maintains a registry of agent inboxes keyed by agent type
//! and implements [`MessageSink`], the egress seam behaviors post through.
//! Swapping the sink (for a network transport, a test capture, or nothing at
//! all) changes how messages leave an agent without touching behavior code.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use colloquy_acl::Message;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::trace;

/// Errors surfaced when posting a message towards its receiver.
#[derive(Debug, Error)]
pub enum PostError {
    /// No agent of the receiver's type is registered.
    #[error("no agent registered for type '{agent_type}'")]
    UnknownReceiver { agent_type: String },

    /// The receiver is registered but its inbox has shut down.
    #[error("agent of type '{agent_type}' is no longer accepting messages")]
    Closed { agent_type: String },

    /// The sending agent has no fabric attached.
    #[error("agent is not attached to a message fabric")]
    Detached,
}

/// Accepts outbound messages on behalf of their receivers.
///
/// Implementations decide what "towards the receiver" means; the in-process
/// [`Router`] resolves it against its registry, a custom sink might serialize
/// onto a wire instead.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Posts one message towards its receiver.
    ///
    /// # Errors
    ///
    /// Returns a [`PostError`] when the receiver cannot be resolved or will
    /// never read the message.
    async fn post(&self, message: Message) -> Result<(), PostError>;
}

/// In-process router: resolves a message's receiver type to a registered
/// agent inbox.
///
/// Routing is by agent type only. One registered agent serves all ids of its
/// type, which matches how the platform registers agents (one per type).
#[derive(Default)]
pub struct Router {
    inboxes: RwLock<HashMap<String, mpsc::Sender<Message>>>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an inbox for an agent type, replacing any previous one.
    pub async fn register(&self, agent_type: impl Into<String>, inbox: mpsc::Sender<Message>) {
        let agent_type = agent_type.into();
        trace!(agent_type = %agent_type, "inbox registered");
        self.inboxes.write().await.insert(agent_type, inbox);
    }

    /// Removes the inbox for an agent type.
    pub async fn deregister(&self, agent_type: &str) {
        self.inboxes.write().await.remove(agent_type);
    }

    /// Number of registered inboxes.
    pub async fn len(&self) -> usize {
        self.inboxes.read().await.len()
    }

    /// Whether no inbox is registered.
    pub async fn is_empty(&self) -> bool {
        self.inboxes.read().await.is_empty()
    }
}

#[async_trait]
impl MessageSink for Router {
    async fn post(&self, message: Message) -> Result<(), PostError> {
        let agent_type = message.receiver.agent_type.clone();
        let inbox = {
            let inboxes = self.inboxes.read().await;
            inboxes
                .get(&agent_type)
                .cloned()
                .ok_or(PostError::UnknownReceiver {
                    agent_type: agent_type.clone(),
                })?
        };
        // The lock is released before awaiting inbox capacity.
        inbox
            .send(message)
            .await
            .map_err(|_| PostError::Closed { agent_type })
    }
}

/// Sink for agents without a fabric; every post fails with
/// [`PostError::Detached`].
pub struct NullSink;

#[async_trait]
impl MessageSink for NullSink {
    async fn post(&self, _message: Message) -> Result<(), PostError> {
        Err(PostError::Detached)
    }
}

/// Sink that records every posted message, for tests and diagnostics.
pub struct CapturingSink {
    messages: std::sync::Mutex<Vec<Message>>,
}

impl CapturingSink {
    /// Creates an empty capture.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: std::sync::Mutex::new(Vec::new()),
        })
    }

    /// All messages posted so far, in order.
    pub fn captured(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageSink for CapturingSink {
    async fn post(&self, message: Message) -> Result<(), PostError> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
        Ok(())
    }
}
