//! The in-process platform: agent lifecycle and message fabric.
//!
//! [`Platform`] ties the pieces together:
//! 1. Owns the [`Router`] all hosted agents post through
//! 2. Spawns each registered agent's run loop on its own task
//! 3. Collects [`RuntimeEvent`]s from all agents on one channel
//! 4. Coordinates shutdown (stop every agent, then join every task)
//!
//! One platform hosts at most one agent per agent type; messages are routed
//! by the receiver's type.

pub mod events;
pub mod router;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use colloquy_acl::{AgentId, Message};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

pub use events::RuntimeEvent;
pub use router::{CapturingSink, MessageSink, NullSink, PostError, Router};

use crate::agent::{Agent, AgentHandle};
use crate::config::RuntimeConfig;

struct HostedAgent {
    handle: AgentHandle,
    task: JoinHandle<()>,
}

/// Hosts a set of agents over a shared in-process message fabric.
///
/// # Example
///
/// ```no_run
/// # use colloquy_acl::AgentId;
/// # use colloquy_core::config::RuntimeConfig;
/// # use colloquy_core::platform::Platform;
/// # async fn demo() -> anyhow::Result<()> {
/// let mut platform = Platform::new(RuntimeConfig::default());
/// let handle = platform
///     .register(AgentId::new("echo", "echo-1"), |agent| {
///         // install initial behaviors here
///         let _ = agent;
///     })
///     .await?;
/// # let _ = handle;
/// platform.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct Platform {
    config: RuntimeConfig,
    router: Arc<Router>,
    agents: HashMap<String, HostedAgent>,
    events_tx: mpsc::Sender<RuntimeEvent>,
    events_rx: Option<mpsc::Receiver<RuntimeEvent>>,
}

impl Platform {
    /// Creates a platform with the given runtime configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity);
        Self {
            config,
            router: Arc::new(Router::new()),
            agents: HashMap::new(),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// The router hosted agents post through.
    pub fn router(&self) -> Arc<Router> {
        self.router.clone()
    }

    /// Takes the runtime event receiver. Yields `None` on every call after
    /// the first.
    pub fn events(&mut self) -> Option<mpsc::Receiver<RuntimeEvent>> {
        self.events_rx.take()
    }

    /// Number of hosted agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// The handle of a hosted agent, by type.
    pub fn handle(&self, agent_type: &str) -> Option<&AgentHandle> {
        self.agents.get(agent_type).map(|hosted| &hosted.handle)
    }

    /// Registers an agent, wires it into the fabric, and spawns its run loop.
    ///
    /// `setup` runs before the agent starts, with exclusive access; install
    /// the initial behaviors there. The returned handle posts messages and
    /// manages behaviors for the lifetime of the agent.
    ///
    /// # Errors
    ///
    /// Fails if an agent of the same type is already hosted.
    pub async fn register<F>(&mut self, id: AgentId, setup: F) -> Result<AgentHandle>
    where
        F: FnOnce(&mut Agent),
    {
        let agent_type = id.agent_type.clone();
        if self.agents.contains_key(&agent_type) {
            bail!("an agent of type '{agent_type}' is already registered");
        }

        let (agent, handle) = Agent::new(id, self.config.inbox_capacity);
        let mut agent = agent
            .with_sink(self.router.clone())
            .with_events(self.events_tx.clone());
        setup(&mut agent);

        self.router
            .register(agent_type.clone(), handle.inbox_sender())
            .await;
        let task = tokio::spawn(agent.run());
        info!(agent = %handle.agent_id(), "agent registered");

        self.agents.insert(
            agent_type,
            HostedAgent {
                handle: handle.clone(),
                task,
            },
        );
        Ok(handle)
    }

    /// Posts a message into the fabric towards its receiver.
    ///
    /// # Errors
    ///
    /// Returns a [`PostError`] when no hosted agent matches the receiver's
    /// type or its inbox has shut down.
    pub async fn post(&self, message: Message) -> Result<(), PostError> {
        self.router.post(message).await
    }

    /// Stops every hosted agent and waits for their run loops to finish.
    ///
    /// Each agent drains the messages already in its inbox before exiting;
    /// in-flight deliveries run to completion.
    ///
    /// # Errors
    ///
    /// Fails if an agent task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        for hosted in self.agents.values() {
            hosted.handle.stop();
        }
        for (agent_type, hosted) in self.agents.drain() {
            hosted
                .task
                .await
                .with_context(|| format!("agent task for type '{agent_type}' panicked"))?;
            self.router.deregister(&agent_type).await;
        }
        info!("platform shut down");
        Ok(())
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
