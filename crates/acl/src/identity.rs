//! Agent addressing.
//!
//! This module defines how agents are identified on the message fabric.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a single agent instance.
///
/// Agents are grouped into pools by `agent_type`; the fabric routes a message
/// by the receiver's type, while `agent_id` distinguishes instances within the
/// pool (and scopes per-agent state such as storage).
///
/// # Example
///
/// ```
/// use colloquy_acl::AgentId;
///
/// let id = AgentId::new("broker", "broker-1");
/// assert_eq!(id.to_string(), "broker/broker-1");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentId {
    /// Pool the agent belongs to; the routing key of the fabric.
    pub agent_type: String,

    /// Instance identifier within the pool.
    pub agent_id: String,
}

impl AgentId {
    /// Creates an agent address from its type and instance parts.
    pub fn new(agent_type: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            agent_id: agent_id.into(),
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.agent_type, self.agent_id)
    }
}
