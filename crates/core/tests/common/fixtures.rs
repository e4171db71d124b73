//! Test fixtures for agent identities and canned messages.

use colloquy_acl::{AgentId, Message, MessageBuilder};
use uuid::Uuid;

/// Identity of the agent that opens conversations in these tests.
#[allow(dead_code)]
pub fn initiator() -> AgentId {
    AgentId::new("initiator", "init-1")
}

/// Identity of the agent that answers requests in these tests.
#[allow(dead_code)]
pub fn responder() -> AgentId {
    AgentId::new("responder", "resp-1")
}

/// Identity used for a plain standalone agent.
#[allow(dead_code)]
pub fn worker() -> AgentId {
    AgentId::new("worker", "w-1")
}

/// Builds a complete unthreaded message.
#[allow(dead_code)]
pub fn message(performative: &str, from: AgentId, to: AgentId, content: &str) -> Message {
    MessageBuilder::new(performative)
        .from_agent(from)
        .to_agent(to)
        .with_content(content)
        .expect("fixture message is complete")
}

/// Builds a complete message inside the given conversation thread.
#[allow(dead_code)]
pub fn threaded_message(
    performative: &str,
    thread: Uuid,
    from: AgentId,
    to: AgentId,
    content: &str,
) -> Message {
    MessageBuilder::new(performative)
        .from_agent(from)
        .to_agent(to)
        .in_thread(thread)
        .with_content(content)
        .expect("fixture message is complete")
}
