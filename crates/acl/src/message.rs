//! The ACL message value.
//!
//! This module defines the immutable message agents exchange. A message is
//! created by its sender (usually through [`crate::builder::MessageBuilder`]),
//! never mutated afterwards, and handed to the receiving agent's dispatch
//! core by value.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::AgentId;

/// A single utterance exchanged between two agents.
///
/// The dispatch core routes on `performative` and `thread_id`; everything
/// else is opaque to it and only visible to custom template predicates and
/// the receiving behavior.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Agent that produced the message.
    pub sender: AgentId,

    /// Agent the message is addressed to.
    pub receiver: AgentId,

    /// Speech-act label; the primary dispatch key.
    ///
    /// Standard labels live in [`crate::performative`], but any string is a
    /// valid performative.
    pub performative: String,

    /// Conversation thread the message belongs to, if any.
    ///
    /// Messages that open a new exchange carry no thread id; replies within
    /// an exchange carry the id minted when the conversation was forked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Uuid>,

    /// Free-form key/value pairs carried alongside the content.
    ///
    /// Opaque to the dispatch core; template predicates may inspect them.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Opaque payload.
    ///
    /// By convention a JSON document when produced through
    /// [`crate::builder::MessageBuilder::with_payload`]; see
    /// [`Message::content_as`].
    pub content: String,
}

impl Message {
    /// Deserializes the content as a JSON payload of type `T`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the content is not
    /// valid JSON for `T`.
    pub fn content_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.content)
    }

    /// Returns the metadata value stored under `key`, if present.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MessageBuilder;
    use crate::performative;

    #[test]
    fn content_as_parses_typed_payloads() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Offer {
            price: u32,
        }

        let msg = MessageBuilder::new(performative::PROPOSE)
            .from_agent(AgentId::new("seller", "s-1"))
            .to_agent(AgentId::new("buyer", "b-1"))
            .with_payload(&Offer { price: 40 })
            .expect("payload should serialize");

        assert_eq!(msg.content_as::<Offer>().expect("valid JSON"), Offer { price: 40 });
    }

    #[test]
    fn metadata_value_reads_entries() {
        let msg = MessageBuilder::new(performative::INFORM)
            .from_agent(AgentId::new("a", "1"))
            .to_agent(AgentId::new("b", "1"))
            .with_metadata("priority", "high")
            .with_content("{}")
            .expect("complete message");

        assert_eq!(msg.metadata_value("priority"), Some("high"));
        assert_eq!(msg.metadata_value("missing"), None);
    }
}
