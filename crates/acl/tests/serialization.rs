use colloquy_acl::*;
use uuid::Uuid;

#[test]
fn test_message_round_trip() {
    let thread = Uuid::new_v4();
    let msg = MessageBuilder::request()
        .from_agent(AgentId::new("planner", "p-1"))
        .to_agent(AgentId::new("executor", "e-1"))
        .in_thread(thread)
        .with_metadata("deadline", "tomorrow")
        .with_content("compile module A")
        .expect("Failed to build message");

    let json = serde_json::to_string(&msg).expect("Failed to serialize Message");
    let deserialized: Message = serde_json::from_str(&json).expect("Failed to deserialize Message");

    assert_eq!(deserialized, msg);
    assert_eq!(deserialized.thread_id, Some(thread));
    assert_eq!(deserialized.metadata_value("deadline"), Some("tomorrow"));
}

#[test]
fn test_message_optional_fields_are_omitted() {
    let msg = MessageBuilder::inform()
        .from_agent(AgentId::new("a", "1"))
        .to_agent(AgentId::new("b", "1"))
        .with_content("hello")
        .expect("Failed to build message");

    let json = serde_json::to_value(&msg).expect("Failed to serialize Message");

    // Unset thread and empty metadata do not appear on the wire.
    assert!(json.get("thread_id").is_none());
    assert!(json.get("metadata").is_none());
}

#[test]
fn test_message_deserializes_without_optional_fields() {
    let json = r#"{
        "sender": { "agent_type": "a", "agent_id": "1" },
        "receiver": { "agent_type": "b", "agent_id": "1" },
        "performative": "inform",
        "content": "hello"
    }"#;

    let msg: Message = serde_json::from_str(json).expect("Failed to deserialize Message");

    assert_eq!(msg.performative, performative::INFORM);
    assert!(msg.thread_id.is_none());
    assert!(msg.metadata.is_empty());
}

#[test]
fn test_agent_id_round_trip() {
    let id = AgentId::new("broker", "broker-1");

    let json = serde_json::to_string(&id).expect("Failed to serialize AgentId");
    let deserialized: AgentId = serde_json::from_str(&json).expect("Failed to deserialize AgentId");

    assert_eq!(deserialized, id);
}
