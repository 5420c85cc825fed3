use agora::agent::{AgentRecord, ConnectionRecord, ConnectionStatus, TaskRecord};
use agora::protocol::{
    payment_request, ActiveCapability, Capability, CapabilityAction, CapabilityStatus, Message,
    MessageRole, Thread, PAYMENT_REQUEST,
};
use agora::reputation::{RatingEntry, ReputationRecord, ViolationEntry, ViolationKind};
use agora::types::now;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Encode to a generic JSON value, decode it back and require equality.
fn through_json<T>(value: &T) -> Value
where
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    let encoded = serde_json::to_value(value).unwrap();
    let decoded: T = serde_json::from_value(encoded.clone()).unwrap();
    assert_eq!(&decoded, value);
    encoded
}

fn metadata() -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("region".to_string(), "eu".to_string());
    metadata
}

#[test]
fn registry_records_survive_json() {
    let agent = AgentRecord {
        id: "agent-1".to_string(),
        name: "buyer".to_string(),
        platform_type: "alpha".to_string(),
        platform_id: "buyer.alpha".to_string(),
        created_at: now(),
        reputation_score: 0.625,
        metadata: metadata(),
    };
    let encoded = through_json(&agent);
    assert_eq!(encoded["platformType"], "alpha");
    assert_eq!(encoded["reputationScore"], 0.625);

    let connection = ConnectionRecord {
        id: "thread-1".to_string(),
        source_agent_id: "agent-1".to_string(),
        target_agent_id: "agent-2".to_string(),
        source_platform: "alpha".to_string(),
        target_platform: "beta".to_string(),
        status: ConnectionStatus::Active,
        created_at: now(),
    };
    let encoded = through_json(&connection);
    assert_eq!(encoded["status"], "active");

    let task = TaskRecord {
        id: "task-1".to_string(),
        agent_id: "agent-1".to_string(),
        data: json!({"success": true, "nested": {"rows": [1, 2.5, null]}}),
        success: Some(true),
        recorded_at: now(),
    };
    through_json(&task);
}

#[test]
fn reputation_record_with_violations_survives_json() {
    let record = ReputationRecord {
        agent_id: "agent-1".to_string(),
        score: 0.35,
        history: vec![RatingEntry {
            rating: 0.9,
            rater_id: "rater-1".to_string(),
            timestamp: now(),
            weight: 1.0,
            evidence: json!({"task": "t-1"}),
        }],
        violations: vec![ViolationEntry {
            kind: ViolationKind::MajorInfraction,
            reporter_id: "rater-2".to_string(),
            description: "late delivery".to_string(),
            evidence: json!({}),
            timestamp: now(),
            penalty: ViolationKind::MajorInfraction.penalty(),
        }],
        total_interactions: 4,
        successful_interactions: 3,
        updated_at: now(),
    };
    let encoded = through_json(&record);
    assert_eq!(encoded["violations"][0]["kind"], "major_infraction");
    assert_eq!(encoded["totalInteractions"], 4);
}

#[test]
fn thread_entities_survive_json() {
    let request = payment_request(json!({"amount": 25, "currency": "USDC", "recipient": "m.near"}))
        .unwrap()
        .with_id("invoice-7");
    let encoded = through_json(&request);
    assert_eq!(encoded["type"], PAYMENT_REQUEST);
    assert_eq!(encoded["id"], "invoice-7");

    let response = Capability {
        capability_type: PAYMENT_REQUEST.to_string(),
        version: request.version.clone(),
        action: CapabilityAction::Response,
        data: json!({"status": "paid"}),
        reference_id: Some("message-1".to_string()),
        id: Some("invoice-7".to_string()),
    };
    let encoded = through_json(&response);
    assert_eq!(encoded["referenceId"], "message-1");
    assert_eq!(encoded["action"], "response");

    let message = Message {
        id: "message-1".to_string(),
        thread_id: "thread-1".to_string(),
        role: MessageRole::Agent,
        sender_id: Some("agent-1".to_string()),
        content: "please pay".to_string(),
        capabilities: vec![request.clone(), response],
        metadata: metadata(),
        created_at: now(),
    };
    through_json(&message);

    let thread = Thread {
        id: "thread-1".to_string(),
        title: "negotiation".to_string(),
        participants: vec!["agent-1".to_string(), "agent-2".to_string()],
        messages: vec![message],
        metadata: BTreeMap::new(),
        created_at: now(),
        updated_at: now(),
    };
    through_json(&thread);

    let active = ActiveCapability {
        thread_id: "thread-1".to_string(),
        capability_id: "invoice-7".to_string(),
        message_id: "message-1".to_string(),
        capability: request,
        status: CapabilityStatus::Responded,
        created_at: now(),
        responded_at: Some(now()),
    };
    let encoded = through_json(&active);
    assert_eq!(encoded["status"], "responded");
}
