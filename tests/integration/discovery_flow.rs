use crate::support::{bridged_agora, create, indexed_agora, MockIndex};
use agora::{DiscoveryQuery, ReputationLedger};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn ids(agents: &[agora::AgentRecord]) -> Vec<String> {
    agents.iter().map(|agent| agent.id.clone()).collect()
}

#[tokio::test]
async fn local_discovery_respects_capabilities_and_order() {
    let agora = bridged_agora().await;
    let first = create(&agora, "alpha", "first", &["x"]).await;
    let second = create(&agora, "beta", "second", &["x", "y"]).await;
    create(&agora, "alpha", "third", &["y"]).await;

    let found = agora
        .discover_agents(&DiscoveryQuery::with_capabilities(["x"]))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![first.id.clone(), second.id.clone()]);

    let found = agora
        .discover_agents(&DiscoveryQuery::with_capabilities(["x", "y"]))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![second.id]);

    let found = agora
        .discover_agents(&DiscoveryQuery::default().limit(1))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![first.id]);
}

#[tokio::test]
async fn min_reputation_uses_current_score() {
    let agora = bridged_agora().await;
    let agent = create(&agora, "alpha", "rated", &["x"]).await;
    agora
        .update_agent_reputation(&agent.id, 1.0, "r1", json!({}))
        .await
        .unwrap();

    let query = DiscoveryQuery::with_capabilities(["x"]).min_reputation(0.9);
    assert_eq!(ids(&agora.discover_agents(&query).await.unwrap()), vec![agent.id.clone()]);

    agora
        .update_agent_reputation(&agent.id, 0.0, "r2", json!({}))
        .await
        .unwrap();
    assert!(agora.discover_agents(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn metadata_filters_match_registered_metadata() {
    let agora = bridged_agora().await;
    let eu = create(&agora, "alpha", "eu", &["x"]).await;
    create(&agora, "alpha", "us", &["x"]).await;

    let mut metadata = BTreeMap::new();
    metadata.insert("region".to_string(), "eu".to_string());
    agora
        .register_agent_capabilities(&eu.id, &["z".to_string()], &metadata)
        .await
        .unwrap();

    let found = agora
        .discover_agents(&DiscoveryQuery::with_capabilities(["x"]).filter("region", "eu"))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![eu.id.clone()]);

    let tags = agora.get_agent_capabilities(&eu.id).await.unwrap();
    assert!(tags.contains("x") && tags.contains("z"));
}

#[tokio::test]
async fn remote_agents_follow_local_ones() {
    let index = Arc::new(MockIndex::default());
    let agora = indexed_agora(index.clone()).await;
    let local = create(&agora, "alpha", "local", &["x"]).await;

    index.add_agent("r1", &["x"], 0.9);
    index.add_agent("r2", &["x"], 0.2);
    index.add_agent("r3", &["y"], 0.9);
    // Same id as the local agent; the local record wins
    index.add_agent(&local.id, &["x"], 1.0);

    let found = agora
        .discover_agents(&DiscoveryQuery::with_capabilities(["x"]))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![local.id.clone(), "r1".to_string()]);
    assert_eq!(found[0].name, "local");
    assert_eq!(found[0].reputation_score, 0.5);
}

#[tokio::test]
async fn offline_index_degrades_to_local() {
    let index = Arc::new(MockIndex::failing());
    let agora = indexed_agora(index.clone()).await;
    let agent = create(&agora, "alpha", "local", &["x"]).await;

    let found = agora
        .discover_agents(&DiscoveryQuery::with_capabilities(["x"]))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![agent.id.clone()]);

    agora
        .register_agent_capabilities(&agent.id, &["y".to_string()], &BTreeMap::new())
        .await
        .unwrap();
    let task = agora
        .record_agent_task(&agent.id, json!({"success": true}))
        .await
        .unwrap();

    let history = agora.get_agent_history(&agent.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, task.id);
    assert!(agora.verify_agent(&agent.id, &json!({})).await.unwrap());
    assert!(!agora.verify_agent("unknown", &json!({})).await.unwrap());
    assert!(index.published.lock().is_empty());
}

#[tokio::test]
async fn capabilities_publish_to_index() {
    let index = Arc::new(MockIndex::default());
    let agora = indexed_agora(index.clone()).await;
    let agent = create(&agora, "alpha", "publisher", &["x"]).await;

    agora
        .register_agent_capabilities(&agent.id, &["y".to_string()], &BTreeMap::new())
        .await
        .unwrap();
    let published = index.published.lock().get(&agent.id).cloned().unwrap();
    assert_eq!(
        published.capabilities.into_iter().collect::<Vec<_>>(),
        vec!["x".to_string(), "y".to_string()]
    );

    // Remote-only agents are answered from the index
    index.published.lock().insert(
        "remote-1".to_string(),
        agora::discovery::CapabilityPublication {
            capabilities: ["z".to_string()].into_iter().collect(),
            metadata: BTreeMap::new(),
        },
    );
    let tags = agora.get_agent_capabilities("remote-1").await.unwrap();
    assert!(tags.contains("z"));
}

#[tokio::test]
async fn index_verdict_and_history_take_precedence() {
    let index = Arc::new(MockIndex::default());
    let agora = indexed_agora(index.clone()).await;
    let agent = create(&agora, "alpha", "checked", &[]).await;

    index.verified.store(false, Ordering::SeqCst);
    assert!(!agora.verify_agent(&agent.id, &json!({})).await.unwrap());

    agora
        .record_agent_task(&agent.id, json!({"success": false}))
        .await
        .unwrap();
    assert_eq!(agora.get_agent_history(&agent.id).await.unwrap().len(), 1);
    assert_eq!(index.history.lock().len(), 1);

    let record = agora
        .reputation()
        .get_record(&agent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.total_interactions, 1);
}
