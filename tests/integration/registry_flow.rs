use crate::support::{bridged_agora, create, ctx, register_bridge, MockClient};
use agora::agent::{ConnectOptions, ConnectionStatus, TaskOptions, TaskRequest};
use agora::{Agora, ApiError, CallContext, CancelToken, ReputationLedger};
use serde_json::json;

#[tokio::test]
async fn successful_run_rates_the_agent() {
    let agora = bridged_agora().await;
    let agent = create(&agora, "alpha", "worker", &["x"]).await;
    assert_eq!(agent.reputation_score, 0.5);
    assert_eq!(agent.platform_type, "alpha");

    let result = agora
        .run_agent(&agent.id, json!({"job": 1}), &TaskOptions::default(), &ctx())
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.agent_id, agent.id);

    let score = agora.get_agent_reputation(&agent.id).await.unwrap();
    assert!((score - 0.8).abs() < 1e-9);
    let cached = agora.get_agent(&agent.id).await.unwrap();
    assert!((cached.reputation_score - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn failed_run_counts_interaction_without_rating() {
    let agora = bridged_agora().await;
    let agent = create(&agora, "alpha", "worker", &[]).await;

    let result = agora
        .run_agent(&agent.id, json!({"fail": true}), &TaskOptions::default(), &ctx())
        .await
        .unwrap();
    assert!(!result.success);

    let record = agora
        .reputation()
        .get_record(&agent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.total_interactions, 1);
    assert_eq!(record.successful_interactions, 0);
    assert!(record.history.is_empty());
    assert_eq!(agora.get_agent_reputation(&agent.id).await.unwrap(), 0.5);
}

#[tokio::test]
async fn connect_with_unregistered_source_creates_nothing() {
    let agora = bridged_agora().await;
    let b = create(&agora, "beta", "b", &[]).await;

    let err = agora
        .connect_agents("ghost", &b.id, &ConnectOptions::default(), &ctx())
        .await
        .unwrap_err();
    match err {
        ApiError::NotFound { kind, id } => {
            assert_eq!(kind, "agent");
            assert_eq!(id, "ghost");
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(agora.get_all_connections().await.unwrap().is_empty());
}

#[tokio::test]
async fn cross_platform_connect_opens_a_thread() {
    let agora = bridged_agora().await;
    let a = create(&agora, "alpha", "a", &[]).await;
    let b = create(&agora, "beta", "b", &[]).await;

    let connection = agora
        .connect_agents(&a.id, &b.id, &ConnectOptions::default(), &ctx())
        .await
        .unwrap();
    assert_eq!(connection.status, ConnectionStatus::Active);
    assert_eq!(connection.source_platform, "alpha");
    assert_eq!(connection.target_platform, "beta");

    let thread = agora.get_thread(&connection.id).await.unwrap();
    assert_eq!(thread.participants, vec![a.id.clone(), b.id.clone()]);
    assert_eq!(agora.get_all_connections().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_keeps_connection_records() {
    let agora = bridged_agora().await;
    let a = create(&agora, "alpha", "a", &["x"]).await;
    let b = create(&agora, "beta", "b", &[]).await;
    let connection = agora
        .connect_agents(&a.id, &b.id, &ConnectOptions::default(), &ctx())
        .await
        .unwrap();

    agora.delete_agent(&a.id, &ctx()).await.unwrap();

    let remaining: Vec<String> = agora
        .get_all_agents()
        .await
        .unwrap()
        .into_iter()
        .map(|agent| agent.id)
        .collect();
    assert_eq!(remaining, vec![b.id.clone()]);
    assert!(matches!(
        agora.get_agent(&a.id).await,
        Err(ApiError::NotFound { .. })
    ));
    assert!(agora.get_agent_capabilities(&a.id).await.unwrap().is_empty());

    let connections = agora.get_all_connections().await.unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].id, connection.id);
    assert_eq!(connections[0].source_agent_id, a.id);
}

#[tokio::test]
async fn native_channel_when_no_thread_engine() {
    let agora = Agora::in_memory().unwrap();
    register_bridge(&agora, MockClient::with_native_channels("gamma"), false);
    agora.initialize().await.unwrap();

    let a = create(&agora, "gamma", "a", &[]).await;
    let b = create(&agora, "gamma", "b", &[]).await;
    let connection = agora
        .connect_agents(&a.id, &b.id, &ConnectOptions::default(), &ctx())
        .await
        .unwrap();
    assert_eq!(connection.id, "gamma-0->gamma-1");
    assert!(agora.get_all_threads().await.unwrap().is_empty());
}

#[tokio::test]
async fn connect_without_any_channel_is_invalid_state() {
    let agora = Agora::in_memory().unwrap();
    register_bridge(&agora, MockClient::new("delta"), false);
    agora.initialize().await.unwrap();

    let a = create(&agora, "delta", "a", &[]).await;
    let b = create(&agora, "delta", "b", &[]).await;
    let err = agora
        .connect_agents(&a.id, &b.id, &ConnectOptions::default(), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));
    assert!(agora.get_all_connections().await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_runs_are_isolated() {
    let agora = bridged_agora().await;
    let agent = create(&agora, "alpha", "worker", &[]).await;

    let results = agora
        .run_agents(
            vec![
                TaskRequest::new(agent.id.clone(), json!({"n": 1})),
                TaskRequest::new("missing", json!({"n": 2})),
                TaskRequest::new(agent.id.clone(), json!({"n": 3})),
            ],
            &ctx(),
        )
        .await;
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ApiError::NotFound { .. })));
    assert!(results[2].is_ok());

    let record = agora
        .reputation()
        .get_record(&agent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.total_interactions, 2);
}

#[tokio::test]
async fn cancelled_context_stops_adapter_calls() {
    let agora = bridged_agora().await;
    let token = CancelToken::new();
    token.cancel();
    let cancelled = CallContext::with_cancel(token);

    let err = agora
        .create_agent("alpha", agora::AgentConfig::named("late"), &cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled(_)));
    assert!(agora.get_all_agents().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_platform_is_not_found() {
    let agora = bridged_agora().await;
    let err = agora
        .create_agent("omega", agora::AgentConfig::named("x"), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { kind: "adapter", .. }));
}
