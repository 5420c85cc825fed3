use crate::support::{bridged_agora, create};
use agora::reputation::{HistoryReputationLedger, ReputationConfig};
use agora::store::MemoryRepository;
use agora::{DiscoveryQuery, ReputationLedger};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn ledger() -> HistoryReputationLedger {
    let ledger = HistoryReputationLedger::new(
        Arc::new(MemoryRepository::new()),
        ReputationConfig::default(),
    );
    ledger.initialize().await.unwrap();
    ledger
}

#[tokio::test]
async fn opposite_ratings_average_to_neutral() {
    let ledger = ledger().await;
    ledger.submit_rating("a1", 1.0, "r1", json!({})).await.unwrap();
    ledger.submit_rating("a1", 0.0, "r2", json!({})).await.unwrap();
    assert_eq!(ledger.get_reputation_score("a1").await.unwrap(), 0.5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn score_is_bounded_and_stable(ratings in prop::collection::vec(-1.0f64..2.0, 0..24)) {
        let (first, second, stored) = runtime().block_on(async {
            let ledger = ledger().await;
            ledger.seed_agent("a").await.unwrap();
            for (i, rating) in ratings.iter().enumerate() {
                ledger
                    .submit_rating("a", *rating, &format!("r{}", i % 3), json!({}))
                    .await
                    .unwrap();
            }
            let first = ledger.get_reputation_score("a").await.unwrap();
            let second = ledger.get_reputation_score("a").await.unwrap();
            let stored = ledger.get_record("a").await.unwrap().unwrap().score;
            (first, second, stored)
        });
        prop_assert!((0.0..=1.0).contains(&first));
        prop_assert_eq!(first, second);
        prop_assert_eq!(first, stored);
    }

    #[test]
    fn discovery_results_satisfy_the_query(
        population in prop::collection::vec((any::<bool>(), prop::option::of(0.0f64..=1.0)), 1..8),
        min_score in 0.0f64..=1.0,
    ) {
        let violations = runtime().block_on(async {
            let agora = bridged_agora().await;
            for (i, (has_x, rating)) in population.iter().enumerate() {
                let tags: &[&str] = if *has_x { &["x"] } else { &["y"] };
                let agent = create(&agora, "alpha", &format!("agent-{}", i), tags).await;
                if let Some(rating) = rating {
                    agora
                        .update_agent_reputation(&agent.id, *rating, "rater", json!({}))
                        .await
                        .unwrap();
                }
            }

            let found = agora
                .discover_agents(&DiscoveryQuery::with_capabilities(["x"]).min_reputation(min_score))
                .await
                .unwrap();
            let mut violations = Vec::new();
            for agent in found {
                let tags = agora.get_agent_capabilities(&agent.id).await.unwrap();
                let score = agora.get_agent_reputation(&agent.id).await.unwrap();
                if !tags.contains("x") || score < min_score {
                    violations.push(agent.id);
                }
            }
            violations
        });
        prop_assert!(violations.is_empty(), "unsound results: {:?}", violations);
    }
}
