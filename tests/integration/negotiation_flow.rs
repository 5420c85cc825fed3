use crate::support::{bridged_agora, create, ctx};
use agora::agent::ConnectOptions;
use agora::protocol::{
    payment_request, CapabilityAction, CapabilityStatus, FnHandler, MessageRole, DATA_REQUEST,
    PAYMENT_REQUEST,
};
use agora::{ApiError, NewMessage, ThreadOptions};
use serde_json::json;
use std::sync::Arc;

fn payment() -> agora::Capability {
    payment_request(json!({"amount": 25, "currency": "USDC", "recipient": "merchant.near"})).unwrap()
}

#[tokio::test]
async fn payment_request_round_trip() {
    let agora = bridged_agora().await;
    let buyer = create(&agora, "alpha", "buyer", &["payments"]).await;
    let seller = create(&agora, "beta", "seller", &["payments"]).await;
    let connection = agora
        .connect_agents(&buyer.id, &seller.id, &ConnectOptions::default(), &ctx())
        .await
        .unwrap();
    let thread_id = connection.id;

    let request = agora
        .add_message(
            &thread_id,
            NewMessage::from_agent(buyer.id.clone(), "please pay").with_capability(payment()),
        )
        .await
        .unwrap();

    let active = agora
        .thread_engine()
        .get_active_capabilities(&thread_id)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].capability_id, PAYMENT_REQUEST);
    assert_eq!(active[0].message_id, request.id);

    let before = agora.get_thread(&thread_id).await.unwrap().messages.len();
    let response = agora
        .respond_to_capability(&thread_id, PAYMENT_REQUEST, json!({"status": "paid"}))
        .await
        .unwrap();
    let thread = agora.get_thread(&thread_id).await.unwrap();
    assert_eq!(thread.messages.len(), before + 1);

    assert_eq!(response.role, MessageRole::Agent);
    let answer = &response.capabilities[0];
    assert_eq!(answer.action, CapabilityAction::Response);
    assert_eq!(answer.reference_id.as_deref(), Some(request.id.as_str()));

    let entry = agora
        .thread_engine()
        .get_capability(&thread_id, PAYMENT_REQUEST)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, CapabilityStatus::Responded);
    assert!(agora
        .thread_engine()
        .get_active_capabilities(&thread_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn responses_without_an_active_request_are_rejected() {
    let agora = bridged_agora().await;
    let thread = agora
        .create_thread(ThreadOptions::titled("negotiation"))
        .await
        .unwrap();

    let err = agora
        .respond_to_capability(&thread.id, PAYMENT_REQUEST, json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));

    agora
        .add_message(
            &thread.id,
            NewMessage::new(MessageRole::User, "pay").with_capability(payment()),
        )
        .await
        .unwrap();
    agora
        .respond_to_capability(&thread.id, PAYMENT_REQUEST, json!({"ok": true}))
        .await
        .unwrap();
    let err = agora
        .respond_to_capability(&thread.id, PAYMENT_REQUEST, json!({"ok": true}))
        .await
        .unwrap_err();
    assert!(err.is_protocol_violation());
    assert_eq!(agora.get_thread(&thread.id).await.unwrap().messages.len(), 2);
}

#[tokio::test]
async fn concurrent_same_type_requests_need_distinct_ids() {
    let agora = bridged_agora().await;
    let thread = agora
        .create_thread(ThreadOptions::titled("two payments"))
        .await
        .unwrap();
    agora
        .add_message(
            &thread.id,
            NewMessage::new(MessageRole::User, "first").with_capability(payment()),
        )
        .await
        .unwrap();

    let err = agora
        .add_message(
            &thread.id,
            NewMessage::new(MessageRole::User, "second").with_capability(payment()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));
    assert_eq!(agora.get_thread(&thread.id).await.unwrap().messages.len(), 1);

    agora
        .add_message(
            &thread.id,
            NewMessage::new(MessageRole::User, "second")
                .with_capability(payment().with_id("invoice-2")),
        )
        .await
        .unwrap();
    let active = agora
        .thread_engine()
        .get_active_capabilities(&thread.id)
        .await
        .unwrap();
    let keys: Vec<&str> = active.iter().map(|entry| entry.capability_id.as_str()).collect();
    assert_eq!(keys, vec![PAYMENT_REQUEST, "invoice-2"]);

    // A responded key can be requested again
    agora
        .respond_to_capability(&thread.id, PAYMENT_REQUEST, json!({}))
        .await
        .unwrap();
    agora
        .add_message(
            &thread.id,
            NewMessage::new(MessageRole::User, "third").with_capability(payment()),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn registered_handler_answers_requests() {
    let agora = bridged_agora().await;
    let previous = agora.register_capability_handler(
        DATA_REQUEST,
        Arc::new(FnHandler(|capability: &agora::Capability| {
            Ok(Some(json!({"rows": [], "query": capability.data["query"].clone()})))
        })),
    );
    assert!(previous.is_none());

    let thread = agora
        .create_thread(ThreadOptions::titled("lookup"))
        .await
        .unwrap();
    let request = agora
        .create_capability_request(DATA_REQUEST, json!({"query": "balances"}))
        .unwrap();
    agora
        .add_message(
            &thread.id,
            NewMessage::new(MessageRole::User, "lookup").with_capability(request),
        )
        .await
        .unwrap();

    let thread = agora.get_thread(&thread.id).await.unwrap();
    assert_eq!(thread.messages.len(), 2);
    let answer = &thread.messages[1].capabilities[0];
    assert_eq!(answer.action, CapabilityAction::Response);
    assert_eq!(answer.data["query"], "balances");
}

#[tokio::test]
async fn malformed_requests_and_unknown_threads() {
    let agora = bridged_agora().await;
    assert!(matches!(
        agora.create_capability_request(PAYMENT_REQUEST, json!({"amount": 1})),
        Err(ApiError::Validation(_))
    ));
    assert!(agora
        .create_capability_request("custom-tag", json!({"anything": true}))
        .is_ok());

    let err = agora
        .add_message("no-such-thread", NewMessage::new(MessageRole::User, "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { kind: "thread", .. }));
}
