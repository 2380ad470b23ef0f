use crate::circuit_breaker::BreakerState;
use crate::config::{BreakerConfig, RemoteModelConfig};
use crate::engine::{KnowledgeBase, QueryDomain};
use crate::models::{AllergyRecord, RiskLevel, UserHealthProfile};
use crate::responders::{FallbackResponder, QueryRequest, QueryResponder, ReplySource};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_config(server: &MockServer) -> RemoteModelConfig {
    RemoteModelConfig {
        api_url: format!("{}/v1/chat/completions", server.uri()),
        request_timeout_secs: 1,
        ..Default::default()
    }
}

fn breaker(threshold: usize) -> BreakerConfig {
    BreakerConfig {
        failure_threshold: threshold,
        window_ms: 60_000,
        cooldown_ms: 60_000,
    }
}

fn allergic_profile() -> UserHealthProfile {
    UserHealthProfile {
        allergies: vec![AllergyRecord::new("Peanuts", RiskLevel::High)],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_remote_answer_is_used_when_healthy() {
    // 1. Arrange
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Avoid satay sauce."}}]
        })))
        .mount(&mock_server)
        .await;
    let responder = FallbackResponder::with_remote(remote_config(&mock_server), &breaker(3));

    // 2. Act
    let reply = responder
        .respond(&QueryRequest::new("Is satay safe?", "en", allergic_profile()))
        .await
        .unwrap();

    // 3. Assert
    assert_eq!(reply.source, ReplySource::Remote);
    assert_eq!(reply.text, "Avoid satay sauce.");
}

#[tokio::test]
async fn test_remote_error_falls_back_to_matching_local_answer() {
    // 1. Arrange
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;
    let responder = FallbackResponder::with_remote(remote_config(&mock_server), &breaker(3));
    let request = QueryRequest::new("Does this have nuts? I have an allergy", "en", allergic_profile());

    // 2. Act
    let reply = responder.respond(&request).await;

    // 3. Assert
    let reply = reply.expect("fallback never surfaces the remote error");
    assert_eq!(reply.source, ReplySource::Local);
    assert_eq!(reply.domain, Some(QueryDomain::Allergen));

    let expected = KnowledgeBase::default().answer(&request.query, request.language, &request.profile);
    assert!(reply.text.starts_with(&expected.answer));
}

#[tokio::test]
async fn test_repeated_failures_stop_hitting_the_remote() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    let responder = FallbackResponder::with_remote(remote_config(&mock_server), &breaker(2));
    let request = QueryRequest::new("مرحبا", "ar", UserHealthProfile::default());

    for _ in 0..4 {
        let reply = responder.answer(&request).await;
        assert_eq!(reply.source, ReplySource::Local);
    }

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(responder.breaker_state().await, BreakerState::Open);
}

#[tokio::test]
async fn test_unreachable_remote_falls_back() {
    let config = RemoteModelConfig {
        api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        request_timeout_secs: 1,
        ..Default::default()
    };
    let responder = FallbackResponder::with_remote(config, &breaker(3));

    let reply = responder
        .answer(&QueryRequest::new("What should I eat?", "en", UserHealthProfile::default()))
        .await;

    assert_eq!(reply.source, ReplySource::Local);
    assert!(!reply.text.is_empty());
}
