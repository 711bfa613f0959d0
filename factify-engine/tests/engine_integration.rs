use std::sync::Arc;
use std::time::Duration;

use factify_core::config::PollPolicy;
use factify_core::error::AnalysisError;
use factify_core::payload::{AiDetectionResult, ResultPayload};
use factify_core::types::{AnalysisKind, AnalysisRequest};
use factify_engine::client::AnalysisClient;
use factify_engine::dispatcher::Dispatch;
use factify_engine::testing::FakeIdentity;
use factify_engine::traits::{HttpTransport, IdentityProvider};
use factify_providers::request::HttpRequest;
use factify_providers::runtime::{HttpExecutor, HttpResponse};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct ReqwestHttp(HttpExecutor);

#[async_trait::async_trait]
impl HttpTransport for ReqwestHttp {
    async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        self.0.execute(req).await
    }
}

const NOT_READY: &str = "Task is not completed yet.";

fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(20),
        max_attempts: 30,
    }
}

fn client(server: &MockServer, identity: Arc<dyn IdentityProvider>) -> AnalysisClient {
    let http = HttpExecutor::new(Duration::from_secs(5), Duration::from_secs(10)).unwrap();
    AnalysisClient::new(
        Arc::new(ReqwestHttp(http)),
        identity,
        format!("{}/api", server.uri()),
        fast_policy(),
    )
}

async fn count(server: &MockServer, m: &str, p: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == m && r.url.path() == p)
        .count()
}

async fn mount_start(server: &MockServer, kind_path: &str, task_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/api/analysis/{kind_path}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "taskId": task_id})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn sky_is_blue_completes_after_two_polls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analysis/ai"))
        .and(body_json(json!({"text": "The sky is blue."})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "taskId": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/ai/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": NOT_READY})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let data = json!({
        "text": "The sky is blue.",
        "ai_probability": 12,
        "human_probability": 88,
        "segments": []
    });
    Mock::given(method("GET"))
        .and(path("/api/analysis/ai/abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": data})),
        )
        .with_priority(2)
        .mount(&server)
        .await;

    let client = client(&server, FakeIdentity::anonymous());
    let outcome = client
        .analyze(
            AnalysisKind::AiDetection,
            AnalysisRequest::text("The sky is blue."),
        )
        .await;

    let expected = AiDetectionResult {
        text: "The sky is blue.".into(),
        ai_probability: 12.0,
        human_probability: 88.0,
        segments: vec![],
    };
    assert_eq!(
        outcome.result,
        Ok(ResultPayload::AiDetection(expected.clone()))
    );
    assert_eq!(outcome.dispatch, Dispatch::Shown(AnalysisKind::AiDetection));
    assert_eq!(outcome.stage_label(), "done");

    let slots = client.results();
    assert_eq!(slots.ai_detection, Some(expected));
    assert_eq!(slots.populated(), 1);

    assert_eq!(count(&server, "GET", "/api/analysis/ai/abc").await, 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn switching_kind_leaves_one_slot() {
    let server = MockServer::start().await;
    mount_start(&server, "ai", "a1").await;
    mount_start(&server, "manipulation", "m1").await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/ai/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"text": "t", "ai_probability": 70, "human_probability": 30}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/manipulation/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"text": "t", "result": {"loaded language": {"disaster": ["hyperbole"]}}}
        })))
        .mount(&server)
        .await;

    let client = client(&server, FakeIdentity::anonymous());
    let first = client
        .analyze(AnalysisKind::AiDetection, AnalysisRequest::text("t"))
        .await;
    assert!(first.is_success());
    assert!(client.results().ai_detection.is_some());

    let second = client
        .analyze(AnalysisKind::Manipulation, AnalysisRequest::text("t"))
        .await;
    assert!(second.is_success());

    let slots = client.results();
    assert_eq!(slots.populated(), 1);
    assert!(slots.ai_detection.is_none());
    assert_eq!(
        slots.manipulation.map(|m| m.flagged_fragments()),
        Some(1)
    );
}

#[tokio::test]
async fn rejected_submission_never_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analysis/find_sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Text too long"
        })))
        .mount(&server)
        .await;

    let client = client(&server, FakeIdentity::anonymous());
    let outcome = client
        .analyze(AnalysisKind::FindSources, AnalysisRequest::text("t"))
        .await;

    assert_eq!(
        outcome.result,
        Err(AnalysisError::Submission("Text too long".into()))
    );
    assert_eq!(outcome.dispatch, Dispatch::Error("Text too long".into()));
    assert_eq!(client.results().error.as_deref(), Some("Text too long"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn blank_input_makes_no_requests() {
    let server = MockServer::start().await;
    let client = client(&server, FakeIdentity::anonymous());

    let outcome = client
        .analyze(AnalysisKind::AiDetection, AnalysisRequest::text("   "))
        .await;

    assert!(matches!(outcome.result, Err(AnalysisError::Validation(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn hard_failure_surfaces_backend_message() {
    let server = MockServer::start().await;
    mount_start(&server, "manipulation", "m1").await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/manipulation/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "LLM quota exhausted"
        })))
        .mount(&server)
        .await;

    let client = client(&server, FakeIdentity::anonymous());
    let outcome = client
        .analyze(AnalysisKind::Manipulation, AnalysisRequest::text("t"))
        .await;

    assert_eq!(
        outcome.result,
        Err(AnalysisError::PollFailure("LLM quota exhausted".into()))
    );
    assert_eq!(
        count(&server, "GET", "/api/analysis/manipulation/m1").await,
        1
    );
    assert_eq!(client.results().populated(), 0);
}

#[tokio::test]
async fn expired_token_is_refreshed_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analysis/ai"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/analysis/ai"))
        .and(header("authorization", "Bearer new"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "taskId": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/ai/abc"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"text": "t", "ai_probability": 1, "human_probability": 99}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = FakeIdentity::signed_in("old").refreshing_to("new");
    let client = client(&server, identity.clone());
    let outcome = client
        .analyze(AnalysisKind::AiDetection, AnalysisRequest::text("t"))
        .await;

    assert!(outcome.is_success(), "{:?}", outcome.result);
    assert_eq!(identity.refreshes(), 1);
}

#[tokio::test]
async fn failed_refresh_prompts_sign_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analysis/ai"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server, FakeIdentity::signed_in("old"));
    let outcome = client
        .analyze(AnalysisKind::AiDetection, AnalysisRequest::text("t"))
        .await;

    assert_eq!(outcome.result, Err(AnalysisError::SessionExpired));
    assert!(outcome.needs_sign_in());
    let slots = client.results();
    assert!(slots.login_prompt);
    assert!(slots.error.is_none());
}

#[tokio::test]
async fn newer_submission_of_same_kind_wins() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analysis/ai"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "taskId": "old"})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_start(&server, "ai", "new").await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/ai/old"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": NOT_READY})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/ai/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"text": "fresh", "ai_probability": 5, "human_probability": 95}
        })))
        .mount(&server)
        .await;

    let client = client(&server, FakeIdentity::anonymous());
    let older = client.analyze(AnalysisKind::AiDetection, AnalysisRequest::text("first"));
    let newer = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        client
            .analyze(AnalysisKind::AiDetection, AnalysisRequest::text("second"))
            .await
    };
    let (older, newer) = tokio::join!(older, newer);

    assert_eq!(older.dispatch, Dispatch::Stale);
    assert_eq!(older.result, Err(AnalysisError::Superseded));
    assert_eq!(newer.dispatch, Dispatch::Shown(AnalysisKind::AiDetection));

    let slots = client.results();
    assert_eq!(
        slots.ai_detection.map(|r| r.text),
        Some("fresh".to_string())
    );
}

#[tokio::test]
async fn post_like_comment_and_delete_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/social/feed"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({"content": "Is this real?", "analysis_id": null})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "postId": "p1"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/social/feed/p1/like"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "liked": true})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/social/feed/p1/comment"))
        .and(body_json(json!({"text": "Looks edited to me"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/social/feed/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let social = client(&server, FakeIdentity::signed_in("tok")).social();
    let post = factify_core::social::NewPost::new(Some("Is this real?".into()), None).unwrap();

    let id = social.share(&post).await.unwrap();
    assert!(social.toggle_like(&id).await.unwrap());
    social.add_comment(&id, "Looks edited to me").await.unwrap();
    social.delete_post(&id).await.unwrap();

    assert_eq!(count(&server, "POST", "/api/social/feed/p1/like").await, 1);
    assert_eq!(count(&server, "POST", "/api/social/feed/p1/comment").await, 1);
}
