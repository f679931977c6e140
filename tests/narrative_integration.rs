//! Integration tests for the narrative review path.
//!
//! A fixed reply stands in for the remote service, except in the last test
//! which goes through the HTTP client against a mock server.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reviewlens::narrative::{ChangeType, RiskLevel};
use reviewlens::{
    ChangeSet, FileRecord, GeminiClient, NarrativeError, NarrativeService, RequestBuilder,
    ReviewError, Runner,
};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn load_change() -> ChangeSet {
    let path = testdata_path().join("changes").join("pull_request.json");
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).expect("change fixture should parse")
}

fn load_reply() -> String {
    std::fs::read_to_string(testdata_path().join("changes").join("reply.txt")).unwrap()
}

fn change_records(change: &ChangeSet) -> Vec<FileRecord> {
    let batch = testdata_path().join("batch");
    change
        .files
        .iter()
        .filter(|f| f.status != "removed")
        .map(|f| {
            let content = std::fs::read_to_string(batch.join(&f.filename)).unwrap();
            FileRecord::new(f.filename.as_str(), content)
        })
        .collect()
}

/// Returns a canned reply and remembers every request.
struct CannedService {
    reply: String,
    requests: Mutex<Vec<String>>,
}

impl CannedService {
    fn new(reply: String) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NarrativeService for CannedService {
    async fn generate(&self, request: &str) -> Result<String, NarrativeError> {
        self.requests.lock().unwrap().push(request.to_string());
        Ok(self.reply.clone())
    }
}

struct FailingService;

#[async_trait]
impl NarrativeService for FailingService {
    async fn generate(&self, _request: &str) -> Result<String, NarrativeError> {
        Err(NarrativeError::RateLimited)
    }
}

#[tokio::test]
async fn test_review_extracts_narrative() {
    let change = load_change();
    let records = change_records(&change);
    let service = CannedService::new(load_reply());

    let review = Runner::new()
        .review(
            &change.metadata,
            &change.files,
            &records,
            &RequestBuilder::default(),
            &service,
        )
        .await
        .expect("review should succeed");

    let narrative = &review.narrative;
    assert_eq!(narrative.risk_level, RiskLevel::High);
    assert_eq!(narrative.change_type, ChangeType::Feature);
    assert_eq!(narrative.overall_score, Some(4));
    assert_eq!(
        narrative.summary,
        "Adds a command helper and wires it into the classifier module. The helper executes arbitrary input."
    );
    assert_eq!(narrative.impact_areas, vec!["Command execution", "Classifier"]);
    assert_eq!(narrative.recommendations.len(), 5);
    assert_eq!(narrative.recommendations[0], "Remove eval()");
    assert_eq!(narrative.recommendations[4], "Document the helper");
    assert_eq!(narrative.full_analysis, load_reply());

    assert_eq!(review.report.security.overall_risk_score, 15);
    assert_eq!(review.metadata, change.metadata);
}

#[tokio::test]
async fn test_request_carries_change_and_analysis() {
    let change = load_change();
    let records = change_records(&change);
    let service = CannedService::new(load_reply());

    Runner::new()
        .review(
            &change.metadata,
            &change.files,
            &records,
            &RequestBuilder::default(),
            &service,
        )
        .await
        .unwrap();

    let requests = service.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.contains("Add command runner"));
    assert!(request.contains("feature/runner"));
    assert!(request.contains("Adds a helper that runs shell commands."));
    assert!(request.contains("helpers.py"));
    assert!(request.contains("+value = eval(cmd)"));
    assert!(request.contains("Dangerous eval() usage"));
    assert!(request.contains("OVERALL SCORE"));
}

#[tokio::test]
async fn test_record_excerpt_used_when_change_has_no_patch() {
    let mut change = load_change();
    for file in &mut change.files {
        file.patch = None;
    }
    let records: Vec<FileRecord> = change_records(&change)
        .into_iter()
        .map(|r| {
            let excerpt = format!("+excerpt of {}", r.filename);
            r.with_diff(excerpt)
        })
        .collect();
    let service = CannedService::new(load_reply());

    Runner::new()
        .review(
            &change.metadata,
            &change.files,
            &records,
            &RequestBuilder::default(),
            &service,
        )
        .await
        .unwrap();

    let requests = service.requests.lock().unwrap();
    assert!(requests[0].contains("+excerpt of helpers.py"));
    assert!(requests[0].contains("+excerpt of app.py"));
}

#[tokio::test]
async fn test_service_failure_is_propagated() {
    let change = load_change();
    let records = change_records(&change);

    let err = Runner::new()
        .review(
            &change.metadata,
            &change.files,
            &records,
            &RequestBuilder::default(),
            &FailingService,
        )
        .await
        .unwrap_err();

    match err {
        ReviewError::Narrative { identifier, source } => {
            assert_eq!(identifier, "#17");
            assert!(matches!(source, NarrativeError::RateLimited));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_empty_batch_rejected_before_request() {
    let change = load_change();
    let service = CannedService::new(load_reply());

    let err = Runner::new()
        .review(
            &change.metadata,
            &change.files,
            &[],
            &RequestBuilder::default(),
            &service,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ReviewError::EmptyBatch));
    assert!(service.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_review_through_http_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": load_reply()}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(server.uri(), "test-model", "key", Duration::from_secs(5));
    let change = load_change();
    let records = change_records(&change);

    let review = Runner::new()
        .review(
            &change.metadata,
            &change.files,
            &records,
            &RequestBuilder::default(),
            &client,
        )
        .await
        .unwrap();

    assert_eq!(review.narrative.risk_level, RiskLevel::High);
    assert_eq!(review.narrative.recommendations.len(), 5);
}
