use std::collections::HashMap;
use std::time::Duration;

use jira_webform::{
    AttachmentResult, AuthConfig, FileResolver, JiraSubmissionClient, ProjectConfig,
    ResolvedFile, Submission, SubmissionOutcome, TrackerConfig,
};
use serde_json::{Value, json};
use wiremock::matchers::{basic_auth, body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUE_PATH: &str = "/rest/api/2/issue/";

/// In-memory stand-in for the site's file storage.
#[derive(Default)]
struct FakeFiles {
    files: HashMap<String, ResolvedFile>,
}

impl FakeFiles {
    fn with(mut self, id: &str, name: &str, bytes: &[u8]) -> Self {
        self.files
            .insert(id.to_string(), ResolvedFile::from_bytes(name, bytes.to_vec()));
        self
    }
}

impl FileResolver for FakeFiles {
    fn resolve(&self, file_id: &str) -> Option<ResolvedFile> {
        self.files.get(file_id).cloned()
    }
}

fn tracker_config(endpoint_url: String) -> TrackerConfig {
    TrackerConfig {
        endpoint_url,
        auth: AuthConfig {
            username: "travel-bot".to_string(),
            password: "s3cret".to_string(),
        },
        projects: ProjectConfig {
            domestic: "10000".to_string(),
            international: "10001".to_string(),
            vouchers: "10002".to_string(),
            issue_type: "10100".to_string(),
        },
        timeout_secs: Some(2),
    }
}

fn client_for(server: &MockServer) -> JiraSubmissionClient {
    JiraSubmissionClient::new(tracker_config(format!("{}{ISSUE_PATH}", server.uri()))).unwrap()
}

fn submission(title: &str, fields: Value) -> Submission {
    Submission::new(title, fields.as_object().cloned().unwrap())
}

fn attachment_path(issue_id: &str) -> String {
    format!("{ISSUE_PATH}{issue_id}/attachments/")
}

#[tokio::test]
async fn domestic_request_is_created_with_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .and(basic_auth("travel-bot", "s3cret"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "fields": {
                "project": {"id": "10000"},
                "issuetype": {"id": "10100"},
                "summary": "Travel Request: Jane Doe",
                "customfield_10090": "Jane Doe"
            }
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "10042", "key": "TRAVD-12"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .submit(
            &submission(
                "Travel Request",
                json!({"customfield_10090": "Jane Doe", "proxy": "No", "formTitle": "Travel Request"}),
            ),
            &FakeFiles::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::Success {
            issue_id: "10042".to_string(),
            issue_key: Some("TRAVD-12".to_string()),
            attachments: Vec::new(),
        }
    );

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["fields"].get("proxy").is_none());
    assert!(body["fields"].get("formTitle").is_none());
}

#[tokio::test]
async fn international_request_uploads_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .and(body_partial_json(json!({"fields": {"project": {"id": "10001"}}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "77"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(attachment_path("77")))
        .and(header("X-Atlassian-Token", "nocheck"))
        .and(basic_auth("travel-bot", "s3cret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "20001", "filename": "passport.pdf"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let files = FakeFiles::default().with("501", "passport.pdf", b"%PDF-1.4 scan");
    let outcome = client_for(&server)
        .submit(
            &submission(
                "Travel Authorization",
                json!({
                    "international_travel": "Yes",
                    "voucher_request": "Yes",
                    "customfield_10090": "Ana Traveler",
                    "passport_copy": ["501"]
                }),
            ),
            &files,
        )
        .await
        .unwrap();

    assert_eq!(outcome.issue_id(), Some("77"));
    let SubmissionOutcome::Success { attachments, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(
        attachments,
        vec![AttachmentResult {
            file_name: "passport.pdf".to_string(),
            uploaded: true
        }]
    );

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|request| request.url.path() == attachment_path("77"))
        .unwrap();
    let content_type = upload.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("name=\"file\""), "{body}");
    assert!(body.contains("filename=\"passport.pdf\""), "{body}");
    assert!(body.contains("application/pdf"), "{body}");
    assert!(body.contains("%PDF-1.4 scan"), "{body}");
}

#[tokio::test]
async fn validation_error_skips_uploads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"errorMessages": ["summary is required"]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(attachment_path("77")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
        .expect(0)
        .mount(&server)
        .await;

    let files = FakeFiles::default().with("501", "passport.pdf", b"scan");
    let outcome = client_for(&server)
        .submit(
            &submission(
                "Travel Request",
                json!({"customfield_10090": "Jane Doe", "attachments": ["501"]}),
            ),
            &files,
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::ValidationError {
            messages: vec!["summary is required".to_string()]
        }
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn response_without_id_is_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .submit(
            &submission("Travel Request", json!({"customfield_10090": "Jane Doe"})),
            &FakeFiles::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SubmissionOutcome::UnknownError {
            raw: "{}".to_string()
        }
    );
}

#[tokio::test]
async fn unreadable_error_page_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .submit(
            &submission("Travel Request", json!({"customfield_10090": "Jane Doe"})),
            &FakeFiles::default(),
        )
        .await
        .unwrap();

    match outcome {
        SubmissionOutcome::TransportError { cause } => assert!(cause.contains("502"), "{cause}"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_tracker_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "1"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .submit(
            &submission("Travel Request", json!({"customfield_10090": "Jane Doe"})),
            &FakeFiles::default(),
        )
        .await
        .unwrap();

    assert!(
        matches!(outcome, SubmissionOutcome::TransportError { .. }),
        "{outcome:?}"
    );
}

#[tokio::test]
async fn unreachable_tracker_is_transport_error() {
    let client =
        JiraSubmissionClient::new(tracker_config("http://127.0.0.1:1/rest/api/2/issue/".to_string()))
            .unwrap();

    let outcome = client
        .submit(
            &submission("Travel Request", json!({"customfield_10090": "Jane Doe"})),
            &FakeFiles::default(),
        )
        .await
        .unwrap();

    assert!(
        matches!(outcome, SubmissionOutcome::TransportError { .. }),
        "{outcome:?}"
    );
}

#[tokio::test]
async fn missing_and_empty_files_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "88"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(attachment_path("88")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let files = FakeFiles::default()
        .with("1", "empty.txt", b"")
        .with("2", "receipt.txt", b"taxi 40");
    let outcome = client_for(&server)
        .submit(
            &submission(
                "Travel Request",
                json!({
                    "customfield_10090": "Jane Doe",
                    "attachments": ["1", "404", "2"],
                    "supporting_documents": "file"
                }),
            ),
            &files,
        )
        .await
        .unwrap();

    assert_eq!(outcome.issue_id(), Some("88"));
    let SubmissionOutcome::Success { attachments, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(
        attachments,
        vec![AttachmentResult {
            file_name: "receipt.txt".to_string(),
            uploaded: true
        }]
    );
}

#[tokio::test]
async fn failed_upload_does_not_stop_the_others() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ISSUE_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "99"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(attachment_path("99")))
        .and(body_string_contains("too-big.pdf"))
        .respond_with(ResponseTemplate::new(413).set_body_string("Request Entity Too Large"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(attachment_path("99")))
        .and(body_string_contains("hotel.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "2"}])))
        .mount(&server)
        .await;

    let files = FakeFiles::default()
        .with("1", "too-big.pdf", b"huge")
        .with("2", "hotel.pdf", b"booking");
    let outcome = client_for(&server)
        .submit(
            &submission(
                "Travel Request",
                json!({"customfield_10090": "Jane Doe", "attachments": ["1", "2"]}),
            ),
            &files,
        )
        .await
        .unwrap();

    let SubmissionOutcome::Success {
        issue_id,
        attachments,
        ..
    } = outcome
    else {
        panic!("expected success");
    };
    assert_eq!(issue_id, "99");
    assert_eq!(
        attachments,
        vec![
            AttachmentResult {
                file_name: "too-big.pdf".to_string(),
                uploaded: false
            },
            AttachmentResult {
                file_name: "hotel.pdf".to_string(),
                uploaded: true
            },
        ]
    );
}

#[tokio::test]
async fn schema_violation_sends_nothing() {
    let server = MockServer::start().await;

    let err = client_for(&server)
        .submit(
            &submission("", json!({"customfield_10090": "Jane Doe"})),
            &FakeFiles::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.missing, vec!["summary"]);
    assert!(server.received_requests().await.unwrap().is_empty());
}
