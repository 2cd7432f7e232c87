//! End-to-end tests for `POST /check` against the in-process router.

mod common;

use axum::http::StatusCode;
use regex_lite::Regex;
use serde_json::json;

use common::{sheet_image, MultipartForm, TestConfig, TestFixture};
use omr_gateway_core::testing::{MockOutcome, MockSheet};

fn sheet_form() -> MultipartForm {
    MultipartForm::new().file("image", "sheet.png", &sheet_image())
}

#[tokio::test]
async fn test_scenario_a_scored_check() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new()
        .text("template_id", "default")
        .text("evaluate", "true")
        .file("image", "sheet.png", &sheet_image());
    let response = fixture.post_check("", form).await;

    assert_status!(response, StatusCode::OK);
    let body = &response.body;
    assert_eq!(body["score"], json!(2.0));
    assert!(!body["evaluation"].as_array().unwrap().is_empty());
    assert_eq!(body["evaluation"][0]["question"], "q1");
    assert_eq!(body["evaluation"][0]["delta"], 1);
    assert_eq!(body["responses"]["q1"], "A");
    assert_eq!(body["responses"]["Roll"], "0042");
    assert!(body["responses"].get("score").is_none());

    let key = body["checked_omr_filename"].as_str().unwrap();
    assert!(Regex::new(r"^\d{4}-\d{2}/.+").unwrap().is_match(key));
    let storage_path = body["checked_omr_path"].as_str().unwrap();
    assert_eq!(storage_path, format!("outputs/scans/CheckedOMRs/{}", key));
    assert!(std::path::Path::new(storage_path).is_relative());
    assert!(!storage_path.contains(fixture.temp_dir.path().to_str().unwrap()));

    for uri in [format!("/checked/{}", key), format!("/{}", storage_path)] {
        let (status, _, bytes) = fixture.get_raw(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], b"checked sheet");
    }

    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_scenario_b_unscored_check() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new()
        .text("evaluate", "false")
        .file("image", "sheet.jpg", &sheet_image());
    let response = fixture.post_check("", form).await;

    assert_status!(response, StatusCode::OK);
    let body = response.body.as_object().unwrap();
    assert_eq!(body["responses"]["q2"], "C");
    assert!(!body.contains_key("score"));
    assert!(!body.contains_key("evaluation"));
    assert!(!fixture.engine.recorded_runs().await[0].had_evaluation);
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_scenario_c_no_markers() {
    let fixture = TestFixture::with_config(TestConfig {
        outcome: MockOutcome::NoMarkers,
        ..Default::default()
    });

    let response = fixture.post_check("", sheet_form()).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["detail"]
        .as_str()
        .unwrap()
        .contains("All four corner markers must be visible"));
    assert_eq!(response.body["type"], "RecognitionFailed");
    assert!(!fixture.templates.checked_dir().exists()
        || std::fs::read_dir(fixture.templates.checked_dir()).unwrap().count() == 0);
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_scenario_d_concurrent_first_use() {
    let fixture = TestFixture::new();
    fixture
        .engine
        .set_delay(std::time::Duration::from_millis(20))
        .await;

    let (a, b) = tokio::join!(
        fixture.post_check("template_id=plain", sheet_form()),
        fixture.post_check("template_id=plain", sheet_form()),
    );
    assert_status!(a, StatusCode::OK);
    assert_status!(b, StatusCode::OK);
    assert_ne!(a.body["request_id"], b.body["request_id"]);

    let runs = fixture.engine.recorded_runs().await;
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].descriptor, runs[1].descriptor);
    assert_eq!(
        runs[0].descriptor.as_deref(),
        Some(omr_gateway_core::testing::TemplateFixture::descriptor("plain").as_slice())
    );
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_upload_ceiling() {
    let max_bytes = 1024 * 1024;
    let fixture = TestFixture::with_config(TestConfig {
        max_bytes: Some(max_bytes),
        ..Default::default()
    });

    let exact = vec![7u8; max_bytes as usize];
    let form = MultipartForm::new().file("image", "big.png", &exact);
    let response = fixture.post_check("", form).await;
    assert_status!(response, StatusCode::OK);

    let over = vec![7u8; max_bytes as usize + 1];
    let form = MultipartForm::new().file("image", "big.png", &over);
    let response = fixture.post_check("", form).await;
    assert_status!(response, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["detail"], "Image too large. Maximum size is 1 MB.");
    assert_eq!(response.body["type"], "PayloadTooLarge");

    assert_eq!(fixture.engine.recorded_runs().await.len(), 1);
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_caller_evaluation_wins_over_evaluate_false() {
    let fixture = TestFixture::new();
    let evaluation = json!({
        "source_type": "custom",
        "options": { "questions_in_order": ["q1"], "answers_in_order": ["D"] },
        "marking_schemes": { "DEFAULT": { "correct": "4", "incorrect": "-1", "unanswered": "0" } }
    });

    let form = MultipartForm::new()
        .text("evaluate", "false")
        .text("evaluation", &evaluation.to_string())
        .file("image", "sheet.png", &sheet_image());
    let response = fixture.post_check("", form).await;

    assert_status!(response, StatusCode::OK);
    assert!(response.body.get("score").is_some());
    let runs = fixture.engine.recorded_runs().await;
    let staged: serde_json::Value =
        serde_json::from_slice(runs[0].evaluation.as_deref().unwrap()).unwrap();
    assert_eq!(staged["options"]["answers_in_order"], json!(["D"]));
}

#[tokio::test]
async fn test_invalid_evaluation_json() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new()
        .text("evaluation", "{not json")
        .file("image", "sheet.png", &sheet_image());
    let response = fixture.post_check("", form).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["type"], "InvalidEvaluationJson");
    assert!(response.body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Invalid evaluation JSON"));
    assert!(fixture.engine.recorded_runs().await.is_empty());
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_evaluation_schema_violation() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new()
        .text("evaluation", r#"{"source_type":"custom","options":{}}"#)
        .file("image", "sheet.png", &sheet_image());
    let response = fixture.post_check("", form).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["type"], "InvalidEvaluationConfig");
    assert!(fixture.engine.recorded_runs().await.is_empty());
}

#[tokio::test]
async fn test_unknown_template() {
    let fixture = TestFixture::new();

    let response = fixture.post_check("template_id=missing", sheet_form()).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["detail"], "Template 'missing' not found");
    assert_eq!(response.body["type"], "TemplateNotFound");
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_form_template_overrides_query() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new()
        .text("template_id", "plain")
        .file("image", "sheet.png", &sheet_image());
    let response = fixture.post_check("template_id=missing", form).await;

    assert_status!(response, StatusCode::OK);
    let runs = fixture.engine.recorded_runs().await;
    assert_eq!(
        runs[0].descriptor.as_deref(),
        Some(omr_gateway_core::testing::TemplateFixture::descriptor("plain").as_slice())
    );
}

#[tokio::test]
async fn test_unsupported_extension() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new().file("image", "sheet.gif", &sheet_image());
    let response = fixture.post_check("", form).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["detail"], "File must be .jpg, .jpeg or .png");
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_non_multipart_body_keeps_error_shape() {
    let fixture = TestFixture::new();

    let response = fixture
        .post_with_content_type("/check", br#"{"image": "sheet.png"}"#, "application/json")
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["type"], "InvalidRequest");
    assert!(response.body["detail"].is_string());
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_duplicate_query_field_keeps_error_shape() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new().file("image", "sheet.png", &sheet_image());
    let response = fixture
        .post_check("template_id=default&template_id=plain", form)
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["type"], "InvalidRequest");
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_every_outcome_is_counted() {
    let fixture = TestFixture::with_config(TestConfig {
        max_bytes: Some(16),
        ..Default::default()
    });
    let counted = |outcome: &str| {
        omr_gateway_core::metrics::CHECKS_TOTAL
            .with_label_values(&[outcome])
            .get()
    };

    let bad_request = counted("bad_request");
    let form = MultipartForm::new().file("image", "sheet.gif", &sheet_image());
    let response = fixture.post_check("", form).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(counted("bad_request") > bad_request);

    let too_large = counted("payload_too_large");
    let form = MultipartForm::new().file("image", "sheet.png", &[0u8; 64]);
    let response = fixture.post_check("", form).await;
    assert_status!(response, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(counted("payload_too_large") > too_large);

    let rejected = counted("bad_request");
    let response = fixture
        .post_with_content_type("/check", b"plain", "text/plain")
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(counted("bad_request") > rejected);
}

#[tokio::test]
async fn test_missing_image() {
    let fixture = TestFixture::new();

    let form = MultipartForm::new().text("template_id", "default");
    let response = fixture.post_check("", form).await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["detail"], "No image provided");
}

#[tokio::test]
async fn test_engine_failure_is_generic_500() {
    let fixture = TestFixture::with_config(TestConfig {
        outcome: MockOutcome::Fail("Traceback (most recent call last): /srv/engine".to_string()),
        ..Default::default()
    });

    let response = fixture.post_check("", sheet_form()).await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["type"], "EngineError");
    assert!(!response.body["detail"].as_str().unwrap().contains("Traceback"));
    assert_eq!(fixture.workspace_entries(), 0);
}

#[tokio::test]
async fn test_missing_checked_image_degrades() {
    let mut sheet = MockSheet::sample();
    sheet.checked_image = None;
    let fixture = TestFixture::with_config(TestConfig {
        outcome: MockOutcome::Recognized(sheet),
        ..Default::default()
    });

    let response = fixture.post_check("", sheet_form()).await;

    assert_status!(response, StatusCode::OK);
    assert!(response.body.get("checked_omr_filename").is_none());
    assert!(response.body.get("checked_omr_path").is_none());
}
