mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{send, test_app, valid_submission, MockMailer, ADMIN_EMAIL};
use portfolio_backend::model::quote::{
    Budget, NewQuoteRequest, Priority, ProjectType, QuoteRequest, QuoteStatus, Timeline,
};

const SUBMIT: &str = "/api/v1/marketplace/quote-request";
const QUOTES: &str = "/api/v1/admin/marketplace/quotes";

fn stored_quote(name: &str, status: QuoteStatus, created_at: &str) -> QuoteRequest {
    let mut quote = QuoteRequest::new(
        NewQuoteRequest {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            company: None,
            project_type: ProjectType::Saas,
            budget: Budget::Under5k,
            timeline: Timeline::Flexible,
            features: vec![],
            description: "x".repeat(30),
        },
        created_at,
    );
    quote.status = status;
    quote
}

fn names(body: &Value) -> Vec<String> {
    body["data"]["quotes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn submit_without_description_is_rejected() {
    let app = test_app(None);
    let mut payload = valid_submission();
    payload.as_object_mut().unwrap().remove("description");

    let (status, body) = send(&app.router, "POST", SUBMIT, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Please provide all required fields: description");
    assert!(app.repo.all().is_empty());
}

#[tokio::test]
async fn submit_valid_payload_normalizes_email() {
    let app = test_app(None);
    let mut payload = valid_submission();
    payload["email"] = json!("  Ada@Example.COM ");

    let (status, body) = send(&app.router, "POST", SUBMIT, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Quote request submitted successfully. We'll get back to you within 24-48 hours."
    );
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["projectType"], "web-app");
    assert_eq!(body["data"]["id"].as_str().unwrap().len(), 24);
}

#[tokio::test]
async fn minimal_submission_is_stored_pending_with_medium_priority() {
    let app = test_app(None);
    let payload = json!({
        "name": "A",
        "email": "a@b.com",
        "projectType": "web-app",
        "budget": "5000-15000",
        "timeline": "1-2",
        "description": "x".repeat(25),
    });

    let (status, _) = send(&app.router, "POST", SUBMIT, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = app.repo.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, QuoteStatus::Pending);
    assert_eq!(stored[0].priority, Priority::Medium);
    assert!(stored[0].contacted_at.is_none());
    assert!(stored[0].completed_at.is_none());
}

#[tokio::test]
async fn submit_rejects_invalid_enum_and_short_description() {
    let app = test_app(None);

    let mut payload = valid_submission();
    payload["budget"] = json!("one-million");
    let (status, body) = send(&app.router, "POST", SUBMIT, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("budget"));

    let mut payload = valid_submission();
    payload["description"] = json!("too short");
    let (status, _) = send(&app.router, "POST", SUBMIT, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.repo.all().is_empty());
}

#[tokio::test]
async fn submit_with_malformed_json_is_bad_request() {
    let app = test_app(None);
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(SUBMIT)
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let resp = tower::ServiceExt::oneshot(app.router.clone(), req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_sends_confirmation_and_alert() {
    let mailer = MockMailer::default();
    let app = test_app(Some(mailer.clone()));

    let (status, _) = send(&app.router, "POST", SUBMIT, Some(valid_submission())).await;
    assert_eq!(status, StatusCode::CREATED);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "ada@example.com");
    assert_eq!(sent[1].to, ADMIN_EMAIL);
    assert!(sent[1].subject.contains("Ada Lovelace"));
}

#[tokio::test]
async fn submit_succeeds_when_mailer_fails() {
    let app = test_app(Some(MockMailer::failing()));
    let (status, _) = send(&app.router, "POST", SUBMIT, Some(valid_submission())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.repo.all().len(), 1);
}

#[tokio::test]
async fn contacted_twice_keeps_first_stamp() {
    let app = test_app(None);
    let id = app.repo.insert(stored_quote("Ada", QuoteStatus::Pending, "2025-01-01T00:00:00.000Z"));
    let uri = format!("{}/{}", QUOTES, id.to_hex());

    let (status, first) = send(&app.router, "PUT", &uri, Some(json!({ "status": "contacted" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["message"], "Quote request updated successfully");
    let stamped = first["data"]["quote"]["contactedAt"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, second) = send(&app.router, "PUT", &uri, Some(json!({ "status": "contacted" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["quote"]["contactedAt"], stamped.as_str());
    assert_ne!(second["data"]["quote"]["updatedAt"], first["data"]["quote"]["updatedAt"]);
}

#[tokio::test]
async fn completed_after_contacted_sets_completed_only() {
    let app = test_app(None);
    let id = app.repo.insert(stored_quote("Ada", QuoteStatus::Pending, "2025-01-01T00:00:00.000Z"));
    let uri = format!("{}/{}", QUOTES, id.to_hex());

    let (_, contacted) = send(&app.router, "PUT", &uri, Some(json!({ "status": "contacted" }))).await;
    let contacted_at = contacted["data"]["quote"]["contactedAt"].clone();
    assert!(contacted["data"]["quote"]["completedAt"].is_null());

    let (status, completed) = send(&app.router, "PUT", &uri, Some(json!({ "status": "completed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["data"]["quote"]["status"], "completed");
    assert_eq!(completed["data"]["quote"]["contactedAt"], contacted_at);
    assert!(completed["data"]["quote"]["completedAt"].is_string());
}

#[tokio::test]
async fn update_other_fields_and_validation() {
    let app = test_app(None);
    let id = app.repo.insert(stored_quote("Ada", QuoteStatus::Pending, "2025-01-01T00:00:00.000Z"));
    let uri = format!("{}/{}", QUOTES, id.to_hex());

    let (status, body) = send(
        &app.router,
        "PUT",
        &uri,
        Some(json!({ "priority": "high", "adminNotes": "Call on Monday", "estimatedValue": 8000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quote"]["priority"], "high");
    assert_eq!(body["data"]["quote"]["adminNotes"], "Call on Monday");
    assert_eq!(body["data"]["quote"]["estimatedValue"], 8000.0);
    assert_eq!(body["data"]["quote"]["status"], "pending");

    let (status, _) = send(&app.router, "PUT", &uri, Some(json!({ "status": "archived" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app.router, "PUT", &uri, Some(json!({ "estimatedValue": -5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_by_status_and_counts_all_statuses() {
    let app = test_app(None);
    app.repo.insert(stored_quote("Ada", QuoteStatus::Completed, "2025-01-01T00:00:00.000Z"));
    app.repo.insert(stored_quote("Bob", QuoteStatus::Pending, "2025-01-02T00:00:00.000Z"));
    app.repo.insert(stored_quote("Cy", QuoteStatus::Completed, "2025-01-03T00:00:00.000Z"));
    app.repo.insert(stored_quote("Di", QuoteStatus::Rejected, "2025-01-04T00:00:00.000Z"));

    let (status, body) = send(&app.router, "GET", &format!("{}?status=completed", QUOTES), None).await;
    assert_eq!(status, StatusCode::OK);
    let quotes = body["data"]["quotes"].as_array().unwrap();
    assert_eq!(quotes.len(), 2);
    assert!(quotes.iter().all(|q| q["status"] == "completed"));
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let counts = body["data"]["statusCounts"].as_object().unwrap();
    assert_eq!(counts.len(), 6);
    let sum: u64 = counts.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(sum, 4);
    assert_eq!(counts["completed"], 2);
    assert_eq!(counts["contacted"], 0);
}

#[tokio::test]
async fn list_paginates_newest_first() {
    let app = test_app(None);
    app.repo.insert(stored_quote("Ada", QuoteStatus::Pending, "2025-01-01T00:00:00.000Z"));
    app.repo.insert(stored_quote("Bob", QuoteStatus::Pending, "2025-01-02T00:00:00.000Z"));
    app.repo.insert(stored_quote("Cy", QuoteStatus::Pending, "2025-01-03T00:00:00.000Z"));

    let (status, body) = send(&app.router, "GET", &format!("{}?page=2&limit=1", QUOTES), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Bob".to_string()]);
    assert_eq!(body["data"]["pagination"]["pages"], 3);
    assert_eq!(body["data"]["pagination"]["page"], 2);
    assert_eq!(body["data"]["pagination"]["limit"], 1);

    let (_, body) = send(&app.router, "GET", QUOTES, None).await;
    assert_eq!(names(&body), vec!["Cy".to_string(), "Bob".to_string(), "Ada".to_string()]);

    let (_, body) = send(&app.router, "GET", &format!("{}?sort=name", QUOTES), None).await;
    assert_eq!(names(&body), vec!["Ada".to_string(), "Bob".to_string(), "Cy".to_string()]);
}

#[tokio::test]
async fn list_clamps_limit_and_rejects_unknown_sort() {
    let app = test_app(None);
    app.repo.insert(stored_quote("Ada", QuoteStatus::Pending, "2025-01-01T00:00:00.000Z"));

    let (status, body) = send(&app.router, "GET", &format!("{}?limit=1000&page=0", QUOTES), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["limit"], 100);
    assert_eq!(body["data"]["pagination"]["page"], 1);

    let (status, body) = send(&app.router, "GET", &format!("{}?page={}", QUOTES, u64::MAX), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(names(&body).is_empty());
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (status, body) = send(&app.router, "GET", &format!("{}?sort=-password", QUOTES), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn list_search_is_case_insensitive_and_literal() {
    let app = test_app(None);
    app.repo.insert(stored_quote("Ada", QuoteStatus::Pending, "2025-01-01T00:00:00.000Z"));
    let mut dotted = stored_quote("Bob", QuoteStatus::Pending, "2025-01-02T00:00:00.000Z");
    dotted.company = Some("B.O.B Studio".to_string());
    app.repo.insert(dotted);

    let (_, body) = send(&app.router, "GET", &format!("{}?search=ADA", QUOTES), None).await;
    assert_eq!(names(&body), vec!["Ada".to_string()]);

    let (_, body) = send(&app.router, "GET", &format!("{}?search=b.o.b", QUOTES), None).await;
    assert_eq!(names(&body), vec!["Bob".to_string()]);

    let (_, body) = send(&app.router, "GET", &format!("{}?search=.%2A", QUOTES), None).await;
    assert!(names(&body).is_empty());
}

#[tokio::test]
async fn get_rejects_bad_id_and_reports_missing() {
    let app = test_app(None);
    let (status, body) = send(&app.router, "GET", &format!("{}/not-an-id", QUOTES), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid quote id");

    let (status, body) = send(&app.router, "GET", &format!("{}/507f1f77bcf86cd799439011", QUOTES), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Quote request not found");
}

#[tokio::test]
async fn delete_missing_then_existing() {
    let app = test_app(None);
    let (status, _) = send(&app.router, "DELETE", &format!("{}/507f1f77bcf86cd799439011", QUOTES), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = app.repo.insert(stored_quote("Ada", QuoteStatus::Pending, "2025-01-01T00:00:00.000Z"));
    let uri = format!("{}/{}", QUOTES, id.to_hex());

    let (status, body) = send(&app.router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quote"]["id"], id.to_hex());

    let (status, body) = send(&app.router, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Quote request deleted successfully");
    assert!(body["data"].is_null());

    let (status, _) = send(&app.router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_on_empty_store_are_zeroed() {
    let app = test_app(None);
    let (status, body) = send(&app.router, "GET", &format!("{}/stats", QUOTES), None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totals"], json!({ "count": 0, "totalValue": 0.0, "avgValue": 0.0 }));
    assert!(data["byStatus"].as_object().unwrap().is_empty());
    assert!(data["recent"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stats_group_and_total() {
    let app = test_app(None);
    for (i, status) in [QuoteStatus::Pending, QuoteStatus::Pending, QuoteStatus::Completed]
        .into_iter()
        .enumerate()
    {
        let mut quote = stored_quote(&format!("Q{}", i), status, &format!("2025-01-0{}T00:00:00.000Z", i + 1));
        quote.estimated_value = Some(1000.0 * (i as f64 + 1.0));
        app.repo.insert(quote);
    }

    let (status, body) = send(&app.router, "GET", &format!("{}/stats", QUOTES), None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["byStatus"]["pending"], 2);
    assert_eq!(data["byStatus"]["completed"], 1);
    assert_eq!(data["byProjectType"]["saas"], 3);
    assert_eq!(data["totals"]["count"], 3);
    assert_eq!(data["totals"]["totalValue"], 6000.0);
    assert_eq!(data["totals"]["avgValue"], 2000.0);
    assert_eq!(data["recent"][0]["name"], "Q2");
}

#[tokio::test]
async fn health_check() {
    let app = test_app(None);
    let (status, body) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}
