use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::intake::domain::{ApplicationStatus, FormValues};
use crate::workflows::intake::form::AttachedFiles;
use crate::workflows::intake::router::intake_router;
use crate::workflows::intake::service::{ReviewAction, ServiceError};
use crate::workflows::intake::submission::SubmissionError;

fn submission_body() -> serde_json::Value {
    // The submit route stamps the current wall-clock date, so the expiry sits
    // far enough out to clear the six-month gate on any run date.
    json!({
        "chefId": "chef-7",
        "tier": 1,
        "values": {
            "firstName": "Maria",
            "email": "maria@ortizcatering.test",
            "foodHandlerCertExpiry": "2099-01-01",
            "termsAgree": true,
            "accuracyAgree": true,
        },
        "attachments": {
            "foodHandler": {
                "name": "handler-cert.pdf",
                "contentType": "application/pdf",
                "sizeBytes": 4096,
            }
        }
    })
}

async fn post_json(
    router: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> axum::response::Response {
    router
        .oneshot(
            axum::http::Request::post(uri)
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&body).expect("serializable body"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes")
}

async fn get(router: axum::Router, uri: &str) -> axum::response::Response {
    router
        .oneshot(
            axum::http::Request::get(uri)
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes")
}

#[tokio::test]
async fn requirements_endpoint_returns_404_until_configured() {
    let (service, _, store) = build_service();
    let router = intake_router(service.clone());
    let response = get(
        router.clone(),
        "/api/public/locations/loc-des-moines/requirements",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    use crate::workflows::intake::repository::RequirementsStore;
    store
        .put("loc-des-moines", minimal_requirements())
        .expect("store accepts");
    let response = get(
        router,
        "/api/public/locations/loc-des-moines/requirements",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["requireFirstName"], json!(true));
    assert_eq!(payload["requirePhone"], json!(false));
}

#[tokio::test]
async fn configure_endpoint_rejects_select_without_options() {
    let (service, _, _) = build_service();
    let router = intake_router(service);

    let document = json!({
        "tierOneFields": [
            { "id": "cuisine", "label": "Cuisine", "type": "select", "required": true }
        ]
    });
    let response = router
        .oneshot(
            axum::http::Request::put("/api/v1/locations/loc-des-moines/requirements")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&document).expect("serializable body"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("option"));
}

#[tokio::test]
async fn submit_route_accepts_a_minimal_application() {
    let (service, _, store) = build_service();
    use crate::workflows::intake::repository::RequirementsStore;
    store
        .put("loc-des-moines", minimal_requirements())
        .expect("store accepts");
    let router = intake_router(service);

    let response = post_json(
        router,
        "/api/v1/locations/loc-des-moines/applications",
        submission_body(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("in_review"));
    assert_eq!(payload["view"], json!("pending_review"));
}

#[tokio::test]
async fn submit_route_surfaces_field_errors() {
    let (service, _, store) = build_service();
    use crate::workflows::intake::repository::RequirementsStore;
    store
        .put("loc-des-moines", minimal_requirements())
        .expect("store accepts");
    let router = intake_router(service);

    let mut body = submission_body();
    body["values"]["email"] = json!("");
    let response = post_json(
        router,
        "/api/v1/locations/loc-des-moines/applications",
        body,
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["fields"]["email"]
        .as_str()
        .unwrap_or_default()
        .contains("required"));
}

fn seed_requirements(store: &MemoryRequirements) {
    use crate::workflows::intake::repository::RequirementsStore;
    store
        .put("loc-des-moines", minimal_requirements())
        .expect("store accepts");
}

#[tokio::test]
async fn second_submission_conflicts_while_in_review() {
    let (service, _, store) = build_service();
    seed_requirements(&store);
    service
        .submit("loc-des-moines", minimal_submission("chef-7"), now())
        .expect("first submission");

    let router = intake_router(service);
    let response = post_json(
        router,
        "/api/v1/locations/loc-des-moines/applications",
        submission_body(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn review_endpoint_advances_status() {
    let (service, _, store) = build_service();
    seed_requirements(&store);
    service
        .submit("loc-des-moines", minimal_submission("chef-7"), now())
        .expect("submission");

    let router = intake_router(service.clone());
    let response = post_json(
        router,
        "/api/v1/locations/loc-des-moines/applications/chef-7/review",
        json!({ "action": "approve" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("approved"));
    assert_eq!(payload["effectiveTier"], json!(2));
}

#[tokio::test]
async fn review_of_a_missing_application_is_not_found() {
    let (service, _, _) = build_service();
    let error = service
        .review("chef-404", "loc-des-moines", ReviewAction::Approve, now())
        .expect_err("no record");
    assert!(matches!(
        error,
        crate::workflows::intake::service::ServiceError::Repository(
            crate::workflows::intake::repository::RepositoryError::NotFound
        )
    ));
}

#[tokio::test]
async fn status_endpoint_reports_fresh_applicants() {
    let (service, _, _) = build_service();
    let router = intake_router(service);
    let response = get(
        router,
        "/api/v1/locations/loc-des-moines/applications/chef-unknown",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["view"], json!("form"));
    assert_eq!(payload["tier"], json!(1));
}

#[tokio::test]
async fn rejected_chef_can_reapply() {
    let (service, _, store) = build_service();
    seed_requirements(&store);
    service
        .submit("loc-des-moines", minimal_submission("chef-7"), now())
        .expect("submission");
    service
        .review("chef-7", "loc-des-moines", ReviewAction::Reject, now())
        .expect("rejection");

    let status = service
        .status("chef-7", "loc-des-moines")
        .expect("status view");
    assert_eq!(status.status, Some("rejected"));

    let record = service
        .submit("loc-des-moines", minimal_submission("chef-7"), now())
        .expect("re-application accepted");
    assert_eq!(record.status, ApplicationStatus::InReview);
    assert_eq!(record.current_tier, 1);
}

#[tokio::test]
async fn tier_omitted_reapplication_restarts_at_tier_one() {
    let (service, _, store) = build_service();
    seed_requirements(&store);
    service
        .submit("loc-des-moines", minimal_submission("chef-7"), now())
        .expect("tier 1 submission");
    service
        .review("chef-7", "loc-des-moines", ReviewAction::Approve, now())
        .expect("tier 1 approval");

    let mut tier_two = minimal_submission("chef-7");
    tier_two.tier = Some(2);
    service
        .submit("loc-des-moines", tier_two, now())
        .expect("tier 2 submission");
    service
        .review("chef-7", "loc-des-moines", ReviewAction::Reject, now())
        .expect("tier 2 rejection");

    // With the tier omitted, an empty re-application must meet the tier 1
    // schema and gates rather than slipping through at tier 2.
    let mut empty = minimal_submission("chef-7");
    empty.tier = None;
    empty.values = FormValues::new();
    empty.attachments = AttachedFiles::default();
    let error = service
        .submit("loc-des-moines", empty, now())
        .expect_err("tier 1 validation applies");
    assert!(matches!(
        error,
        ServiceError::Gate(SubmissionError::Invalid(_))
    ));

    let mut reapply = minimal_submission("chef-7");
    reapply.tier = None;
    let record = service
        .submit("loc-des-moines", reapply, now())
        .expect("re-application accepted");
    assert_eq!(record.current_tier, 1);
    assert_eq!(record.status, ApplicationStatus::InReview);
}
