use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::repository::{ApplicationRepository, RepositoryError, RequirementsStore};
use super::service::{IntakeSubmission, KitchenApplicationService, ReviewAction, ServiceError};

/// Router builder exposing the intake endpoints.
pub fn intake_router<R, S>(service: Arc<KitchenApplicationService<R, S>>) -> Router
where
    R: ApplicationRepository + 'static,
    S: RequirementsStore + 'static,
{
    Router::new()
        .route(
            "/api/public/locations/:location_id/requirements",
            get(requirements_handler::<R, S>),
        )
        .route(
            "/api/v1/locations/:location_id/requirements",
            put(configure_requirements_handler::<R, S>),
        )
        .route(
            "/api/v1/locations/:location_id/applications",
            post(submit_handler::<R, S>),
        )
        .route(
            "/api/v1/locations/:location_id/applications/:chef_id",
            get(status_handler::<R, S>),
        )
        .route(
            "/api/v1/locations/:location_id/applications/:chef_id/review",
            post(review_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn requirements_handler<R, S>(
    State(service): State<Arc<KitchenApplicationService<R, S>>>,
    Path(location_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RequirementsStore + 'static,
{
    match service.configured_requirements(&location_id) {
        Ok(Some(document)) => (StatusCode::OK, axum::Json(document)).into_response(),
        Ok(None) => {
            let payload = json!({ "error": "no requirements configured" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn configure_requirements_handler<R, S>(
    State(service): State<Arc<KitchenApplicationService<R, S>>>,
    Path(location_id): Path<String>,
    axum::Json(document): axum::Json<super::requirements::RequirementsDocument>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RequirementsStore + 'static,
{
    match service.configure_requirements(&location_id, document) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, S>(
    State(service): State<Arc<KitchenApplicationService<R, S>>>,
    Path(location_id): Path<String>,
    axum::Json(submission): axum::Json<IntakeSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RequirementsStore + 'static,
{
    match service.submit(&location_id, submission, Utc::now()) {
        Ok(record) => {
            let view =
                super::repository::ApplicationStatusView::for_record(Some(&record));
            (StatusCode::ACCEPTED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, S>(
    State(service): State<Arc<KitchenApplicationService<R, S>>>,
    Path((location_id, chef_id)): Path<(String, String)>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RequirementsStore + 'static,
{
    match service.status(&chef_id, &location_id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    pub(crate) action: ReviewAction,
}

pub(crate) async fn review_handler<R, S>(
    State(service): State<Arc<KitchenApplicationService<R, S>>>,
    Path((location_id, chef_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: RequirementsStore + 'static,
{
    match service.review(&chef_id, &location_id, request.action, Utc::now()) {
        Ok(record) => {
            let view =
                super::repository::ApplicationStatusView::for_record(Some(&record));
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::Gate(_) | ServiceError::Spec(_) | ServiceError::InvalidTier(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ServiceError::PendingReview | ServiceError::AlreadyApproved => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = match &error {
        ServiceError::Gate(super::submission::SubmissionError::Invalid(errors)) => {
            let fields: serde_json::Map<String, serde_json::Value> = errors
                .iter()
                .map(|(key, message)| (key.to_string(), json!(message)))
                .collect();
            json!({ "error": error.to_string(), "fields": fields })
        }
        _ => json!({ "error": error.to_string() }),
    };

    (status, axum::Json(body)).into_response()
}
