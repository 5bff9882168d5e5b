use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{EnrollmentFilter, EnrollmentId, EnrollmentSubmission, PaymentUpdate};
use super::repository::EnrollmentRepository;
use super::service::{EnrollmentService, EnrollmentServiceError, EnrollmentValidationError};
use crate::academy::repository::RepositoryError;
use crate::admin::{require_admin, AdminAuthenticator};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) status: EnrollmentFilter,
}

/// Public submission plus the admin-only listing, lookup, and fee update.
pub fn enrollment_router<R>(
    service: Arc<EnrollmentService<R>>,
    admin: AdminAuthenticator,
) -> Router
where
    R: EnrollmentRepository + 'static,
{
    let guard = middleware::from_fn_with_state(admin, require_admin);

    Router::new()
        .route(
            "/api/enrollments",
            post(submit_handler::<R>).merge(get(list_handler::<R>).route_layer(guard.clone())),
        )
        .route(
            "/api/enrollments/:id",
            get(detail_handler::<R>).route_layer(guard.clone()),
        )
        .route(
            "/api/enrollments/:id/payment",
            patch(payment_handler::<R>).route_layer(guard),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<EnrollmentService<R>>>,
    Json(submission): Json<EnrollmentSubmission>,
) -> Response
where
    R: EnrollmentRepository + 'static,
{
    match service.submit(submission, Utc::now()) {
        Ok(enrollment) => (StatusCode::CREATED, Json(enrollment.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<EnrollmentService<R>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: EnrollmentRepository + 'static,
{
    match service.list(query.status) {
        Ok(enrollments) => {
            let views: Vec<_> = enrollments.iter().map(|enrollment| enrollment.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<EnrollmentService<R>>>,
    Path(id): Path<String>,
) -> Response
where
    R: EnrollmentRepository + 'static,
{
    let Ok(id) = id.parse::<EnrollmentId>() else {
        return invalid_id(&id);
    };
    match service.get(&id) {
        Ok(enrollment) => (StatusCode::OK, Json(enrollment.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn payment_handler<R>(
    State(service): State<Arc<EnrollmentService<R>>>,
    Path(id): Path<String>,
    Json(update): Json<PaymentUpdate>,
) -> Response
where
    R: EnrollmentRepository + 'static,
{
    let Ok(id) = id.parse::<EnrollmentId>() else {
        return invalid_id(&id);
    };
    match service.update_payment(&id, update, Utc::now()) {
        Ok(enrollment) => {
            let payload = json!({
                "success": true,
                "data": enrollment.view(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn invalid_id(raw: &str) -> Response {
    let payload = json!({
        "error": format!("'{raw}' is not a valid enrollment id"),
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn error_response(error: EnrollmentServiceError) -> Response {
    let status = match &error {
        EnrollmentServiceError::Validation(validation) => match validation {
            EnrollmentValidationError::MissingField { .. }
            | EnrollmentValidationError::InvalidCpf
            | EnrollmentValidationError::Eligibility(_) => StatusCode::BAD_REQUEST,
            EnrollmentValidationError::NoClassAvailable { .. }
            | EnrollmentValidationError::ClassNotSelected
            | EnrollmentValidationError::ClassNotEligible { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            EnrollmentValidationError::DuplicateCpf => StatusCode::CONFLICT,
        },
        EnrollmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EnrollmentServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EnrollmentServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
