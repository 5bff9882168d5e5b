use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    BillingPeriod, MonthlyPaymentId, MonthlyPaymentQuery, MonthlyPaymentUpdate, NewMonthlyPayment,
};
use super::repository::MonthlyPaymentRepository;
use super::service::{TuitionService, TuitionServiceError};
use crate::academy::enrollment::EnrollmentRepository;
use crate::academy::repository::RepositoryError;
use crate::admin::{require_admin, AdminAuthenticator};

/// Period to bill; omitted fields default to the current local month.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateRequest {
    #[serde(default)]
    pub(crate) month: Option<u32>,
    #[serde(default)]
    pub(crate) year: Option<i32>,
}

/// Admin-only tuition endpoints.
pub fn tuition_router<E, P>(
    service: Arc<TuitionService<E, P>>,
    admin: AdminAuthenticator,
) -> Router
where
    E: EnrollmentRepository + 'static,
    P: MonthlyPaymentRepository + 'static,
{
    Router::new()
        .route(
            "/api/monthly-payments",
            get(list_handler::<E, P>).post(create_handler::<E, P>),
        )
        .route(
            "/api/monthly-payments/generate",
            post(generate_handler::<E, P>),
        )
        .route("/api/monthly-payments/:id", patch(update_handler::<E, P>))
        .route_layer(middleware::from_fn_with_state(admin, require_admin))
        .with_state(service)
}

pub(crate) async fn list_handler<E, P>(
    State(service): State<Arc<TuitionService<E, P>>>,
    Query(query): Query<MonthlyPaymentQuery>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    P: MonthlyPaymentRepository + 'static,
{
    match service.list(&query) {
        Ok(payments) => (StatusCode::OK, Json(payments)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<E, P>(
    State(service): State<Arc<TuitionService<E, P>>>,
    Json(request): Json<NewMonthlyPayment>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    P: MonthlyPaymentRepository + 'static,
{
    match service.create(request, Utc::now()) {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<E, P>(
    State(service): State<Arc<TuitionService<E, P>>>,
    Path(id): Path<String>,
    Json(update): Json<MonthlyPaymentUpdate>,
) -> Response
where
    E: EnrollmentRepository + 'static,
    P: MonthlyPaymentRepository + 'static,
{
    let Ok(id) = id.parse::<MonthlyPaymentId>() else {
        let payload = json!({
            "error": format!("'{id}' is not a valid monthly payment id"),
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    match service.update(&id, update, Utc::now()) {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn generate_handler<E, P>(
    State(service): State<Arc<TuitionService<E, P>>>,
    body: Bytes,
) -> Response
where
    E: EnrollmentRepository + 'static,
    P: MonthlyPaymentRepository + 'static,
{
    // Only an absent body means "current month"; a body must parse.
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        match serde_json::from_slice::<GenerateRequest>(&body) {
            Ok(request) => request,
            Err(err) => {
                let payload = json!({
                    "error": format!("invalid generate request: {err}"),
                });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        }
    };

    let now = Utc::now();
    let current = BillingPeriod::containing(now.with_timezone(&Local).date_naive());
    let month = request.month.unwrap_or(current.month);
    let Some(period) = BillingPeriod::new(month, request.year.unwrap_or(current.year)) else {
        return error_response(TuitionServiceError::InvalidMonth(month));
    };

    match service.generate_missing(period, now) {
        Ok(created) => {
            let payload = json!({
                "success": true,
                "period": period.to_string(),
                "created": created.len(),
                "data": created,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: TuitionServiceError) -> Response {
    let status = match &error {
        TuitionServiceError::MissingFields(_) | TuitionServiceError::InvalidMonth(_) => {
            StatusCode::BAD_REQUEST
        }
        TuitionServiceError::UnknownEnrollment(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TuitionServiceError::AlreadyBilled { .. }
        | TuitionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        TuitionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        TuitionServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
