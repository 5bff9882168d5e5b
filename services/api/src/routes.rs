use crate::infra::{deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use corpus_maria::academy::classes::{ClassSessionDescriptor, Eligibility};
use corpus_maria::academy::enrollment::{
    enrollment_router, EnrollmentFilter, EnrollmentRepository, EnrollmentService,
};
use corpus_maria::academy::finance::{dashboard, summarize, DashboardView, FinanceSummary};
use corpus_maria::academy::payment::{
    confirmation, notify_academy, EnrollmentNotice, PaymentConfirmation, WhatsappLink,
};
use corpus_maria::academy::tuition::{
    tuition_router, BillingPeriod, MonthlyPaymentRepository, TuitionService,
};
use corpus_maria::academy::{InMemoryEnrollmentRepository, InMemoryMonthlyPaymentRepository};
use corpus_maria::admin::{admin_router, require_admin, AdminAuthenticator};
use corpus_maria::error::AppError;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) type Enrollments = EnrollmentService<InMemoryEnrollmentRepository>;
pub(crate) type Tuition =
    TuitionService<InMemoryEnrollmentRepository, InMemoryMonthlyPaymentRepository>;

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityQuery {
    pub(crate) birth_date: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FinanceQuery {
    #[serde(default)]
    pub(crate) month: Option<u32>,
    #[serde(default)]
    pub(crate) year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    #[serde(default)]
    pub(crate) status: EnrollmentFilter,
}

pub(crate) fn with_academy_routes(
    enrollments: Arc<Enrollments>,
    tuition: Arc<Tuition>,
    admin: AdminAuthenticator,
) -> axum::Router {
    let guard = middleware::from_fn_with_state(admin.clone(), require_admin);

    enrollment_router(enrollments, admin.clone())
        .merge(tuition_router(tuition, admin.clone()))
        .merge(admin_router(admin))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/classes", get(classes_endpoint))
        .route("/api/classes/eligibility", get(eligibility_endpoint))
        .route("/api/send-whatsapp", post(send_whatsapp_endpoint))
        .route("/api/confirmation", get(confirmation_endpoint))
        .route(
            "/api/admin/finance",
            get(finance_endpoint).route_layer(guard.clone()),
        )
        .route(
            "/api/admin/dashboard",
            get(dashboard_endpoint).route_layer(guard),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn classes_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<ClassSessionDescriptor>> {
    Json(state.resolver.schedule().descriptors())
}

pub(crate) async fn eligibility_endpoint(
    Extension(state): Extension<AppState>,
    query: axum::extract::Query<EligibilityQuery>,
) -> Result<Json<Eligibility>, AppError> {
    let EligibilityQuery { birth_date, today } = query.0;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let eligibility = state.resolver.resolve(&birth_date, today)?;
    Ok(Json(eligibility))
}

pub(crate) async fn send_whatsapp_endpoint(
    Extension(state): Extension<AppState>,
    Json(notice): Json<EnrollmentNotice>,
) -> Result<Json<WhatsappLink>, AppError> {
    Ok(Json(notify_academy(&state.academy, &notice)?))
}

pub(crate) async fn confirmation_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<PaymentConfirmation>, AppError> {
    Ok(Json(confirmation(&state.academy)?))
}

pub(crate) async fn finance_endpoint(
    Extension(state): Extension<AppState>,
    query: axum::extract::Query<FinanceQuery>,
) -> Result<Response, AppError> {
    let current = BillingPeriod::containing(Local::now().date_naive());
    let month = query.month.unwrap_or(current.month);
    let Some(period) = BillingPeriod::new(month, query.year.unwrap_or(current.year)) else {
        let payload = json!({ "error": format!("month must be between 1 and 12 (got {month})") });
        return Ok((StatusCode::BAD_REQUEST, Json(payload)).into_response());
    };

    let enrollments = state.enrollments.all()?;
    let payments = state.payments.all()?;
    let summary: FinanceSummary =
        summarize(&enrollments, &payments, state.academy.enrollment_fee, period);
    Ok(Json(summary).into_response())
}

pub(crate) async fn dashboard_endpoint(
    Extension(state): Extension<AppState>,
    query: axum::extract::Query<DashboardQuery>,
) -> Result<Json<DashboardView>, AppError> {
    let enrollments = state.enrollments.all()?;
    let payments = state.payments.all()?;
    Ok(Json(dashboard(
        &enrollments,
        &payments,
        query.status,
        state.academy.enrollment_fee,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Query;
    use axum::http::Request;
    use corpus_maria::academy::classes::{ClassEligibilityResolver, NO_CLASS_AVAILABLE_MESSAGE};
    use corpus_maria::academy::Money;
    use corpus_maria::config::{AcademyConfig, AdminConfig};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            academy: Arc::new(AcademyConfig::default()),
            resolver: ClassEligibilityResolver::default(),
            enrollments: Arc::new(InMemoryEnrollmentRepository::default()),
            payments: Arc::new(InMemoryMonthlyPaymentRepository::default()),
        }
    }

    fn date(raw: &str) -> NaiveDate {
        crate::infra::parse_date(raw).expect("valid date")
    }

    fn app(state: &AppState, admin: AdminAuthenticator) -> axum::Router {
        crate::server::build_app(state.clone(), admin)
    }

    #[tokio::test]
    async fn eligibility_endpoint_resolves_reference_date() {
        let query = EligibilityQuery {
            birth_date: "2019-03-10".to_string(),
            today: Some(date("2025-03-09")),
        };
        let Json(body) = eligibility_endpoint(Extension(state()), Query(query))
            .await
            .expect("resolves");

        assert_eq!(body.age, 5);
        assert_eq!(body.classes.len(), 3);
        assert!(body.message.is_none());
    }

    #[tokio::test]
    async fn eligibility_endpoint_returns_message_for_uncovered_age() {
        let query = EligibilityQuery {
            birth_date: "2000-01-01".to_string(),
            today: Some(date("2025-03-10")),
        };
        let Json(body) = eligibility_endpoint(Extension(state()), Query(query))
            .await
            .expect("resolves");

        assert!(body.classes.is_empty());
        assert_eq!(body.message, Some(NO_CLASS_AVAILABLE_MESSAGE));
    }

    #[tokio::test]
    async fn eligibility_endpoint_rejects_future_birth_dates() {
        let query = EligibilityQuery {
            birth_date: "2025-03-11".to_string(),
            today: Some(date("2025-03-10")),
        };
        let error = eligibility_endpoint(Extension(state()), Query(query))
            .await
            .expect_err("rejected");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn confirmation_endpoint_reports_configured_fee() {
        let mut state = state();
        state.academy = Arc::new(AcademyConfig {
            enrollment_fee: Money::from_cents(9_550),
            ..AcademyConfig::default()
        });

        let Json(body) = confirmation_endpoint(Extension(state))
            .await
            .expect("confirmation");
        assert_eq!(body.enrollment_fee_label, "R$ 95,50");
    }

    #[tokio::test]
    async fn classes_and_ops_routes_are_public() {
        let state = state();
        let app = app(&state, AdminAuthenticator::new(AdminConfig::default()));

        for uri in ["/health", "/ready", "/metrics", "/api/classes", "/api/confirmation"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
                .await
                .expect("route executes");
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }

        let response = app
            .oneshot(
                Request::get("/api/classes/eligibility?birth_date=2008-01-01&today=2025-06-01")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["age"], 17);
        assert_eq!(
            body["classes"][0]["label"],
            "Segunda-feira, 19:30 às 20:30 (13 a 17 anos)"
        );
    }

    #[tokio::test]
    async fn send_whatsapp_route_builds_link() {
        let state = state();
        let app = app(&state, AdminAuthenticator::new(AdminConfig::default()));
        let payload = json!({
            "student_name": "Helena",
            "responsible_phone": "54999010633",
            "selected_class": "Terça-feira, 09:30 às 10:30 (4, 5 e 6 anos)",
            "age": 5,
            "cpf": "12345678900",
        });

        let response = app
            .oneshot(
                Request::post("/api/send-whatsapp")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["success"], true);
        assert!(body["whatsapp_link"]
            .as_str()
            .expect("link")
            .starts_with("https://wa.me/5499910633?text="));
    }

    #[tokio::test]
    async fn finance_routes_require_admin_session() {
        let state = state();
        let admin = AdminAuthenticator::new(AdminConfig {
            email: Some("direcao@corpusmaria.com.br".to_string()),
            password: Some("arabesque".to_string()),
            session_ttl_minutes: 15,
        });
        let session = admin
            .login("direcao@corpusmaria.com.br", "arabesque", chrono::Utc::now())
            .expect("login");
        let app = app(&state, admin);

        let anonymous = app
            .clone()
            .oneshot(
                Request::get("/api/admin/finance")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        for uri in [
            "/api/admin/finance?month=3&year=2025",
            "/api/admin/dashboard?status=pending",
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::get(uri)
                        .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("route executes");
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }

        let invalid_month = app
            .oneshot(
                Request::get("/api/admin/finance?month=13")
                    .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(invalid_month.status(), StatusCode::BAD_REQUEST);
    }
}
