use crate::cli::ServeArgs;
use crate::infra::{load_schedule, AppState};
use crate::routes::with_academy_routes;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use corpus_maria::academy::classes::ClassEligibilityResolver;
use corpus_maria::academy::enrollment::EnrollmentService;
use corpus_maria::academy::tuition::TuitionService;
use corpus_maria::academy::{InMemoryEnrollmentRepository, InMemoryMonthlyPaymentRepository};
use corpus_maria::admin::AdminAuthenticator;
use corpus_maria::config::AppConfig;
use corpus_maria::error::AppError;
use corpus_maria::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.schedule_csv.take() {
        config.academy.schedule_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let schedule = load_schedule(config.academy.schedule_csv.as_deref())?;
    if !config.admin.login_enabled() {
        warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set; back-office login is disabled");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        academy: Arc::new(config.academy.clone()),
        resolver: ClassEligibilityResolver::new(schedule),
        enrollments: Arc::new(InMemoryEnrollmentRepository::default()),
        payments: Arc::new(InMemoryMonthlyPaymentRepository::default()),
    };
    let admin = AdminAuthenticator::new(config.admin.clone());

    let app = build_app(app_state, admin).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "corpus maria enrollment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Services share the stores held by `state`, so the finance routes see what the
/// enrollment and tuition routes write.
pub(crate) fn build_app(state: AppState, admin: AdminAuthenticator) -> Router {
    let enrollments = Arc::new(EnrollmentService::new(
        state.enrollments.clone(),
        state.resolver.clone(),
    ));
    let tuition = Arc::new(TuitionService::new(
        state.enrollments.clone(),
        state.payments.clone(),
        state.academy.monthly_tuition,
    ));

    with_academy_routes(enrollments, tuition, admin).layer(Extension(state))
}
