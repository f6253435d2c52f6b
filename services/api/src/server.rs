use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAssessmentRepository};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use giftwise::config::AppConfig;
use giftwise::error::AppError;
use giftwise::telemetry;
use giftwise::workflows::access::{AccessService, InMemoryViewContextStore};
use giftwise::workflows::assessment::{AssessmentPolicy, AssessmentService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let policy = AssessmentPolicy::from_config(&config.assessment);
    let assessments = Arc::new(AssessmentService::new(repository, policy));
    let access = Arc::new(AccessService::new(Arc::new(
        InMemoryViewContextStore::new(),
    )));

    let app = with_platform_routes(assessments, access)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        min_answers_per_gift = config.assessment.minimum_answers_per_gift,
        result_validity_days = config.assessment.result_validity_days,
        "giftwise api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
