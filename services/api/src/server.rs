use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState, InMemoryCatalog, InMemoryExamScoreRepository};
use crate::routes::with_admission_routes;
use admission::analysis::AnalysisService;
use admission::catalog::ChoiceService;
use admission::config::AppConfig;
use admission::error::AppError;
use admission::intake::ExamScoreService;
use admission::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let snapshot = load_catalog(
        config.analysis.catalog_path.as_deref(),
        config.analysis.grade_table_path.as_deref(),
    )?;
    let scores = Arc::new(InMemoryExamScoreRepository::default());
    let catalog = Arc::new(InMemoryCatalog::from_snapshot(snapshot));

    let intake = Arc::new(ExamScoreService::new(scores.clone()));
    let choices = Arc::new(ChoiceService::new(catalog.clone(), catalog.clone()));
    let analysis = Arc::new(AnalysisService::new(
        scores,
        catalog,
        config.analysis.reference_year,
    ));

    let app = with_admission_routes(intake, choices, analysis)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        reference_year = config.analysis.reference_year,
        "admission score service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
