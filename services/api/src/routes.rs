use crate::infra::AppState;
use admission::analysis::{analysis_router, AnalysisService};
use admission::catalog::{choice_router, ChoiceService};
use admission::intake::{intake_router, ExamScoreService};
use admission::repository::{ChoiceRepository, DepartmentCatalog, ExamScoreRepository};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_admission_routes<S, D, H>(
    intake: Arc<ExamScoreService<S>>,
    choices: Arc<ChoiceService<D, H>>,
    analysis: Arc<AnalysisService<S, D>>,
) -> axum::Router
where
    S: ExamScoreRepository + 'static,
    D: DepartmentCatalog + 'static,
    H: ChoiceRepository + 'static,
{
    intake_router(intake)
        .merge(choice_router(choices))
        .merge(analysis_router(analysis))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{demo_catalog, DEMO_STUDENT};
    use crate::infra::{InMemoryCatalog, InMemoryExamScoreRepository};
    use admission::config::DEFAULT_REFERENCE_YEAR;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let scores = Arc::new(InMemoryExamScoreRepository::default());
        let catalog = Arc::new(InMemoryCatalog::from_snapshot(
            demo_catalog().expect("demo catalog loads"),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        with_admission_routes(
            Arc::new(ExamScoreService::new(scores.clone())),
            Arc::new(ChoiceService::new(catalog.clone(), catalog.clone())),
            Arc::new(AnalysisService::new(scores, catalog, DEFAULT_REFERENCE_YEAR)),
        )
        .layer(Extension(state))
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request builds")
    }

    #[tokio::test]
    async fn health_and_readiness_report_status() {
        let health = app(false).oneshot(get("/health")).await.expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);

        let initializing = app(false).oneshot(get("/ready")).await.expect("route executes");
        assert_eq!(initializing.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(initializing).await["status"], json!("initializing"));

        let ready = app(true).oneshot(get("/ready")).await.expect("route executes");
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_are_served_as_text() {
        let response = app(true).oneshot(get("/metrics")).await.expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
            Some("text/plain; version=0.0.4".as_bytes())
        );
    }

    #[tokio::test]
    async fn seeded_choices_are_listed() {
        let response = app(true)
            .oneshot(get(&format!("/api/schools/choices/{DEMO_STUDENT}")))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        let names: Vec<&str> = payload["choices"]
            .as_array()
            .expect("choices array")
            .iter()
            .filter_map(|choice| choice["departmentName"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Economics", "Business Administration", "Computer Science"]
        );
    }

    #[tokio::test]
    async fn saved_scores_feed_the_analysis() {
        let app = app(true);
        let sheet = json!({
            "userId": DEMO_STUDENT.0,
            "mode": "after",
            "scores": {
                "1": { "default": { "percentile": 95 } },
                "2": { "default": { "percentile": 90 } },
                "3": { "default": { "grade": 2 } },
                "4": { "default": { "grade": 4 } }
            }
        });
        let saved = app
            .clone()
            .oneshot(
                Request::post("/api/exam-scores")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(sheet.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(saved.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::post("/api/analyze")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "userId": DEMO_STUDENT.0, "mode": "after" }).to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["success"], json!(true));
        assert_eq!(payload["results"][0]["departmentName"], json!("Business Administration"));
    }
}
