use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::error;

use super::domain::{AnalysisOutcome, AnalysisRequest};
use super::service::AnalysisService;
use crate::repository::{DepartmentCatalog, ExamScoreRepository};

/// Router exposing the converted-score analysis.
pub fn analysis_router<S, D>(service: Arc<AnalysisService<S, D>>) -> Router
where
    S: ExamScoreRepository + 'static,
    D: DepartmentCatalog + 'static,
{
    Router::new()
        .route("/api/analyze", post(analyze_handler::<S, D>))
        .with_state(service)
}

pub(crate) async fn analyze_handler<S, D>(
    State(service): State<Arc<AnalysisService<S, D>>>,
    Json(payload): Json<Value>,
) -> Response
where
    S: ExamScoreRepository + 'static,
    D: DepartmentCatalog + 'static,
{
    let request = match AnalysisRequest::from_payload(&payload) {
        Ok(request) => request,
        Err(error) => {
            let outcome = AnalysisOutcome::unavailable(error.to_string());
            return (StatusCode::BAD_REQUEST, Json(outcome)).into_response();
        }
    };

    match service.analyze(request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => {
            error!(user_id = %request.user_id, error = %err, "analysis failed");
            let payload = json!({
                "success": false,
                "message": "analysis failed",
                "count": 0,
                "results": [],
                "error": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
