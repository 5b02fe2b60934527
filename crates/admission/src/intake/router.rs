use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::{ExamScoreService, ExamScoreSubmission, IntakeError};
use crate::repository::ExamScoreRepository;
use crate::scoring::{ExamMode, UserId};

/// Router exposing score sheet upsert and lookup.
pub fn intake_router<S>(service: Arc<ExamScoreService<S>>) -> Router
where
    S: ExamScoreRepository + 'static,
{
    Router::new()
        .route("/api/exam-scores", post(submit_handler::<S>))
        .route("/api/exam-scores/:user_id/:mode", get(fetch_handler::<S>))
        .with_state(service)
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<ExamScoreService<S>>>,
    Json(payload): Json<Value>,
) -> Response
where
    S: ExamScoreRepository + 'static,
{
    let submission = match ExamScoreSubmission::from_payload(&payload) {
        Ok(submission) => submission,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": error.to_string() })))
                .into_response();
        }
    };

    match service.submit(submission) {
        Ok(_) => (StatusCode::OK, Json(json!({ "message": "exam scores saved" }))).into_response(),
        Err(error) => internal_error(error),
    }
}

/// Returns the stored sheet, or JSON `null` when nothing was saved for the mode.
pub(crate) async fn fetch_handler<S>(
    State(service): State<Arc<ExamScoreService<S>>>,
    Path((user_id, mode)): Path<(String, String)>,
) -> Response
where
    S: ExamScoreRepository + 'static,
{
    let Some(user_id) = UserId::from_json(&Value::String(user_id)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": IntakeError::MissingUserId.to_string() })),
        )
            .into_response();
    };
    let Some(mode) = ExamMode::parse(&mode) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": IntakeError::InvalidMode.to_string() })),
        )
            .into_response();
    };

    match service.get(user_id, mode) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => internal_error(error),
    }
}

fn internal_error(error: IntakeError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": error.to_string() })),
    )
        .into_response()
}
