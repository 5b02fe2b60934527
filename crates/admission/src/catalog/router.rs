use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::choices::{ChoiceError, ChoiceService};
use crate::repository::{ChoiceRepository, DepartmentCatalog};
use crate::scoring::{DepartmentId, UserId};

/// Routes for reading and maintaining a user's chosen departments.
pub fn choice_router<D, H>(service: Arc<ChoiceService<D, H>>) -> Router
where
    D: DepartmentCatalog + 'static,
    H: ChoiceRepository + 'static,
{
    Router::new()
        .route("/api/schools/choices", post(add_handler::<D, H>))
        .route("/api/schools/choices/:user_id", get(list_handler::<D, H>))
        .route(
            "/api/schools/choices/:user_id/:department_id",
            delete(remove_handler::<D, H>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<D, H>(
    State(service): State<Arc<ChoiceService<D, H>>>,
    Path(user_id): Path<String>,
) -> Response
where
    D: DepartmentCatalog + 'static,
    H: ChoiceRepository + 'static,
{
    let Some(user_id) = UserId::from_json(&Value::String(user_id)) else {
        return bad_request("userId must be a positive integer");
    };

    match service.list(user_id) {
        Ok(choices) => {
            (StatusCode::OK, Json(json!({ "userId": user_id, "choices": choices }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_handler<D, H>(
    State(service): State<Arc<ChoiceService<D, H>>>,
    Json(payload): Json<Value>,
) -> Response
where
    D: DepartmentCatalog + 'static,
    H: ChoiceRepository + 'static,
{
    let Some(user_id) = payload.get("userId").and_then(UserId::from_json) else {
        return bad_request("userId is required");
    };
    let Some(department_id) = payload.get("departmentId").and_then(DepartmentId::from_json) else {
        return bad_request("departmentId is required");
    };

    match service.add(user_id, department_id) {
        Ok(choices) => (
            StatusCode::OK,
            Json(json!({ "message": "department added", "choices": choices })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_handler<D, H>(
    State(service): State<Arc<ChoiceService<D, H>>>,
    Path((user_id, department_id)): Path<(String, String)>,
) -> Response
where
    D: DepartmentCatalog + 'static,
    H: ChoiceRepository + 'static,
{
    let (Some(user_id), Some(department_id)) = (
        UserId::from_json(&Value::String(user_id)),
        DepartmentId::from_json(&Value::String(department_id)),
    ) else {
        return bad_request("userId and departmentId must be positive integers");
    };

    match service.remove(user_id, department_id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "department removed" }))).into_response(),
        Err(error) => error_response(error),
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn error_response(error: ChoiceError) -> Response {
    let status = match error {
        ChoiceError::AlreadyChosen(_) | ChoiceError::LimitReached { .. } => StatusCode::BAD_REQUEST,
        ChoiceError::UnknownDepartment(_) | ChoiceError::NotChosen(_) => StatusCode::NOT_FOUND,
        ChoiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
