use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{StudentId, SupervisorId};
use super::repository::IdentityStore;
use super::service::{DirectoryService, DirectoryServiceError};

#[derive(Debug, Deserialize)]
pub struct SupervisorAssignment {
    pub supervisor_id: SupervisorId,
}

/// Router exposing student lookups and supervisor assignment.
pub fn directory_router<S>(service: Arc<DirectoryService<S>>) -> Router
where
    S: IdentityStore + 'static,
{
    Router::new()
        .route("/api/v1/students/:student_id", get(student_handler::<S>))
        .route(
            "/api/v1/students/:student_id/supervisor",
            put(assign_supervisor_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn student_handler<S>(
    State(service): State<Arc<DirectoryService<S>>>,
    Path(student_id): Path<u64>,
) -> Response
where
    S: IdentityStore + 'static,
{
    match service.student(StudentId(student_id)) {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn assign_supervisor_handler<S>(
    State(service): State<Arc<DirectoryService<S>>>,
    Path(student_id): Path<u64>,
    Json(assignment): Json<SupervisorAssignment>,
) -> Response
where
    S: IdentityStore + 'static,
{
    match service.assign_supervisor(StudentId(student_id), assignment.supervisor_id) {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(error) => failure(error),
    }
}

fn failure(error: DirectoryServiceError) -> Response {
    let status = match &error {
        DirectoryServiceError::IdNotFound(_) => StatusCode::NOT_FOUND,
        DirectoryServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
