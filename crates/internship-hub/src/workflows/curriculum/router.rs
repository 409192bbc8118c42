use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Curriculum, CurriculumId, CurriculumReview, CurriculumUpload};
use super::repository::CurriculumRepository;
use super::service::{CurriculumService, CurriculumServiceError};
use crate::workflows::identity::{IdentityStore, Student, StudentId};
use crate::workflows::store::EntityRef;

#[derive(Debug, Deserialize)]
pub struct PrincipalSelection {
    pub curriculum_id: CurriculumId,
}

/// Router builder exposing curriculum upload, review, and student CV reports.
pub fn curriculum_router<C, S>(service: Arc<CurriculumService<C, S>>) -> Router
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    Router::new()
        .route("/api/v1/curricula", post(upload_handler::<C, S>))
        .route(
            "/api/v1/curricula/:curriculum_id",
            get(curriculum_handler::<C, S>),
        )
        .route(
            "/api/v1/curricula/:curriculum_id/file",
            get(download_handler::<C, S>),
        )
        .route(
            "/api/v1/review/curricula",
            get(pending_handler::<C, S>).post(validate_handler::<C, S>),
        )
        .route(
            "/api/v1/review/students",
            get(awaiting_review_handler::<C, S>),
        )
        .route(
            "/api/v1/reports/students/without-curriculum",
            get(without_curriculum_handler::<C, S>),
        )
        .route(
            "/api/v1/reports/students/invalid-curriculum",
            get(invalid_curriculum_handler::<C, S>),
        )
        .route(
            "/api/v1/reports/students/unassigned",
            get(unassigned_handler::<C, S>),
        )
        .route(
            "/api/v1/students/:student_id/principal-curriculum",
            put(principal_handler::<C, S>),
        )
        .with_state(service)
}

pub(crate) async fn upload_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
    mut multipart: Multipart,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    let mut upload = CurriculumUpload::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => return bad_request(error.to_string()),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                upload.file_name = field.file_name().unwrap_or_default().to_string();
                upload.mime_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => upload.data = bytes.to_vec(),
                    Err(error) => return bad_request(error.to_string()),
                }
            }
            Some("student_id") => {
                let raw = match field.text().await {
                    Ok(raw) => raw,
                    Err(error) => return bad_request(error.to_string()),
                };
                match raw.trim().parse::<u64>() {
                    Ok(id) => upload.student_id = Some(StudentId(id)),
                    Err(_) => return bad_request(format!("student_id '{raw}' is not a number")),
                }
            }
            _ => continue,
        }
    }

    match service.upload(upload) {
        Ok(curriculum) => (StatusCode::CREATED, Json(curriculum.view())).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn curriculum_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
    Path(curriculum_id): Path<u64>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    match service.get(CurriculumId(curriculum_id)) {
        Ok(curriculum) => (StatusCode::OK, Json(curriculum.view())).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn download_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
    Path(curriculum_id): Path<u64>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    match service.get(CurriculumId(curriculum_id)) {
        Ok(curriculum) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                ascii_file_name(&curriculum.name)
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, curriculum.mime_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                curriculum.data,
            )
                .into_response()
        }
        Err(error) => failure(error),
    }
}

pub(crate) async fn validate_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
    Json(review): Json<CurriculumReview>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    match service.validate(review) {
        Ok(curriculum) => (StatusCode::OK, Json(curriculum.view())).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn pending_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    curricula_response(service.pending_review())
}

pub(crate) async fn awaiting_review_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    students_response(service.students_awaiting_review())
}

pub(crate) async fn without_curriculum_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    students_response(service.students_without_curriculum())
}

pub(crate) async fn invalid_curriculum_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    students_response(service.students_with_invalid_curriculum())
}

pub(crate) async fn unassigned_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    students_response(service.students_ready_for_assignment())
}

pub(crate) async fn principal_handler<C, S>(
    State(service): State<Arc<CurriculumService<C, S>>>,
    Path(student_id): Path<u64>,
    Json(selection): Json<PrincipalSelection>,
) -> Response
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    match service.set_principal(StudentId(student_id), selection.curriculum_id) {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(error) => failure(error),
    }
}

fn curricula_response(result: Result<Vec<Curriculum>, CurriculumServiceError>) -> Response {
    match result {
        Ok(curricula) => {
            let views: Vec<_> = curricula.iter().map(Curriculum::view).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => failure(error),
    }
}

fn students_response(result: Result<Vec<Student>, CurriculumServiceError>) -> Response {
    match result {
        Ok(students) => (StatusCode::OK, Json(students)).into_response(),
        Err(error) => failure(error),
    }
}

fn ascii_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn failure(error: CurriculumServiceError) -> Response {
    let status = match &error {
        CurriculumServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        CurriculumServiceError::IdNotFound(_) => StatusCode::NOT_FOUND,
        CurriculumServiceError::AlreadyTreated(_) => StatusCode::CONFLICT,
        CurriculumServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut payload = json!({ "error": error.to_string() });
    if let CurriculumServiceError::IdNotFound(EntityRef::Curriculum(id)) = &error {
        payload["curriculum_id"] = json!(id.0);
    }
    (status, Json(payload)).into_response()
}
