use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{Contract, ContractId, NewContract, SigningRole};
use super::repository::ContractRepository;
use super::service::{ContractService, ContractServiceError};
use crate::workflows::identity::{IdentityStore, ManagerId, MonitorId, StudentId};

/// Router builder exposing contract creation, signing, and per-role worklists.
pub fn contract_router<K, S>(service: Arc<ContractService<K, S>>) -> Router
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    Router::new()
        .route("/api/v1/contracts", post(create_handler::<K, S>))
        .route(
            "/api/v1/contracts/:contract_id",
            get(contract_handler::<K, S>),
        )
        .route(
            "/api/v1/contracts/:contract_id/signatures/:role",
            post(sign_handler::<K, S>),
        )
        .route(
            "/api/v1/reports/contracts/awaiting-manager",
            get(awaiting_manager_handler::<K, S>),
        )
        .route(
            "/api/v1/monitors/:monitor_id/contracts/awaiting-signature",
            get(awaiting_monitor_handler::<K, S>),
        )
        .route(
            "/api/v1/monitors/:monitor_id/contracts/signed",
            get(signed_by_monitor_handler::<K, S>),
        )
        .route(
            "/api/v1/managers/:manager_id/contracts/signed",
            get(signed_by_manager_handler::<K, S>),
        )
        .route(
            "/api/v1/students/:student_id/contracts/awaiting-signature",
            get(awaiting_student_handler::<K, S>),
        )
        .route(
            "/api/v1/students/:student_id/contracts/complete",
            get(completed_handler::<K, S>),
        )
        .route(
            "/api/v1/matricules/:matricule/contract",
            get(matricule_handler::<K, S>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Json(request): Json<NewContract>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    match service.create_from_accepted_application(request) {
        Ok(contract) => (StatusCode::CREATED, Json(contract.view())).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn contract_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path(contract_id): Path<u64>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    match service.get(ContractId(contract_id)) {
        Ok(contract) => (StatusCode::OK, Json(contract.view())).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn sign_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path((contract_id, role)): Path<(u64, SigningRole)>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    match service.sign(ContractId(contract_id), role) {
        Ok(contract) => (StatusCode::OK, Json(contract.view())).into_response(),
        Err(error) => failure(error),
    }
}

pub(crate) async fn awaiting_manager_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    list_response(service.awaiting_manager())
}

pub(crate) async fn awaiting_monitor_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path(monitor_id): Path<u64>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    list_response(service.awaiting_monitor(MonitorId(monitor_id)))
}

pub(crate) async fn signed_by_monitor_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path(monitor_id): Path<u64>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    list_response(service.signed_by_monitor(MonitorId(monitor_id)))
}

pub(crate) async fn signed_by_manager_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path(manager_id): Path<u64>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    list_response(service.signed_by_manager(ManagerId(manager_id)))
}

pub(crate) async fn awaiting_student_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path(student_id): Path<u64>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    single_response(service.awaiting_student(StudentId(student_id)))
}

pub(crate) async fn completed_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path(student_id): Path<u64>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    single_response(service.completed_for_student(StudentId(student_id)))
}

pub(crate) async fn matricule_handler<K, S>(
    State(service): State<Arc<ContractService<K, S>>>,
    Path(matricule): Path<String>,
) -> Response
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    single_response(service.by_matricule(&matricule))
}

fn list_response(result: Result<Vec<Contract>, ContractServiceError>) -> Response {
    match result {
        Ok(contracts) => {
            let views: Vec<_> = contracts.iter().map(Contract::view).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => failure(error),
    }
}

fn single_response(result: Result<Option<Contract>, ContractServiceError>) -> Response {
    match result {
        Ok(Some(contract)) => (StatusCode::OK, Json(contract.view())).into_response(),
        Ok(None) => {
            let payload = json!({ "error": "no matching contract" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(error) => failure(error),
    }
}

fn failure(error: ContractServiceError) -> Response {
    let status = match &error {
        ContractServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ContractServiceError::IdNotFound(_) => StatusCode::NOT_FOUND,
        ContractServiceError::Signature(_) => StatusCode::CONFLICT,
        ContractServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
