use std::fmt;

use super::contract::ContractId;
use super::curriculum::CurriculumId;
use super::identity::{ManagerId, MonitorId, OfferId, StudentId, SupervisorId};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The stored record no longer matches the version the caller read.
    #[error("record was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Names the record a lookup failed on so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Student(StudentId),
    Manager(ManagerId),
    Monitor(MonitorId),
    Supervisor(SupervisorId),
    Offer(OfferId),
    Curriculum(CurriculumId),
    Contract(ContractId),
    Matricule(String),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Student(id) => write!(f, "student {id}"),
            EntityRef::Manager(id) => write!(f, "manager {id}"),
            EntityRef::Monitor(id) => write!(f, "monitor {id}"),
            EntityRef::Supervisor(id) => write!(f, "supervisor {id}"),
            EntityRef::Offer(id) => write!(f, "offer {id}"),
            EntityRef::Curriculum(id) => write!(f, "curriculum {id}"),
            EntityRef::Contract(id) => write!(f, "contract {id}"),
            EntityRef::Matricule(matricule) => write!(f, "student with matricule {matricule}"),
        }
    }
}
