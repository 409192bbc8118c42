use std::sync::Arc;

use tracing::info;

use super::domain::{Student, StudentId, SupervisorId};
use super::repository::IdentityStore;
use crate::workflows::store::{EntityRef, RepositoryError};

/// Student-facing account operations that sit outside the curriculum and contract flows.
pub struct DirectoryService<S> {
    identities: Arc<S>,
}

impl<S> DirectoryService<S>
where
    S: IdentityStore + 'static,
{
    pub fn new(identities: Arc<S>) -> Self {
        Self { identities }
    }

    pub fn student(&self, student_id: StudentId) -> Result<Student, DirectoryServiceError> {
        self.identities
            .student(student_id)?
            .ok_or(DirectoryServiceError::IdNotFound(EntityRef::Student(
                student_id,
            )))
    }

    /// Attach a supervising teacher to a student, replacing any previous assignment.
    pub fn assign_supervisor(
        &self,
        student_id: StudentId,
        supervisor_id: SupervisorId,
    ) -> Result<Student, DirectoryServiceError> {
        self.student(student_id)?;
        self.identities
            .supervisor(supervisor_id)?
            .ok_or(DirectoryServiceError::IdNotFound(EntityRef::Supervisor(
                supervisor_id,
            )))?;

        let student = self
            .identities
            .modify_student(student_id, |student| {
                student.supervisor = Some(supervisor_id)
            })?
            .ok_or(DirectoryServiceError::IdNotFound(EntityRef::Student(
                student_id,
            )))?;

        info!(student = %student_id, supervisor = %supervisor_id, "supervisor assigned");
        Ok(student)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryServiceError {
    #[error("{0} does not exist")]
    IdNotFound(EntityRef),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
