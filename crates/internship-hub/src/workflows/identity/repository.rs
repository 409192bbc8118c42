use super::domain::{
    Manager, ManagerId, Monitor, MonitorId, Offer, OfferId, Student, StudentId, Supervisor,
    SupervisorId,
};
use crate::workflows::store::RepositoryError;

/// Account lookups the workflows depend on. Account CRUD lives elsewhere; only the student
/// record is written back (principal curriculum and supervisor).
pub trait IdentityStore: Send + Sync {
    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError>;
    fn student_by_matricule(&self, matricule: &str) -> Result<Option<Student>, RepositoryError>;
    /// Every student, ordered by id.
    fn students(&self) -> Result<Vec<Student>, RepositoryError>;
    /// Swaps the stored student for `next` only while it still equals `expected`.
    /// `NotFound` when the id is unknown, `Conflict` when another writer got there first.
    fn replace_student(&self, expected: &Student, next: Student) -> Result<(), RepositoryError>;
    fn manager(&self, id: ManagerId) -> Result<Option<Manager>, RepositoryError>;
    fn monitor(&self, id: MonitorId) -> Result<Option<Monitor>, RepositoryError>;
    fn supervisor(&self, id: SupervisorId) -> Result<Option<Supervisor>, RepositoryError>;
    fn offer(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError>;

    /// Applies `change` to the current student record, re-reading and retrying after a
    /// `Conflict`. `Ok(None)` when the student does not exist.
    fn modify_student<F>(
        &self,
        id: StudentId,
        change: F,
    ) -> Result<Option<Student>, RepositoryError>
    where
        F: Fn(&mut Student),
        Self: Sized,
    {
        loop {
            let Some(current) = self.student(id)? else {
                return Ok(None);
            };
            let mut next = current.clone();
            change(&mut next);
            match self.replace_student(&current, next.clone()) {
                Ok(()) => return Ok(Some(next)),
                Err(RepositoryError::Conflict) => continue,
                Err(RepositoryError::NotFound) => return Ok(None),
                Err(other) => return Err(other),
            }
        }
    }
}
