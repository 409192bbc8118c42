use super::domain::{Curriculum, CurriculumDraft, CurriculumId, Validity};
use crate::workflows::store::RepositoryError;

/// Storage abstraction for uploaded curricula.
pub trait CurriculumRepository: Send + Sync {
    /// Persist a draft, assigning the next id.
    fn insert(&self, draft: CurriculumDraft) -> Result<Curriculum, RepositoryError>;
    fn fetch(&self, id: CurriculumId) -> Result<Option<Curriculum>, RepositoryError>;
    fn exists(&self, id: CurriculumId) -> Result<bool, RepositoryError>;
    /// Curricula in the given review state, ordered by id.
    fn by_validity(&self, validity: Validity) -> Result<Vec<Curriculum>, RepositoryError>;
    /// Store `next` only if the current record still equals `expected`.
    ///
    /// Returns `Conflict` when another writer got there first and `NotFound` for unknown ids.
    fn replace(&self, expected: &Curriculum, next: Curriculum) -> Result<(), RepositoryError>;
}
