use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    sanitize_file_name, Curriculum, CurriculumDraft, CurriculumId, CurriculumReview,
    CurriculumUpload, Validity,
};
use super::repository::CurriculumRepository;
use crate::workflows::identity::{IdentityStore, Student, StudentId};
use crate::workflows::store::{EntityRef, RepositoryError};

/// Service composing the curriculum store with the identity roster.
pub struct CurriculumService<C, S> {
    curricula: Arc<C>,
    identities: Arc<S>,
}

impl<C, S> CurriculumService<C, S>
where
    C: CurriculumRepository + 'static,
    S: IdentityStore + 'static,
{
    pub fn new(curricula: Arc<C>, identities: Arc<S>) -> Self {
        Self {
            curricula,
            identities,
        }
    }

    /// Turn an upload into an unsaved draft owned by the referenced student.
    pub fn build_from_upload(
        &self,
        upload: CurriculumUpload,
    ) -> Result<CurriculumDraft, CurriculumServiceError> {
        if upload.data.is_empty() {
            return Err(CurriculumServiceError::InvalidArgument(
                "curriculum file is empty",
            ));
        }
        let student_id = upload
            .student_id
            .ok_or(CurriculumServiceError::InvalidArgument(
                "student id is required",
            ))?;
        let student = self.require_student(student_id)?;

        let mime_type = match upload.mime_type.as_deref().map(str::trim) {
            None | Some("") => mime::APPLICATION_OCTET_STREAM.to_string(),
            Some(raw) => raw
                .parse::<mime::Mime>()
                .map_err(|_| CurriculumServiceError::InvalidArgument("mime type is malformed"))?
                .essence_str()
                .to_string(),
        };

        Ok(CurriculumDraft {
            name: sanitize_file_name(&upload.file_name),
            mime_type,
            data: upload.data,
            owner: student.id,
            validity: Validity::Pending,
        })
    }

    /// Persist a draft and make it the owner's principal curriculum.
    pub fn create(&self, draft: CurriculumDraft) -> Result<Curriculum, CurriculumServiceError> {
        if draft.data.is_empty() {
            return Err(CurriculumServiceError::InvalidArgument(
                "curriculum file is empty",
            ));
        }

        let owner = self.require_student(draft.owner)?.id;
        let stored = self.curricula.insert(draft)?;
        self.point_principal_at(owner, stored.id)?;

        info!(
            curriculum = %stored.id,
            student = %stored.owner,
            bytes = stored.data.len(),
            "curriculum uploaded"
        );
        Ok(stored)
    }

    /// `build_from_upload` followed by `create`.
    pub fn upload(&self, upload: CurriculumUpload) -> Result<Curriculum, CurriculumServiceError> {
        let draft = self.build_from_upload(upload)?;
        self.create(draft)
    }

    /// Record the reviewer's decision. A curriculum can only be treated once.
    pub fn validate(
        &self,
        review: CurriculumReview,
    ) -> Result<Curriculum, CurriculumServiceError> {
        let curriculum_id = review
            .curriculum_id
            .ok_or(CurriculumServiceError::InvalidArgument(
                "curriculum id is required",
            ))?;
        let current = self.get(curriculum_id)?;

        let Some(decided) = current.decide(review.valid) else {
            warn!(curriculum = %curriculum_id, "curriculum already treated");
            return Err(CurriculumServiceError::AlreadyTreated(curriculum_id));
        };

        match self.curricula.replace(&current, decided.clone()) {
            Ok(()) => {
                info!(
                    curriculum = %curriculum_id,
                    validity = decided.validity.label(),
                    "curriculum reviewed"
                );
                Ok(decided)
            }
            Err(RepositoryError::Conflict) => {
                warn!(curriculum = %curriculum_id, "concurrent review lost the race");
                Err(CurriculumServiceError::AlreadyTreated(curriculum_id))
            }
            Err(RepositoryError::NotFound) => Err(CurriculumServiceError::IdNotFound(
                EntityRef::Curriculum(curriculum_id),
            )),
            Err(other) => Err(other.into()),
        }
    }

    /// Point the student's principal curriculum at one of their own uploads.
    pub fn set_principal(
        &self,
        student_id: StudentId,
        curriculum_id: CurriculumId,
    ) -> Result<Student, CurriculumServiceError> {
        let student = self.require_student(student_id)?;
        let curriculum = self.get(curriculum_id)?;
        if curriculum.owner != student.id {
            return Err(CurriculumServiceError::InvalidArgument(
                "curriculum belongs to another student",
            ));
        }

        self.point_principal_at(student_id, curriculum.id)
    }

    /// Writes only the principal reference so a concurrent supervisor assignment survives.
    fn point_principal_at(
        &self,
        student_id: StudentId,
        curriculum_id: CurriculumId,
    ) -> Result<Student, CurriculumServiceError> {
        self.identities
            .modify_student(student_id, |student| {
                student.principal_curriculum = Some(curriculum_id)
            })?
            .ok_or(CurriculumServiceError::IdNotFound(EntityRef::Student(
                student_id,
            )))
    }

    pub fn get(&self, curriculum_id: CurriculumId) -> Result<Curriculum, CurriculumServiceError> {
        self.curricula
            .fetch(curriculum_id)?
            .ok_or(CurriculumServiceError::IdNotFound(EntityRef::Curriculum(
                curriculum_id,
            )))
    }

    pub fn pending_review(&self) -> Result<Vec<Curriculum>, CurriculumServiceError> {
        Ok(self.curricula.by_validity(Validity::Pending)?)
    }

    /// Distinct owners of curricula still waiting for a decision.
    pub fn students_awaiting_review(&self) -> Result<Vec<Student>, CurriculumServiceError> {
        let owners: BTreeSet<StudentId> = self
            .pending_review()?
            .into_iter()
            .map(|curriculum| curriculum.owner)
            .collect();

        owners
            .into_iter()
            .map(|student_id| self.require_student(student_id))
            .collect()
    }

    pub fn students_without_curriculum(&self) -> Result<Vec<Student>, CurriculumServiceError> {
        Ok(self
            .students()?
            .into_iter()
            .filter(|student| student.principal_curriculum.is_none())
            .collect())
    }

    pub fn students_with_invalid_curriculum(
        &self,
    ) -> Result<Vec<Student>, CurriculumServiceError> {
        self.students_with_principal(Validity::Invalid)
    }

    /// Students whose principal curriculum was accepted and who have no supervisor yet.
    pub fn students_ready_for_assignment(
        &self,
    ) -> Result<Vec<Student>, CurriculumServiceError> {
        Ok(self
            .students_with_principal(Validity::Valid)?
            .into_iter()
            .filter(|student| student.supervisor.is_none())
            .collect())
    }

    fn students_with_principal(
        &self,
        validity: Validity,
    ) -> Result<Vec<Student>, CurriculumServiceError> {
        let mut matching = Vec::new();
        for student in self.students()? {
            let Some(principal) = student.principal_curriculum else {
                continue;
            };
            if let Some(curriculum) = self.curricula.fetch(principal)? {
                if curriculum.validity == validity {
                    matching.push(student);
                }
            }
        }
        Ok(matching)
    }

    fn students(&self) -> Result<Vec<Student>, CurriculumServiceError> {
        let mut students = self.identities.students()?;
        students.sort_by_key(|student| student.id);
        Ok(students)
    }

    fn require_student(&self, student_id: StudentId) -> Result<Student, CurriculumServiceError> {
        self.identities
            .student(student_id)?
            .ok_or(CurriculumServiceError::IdNotFound(EntityRef::Student(
                student_id,
            )))
    }
}

/// Error raised by the curriculum service.
#[derive(Debug, thiserror::Error)]
pub enum CurriculumServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("{0} does not exist")]
    IdNotFound(EntityRef),
    #[error("curriculum {0} has already been treated")]
    AlreadyTreated(CurriculumId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
