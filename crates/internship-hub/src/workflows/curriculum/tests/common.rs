use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::curriculum::{
    Curriculum, CurriculumDraft, CurriculumId, CurriculumRepository, CurriculumService,
    CurriculumUpload, Validity,
};
use crate::workflows::identity::{
    IdentityStore, Manager, ManagerId, Monitor, MonitorId, Offer, OfferId, Student, StudentId,
    Supervisor, SupervisorId,
};
use crate::workflows::memory::{InMemoryCurriculumRepository, InMemoryIdentityStore};
use crate::workflows::store::RepositoryError;

pub(super) type MemoryCurriculumService =
    CurriculumService<InMemoryCurriculumRepository, InMemoryIdentityStore>;

pub(super) fn build_service() -> (
    MemoryCurriculumService,
    Arc<InMemoryCurriculumRepository>,
    Arc<InMemoryIdentityStore>,
) {
    let curricula = Arc::new(InMemoryCurriculumRepository::default());
    let identities = Arc::new(InMemoryIdentityStore::seeded());
    let service = CurriculumService::new(curricula.clone(), identities.clone());
    (service, curricula, identities)
}

pub(super) fn pdf_upload(student: u64, file_name: &str) -> CurriculumUpload {
    CurriculumUpload {
        file_name: file_name.to_string(),
        mime_type: Some("application/pdf".to_string()),
        data: b"%PDF-1.7 curriculum".to_vec(),
        student_id: Some(StudentId(student)),
    }
}

/// Wraps the memory store and lets a competing reviewer settle the record first.
pub(super) struct ContestedCurricula {
    pub(super) inner: InMemoryCurriculumRepository,
    pub(super) competitor_accepts: bool,
    raced: AtomicBool,
}

impl ContestedCurricula {
    pub(super) fn new(competitor_accepts: bool) -> Self {
        Self {
            inner: InMemoryCurriculumRepository::default(),
            competitor_accepts,
            raced: AtomicBool::new(false),
        }
    }
}

impl CurriculumRepository for ContestedCurricula {
    fn insert(&self, draft: CurriculumDraft) -> Result<Curriculum, RepositoryError> {
        self.inner.insert(draft)
    }

    fn fetch(&self, id: CurriculumId) -> Result<Option<Curriculum>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn exists(&self, id: CurriculumId) -> Result<bool, RepositoryError> {
        self.inner.exists(id)
    }

    fn by_validity(&self, validity: Validity) -> Result<Vec<Curriculum>, RepositoryError> {
        self.inner.by_validity(validity)
    }

    fn replace(&self, expected: &Curriculum, next: Curriculum) -> Result<(), RepositoryError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            if let Some(decided) = expected.decide(self.competitor_accepts) {
                self.inner.replace(expected, decided)?;
            }
        }
        self.inner.replace(expected, next)
    }
}

/// Wraps the memory roster and lets a competing writer change the student just before the
/// first replacement lands.
pub(super) struct ContestedIdentities {
    pub(super) inner: InMemoryIdentityStore,
    competitor: fn(&mut Student),
    raced: AtomicBool,
}

impl ContestedIdentities {
    pub(super) fn new(competitor: fn(&mut Student)) -> Self {
        Self {
            inner: InMemoryIdentityStore::seeded(),
            competitor,
            raced: AtomicBool::new(false),
        }
    }
}

impl IdentityStore for ContestedIdentities {
    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError> {
        self.inner.student(id)
    }

    fn student_by_matricule(&self, matricule: &str) -> Result<Option<Student>, RepositoryError> {
        self.inner.student_by_matricule(matricule)
    }

    fn students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.inner.students()
    }

    fn replace_student(&self, expected: &Student, next: Student) -> Result<(), RepositoryError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let mut competing = expected.clone();
            (self.competitor)(&mut competing);
            self.inner.replace_student(expected, competing)?;
        }
        self.inner.replace_student(expected, next)
    }

    fn manager(&self, id: ManagerId) -> Result<Option<Manager>, RepositoryError> {
        self.inner.manager(id)
    }

    fn monitor(&self, id: MonitorId) -> Result<Option<Monitor>, RepositoryError> {
        self.inner.monitor(id)
    }

    fn supervisor(&self, id: SupervisorId) -> Result<Option<Supervisor>, RepositoryError> {
        self.inner.supervisor(id)
    }

    fn offer(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        self.inner.offer(id)
    }
}

pub(super) struct UnavailableCurricula;

impl CurriculumRepository for UnavailableCurricula {
    fn insert(&self, _draft: CurriculumDraft) -> Result<Curriculum, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: CurriculumId) -> Result<Option<Curriculum>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn exists(&self, _id: CurriculumId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn by_validity(&self, _validity: Validity) -> Result<Vec<Curriculum>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn replace(&self, _expected: &Curriculum, _next: Curriculum) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).expect("json payload")
}
