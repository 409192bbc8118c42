//! Mutex-backed stores used by the API process and the test suites.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::contract::{Contract, ContractDraft, ContractId, ContractQuery, ContractRepository};
use super::curriculum::{Curriculum, CurriculumDraft, CurriculumId, CurriculumRepository, Validity};
use super::identity::{
    DirectoryRoster, IdentityStore, Manager, ManagerId, Monitor, MonitorId, Offer, OfferId,
    Student, StudentId, Supervisor, SupervisorId,
};
use super::store::RepositoryError;

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} mutex poisoned")))
}

#[derive(Default)]
struct Directory {
    students: BTreeMap<StudentId, Student>,
    managers: BTreeMap<ManagerId, Manager>,
    monitors: BTreeMap<MonitorId, Monitor>,
    supervisors: BTreeMap<SupervisorId, Supervisor>,
    offers: BTreeMap<OfferId, Offer>,
}

/// Account roster held in memory, seeded from a [`DirectoryRoster`].
#[derive(Default, Clone)]
pub struct InMemoryIdentityStore {
    directory: Arc<Mutex<Directory>>,
}

impl InMemoryIdentityStore {
    pub fn from_roster(roster: DirectoryRoster) -> Self {
        let directory = Directory {
            students: roster.students.into_iter().map(|s| (s.id, s)).collect(),
            managers: roster.managers.into_iter().map(|m| (m.id, m)).collect(),
            monitors: roster.monitors.into_iter().map(|m| (m.id, m)).collect(),
            supervisors: roster.supervisors.into_iter().map(|s| (s.id, s)).collect(),
            offers: roster.offers.into_iter().map(|o| (o.id, o)).collect(),
        };
        Self {
            directory: Arc::new(Mutex::new(directory)),
        }
    }

    /// Store preloaded with the demo roster.
    pub fn seeded() -> Self {
        Self::from_roster(DirectoryRoster::demo())
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError> {
        Ok(lock(&self.directory, "directory")?.students.get(&id).cloned())
    }

    fn student_by_matricule(&self, matricule: &str) -> Result<Option<Student>, RepositoryError> {
        let directory = lock(&self.directory, "directory")?;
        Ok(directory
            .students
            .values()
            .find(|student| student.matricule == matricule)
            .cloned())
    }

    fn students(&self) -> Result<Vec<Student>, RepositoryError> {
        Ok(lock(&self.directory, "directory")?
            .students
            .values()
            .cloned()
            .collect())
    }

    fn replace_student(&self, expected: &Student, next: Student) -> Result<(), RepositoryError> {
        let mut directory = lock(&self.directory, "directory")?;
        match directory.students.get_mut(&expected.id) {
            None => Err(RepositoryError::NotFound),
            Some(current) if current != expected => Err(RepositoryError::Conflict),
            Some(current) => {
                *current = next;
                Ok(())
            }
        }
    }

    fn manager(&self, id: ManagerId) -> Result<Option<Manager>, RepositoryError> {
        Ok(lock(&self.directory, "directory")?.managers.get(&id).cloned())
    }

    fn monitor(&self, id: MonitorId) -> Result<Option<Monitor>, RepositoryError> {
        Ok(lock(&self.directory, "directory")?.monitors.get(&id).cloned())
    }

    fn supervisor(&self, id: SupervisorId) -> Result<Option<Supervisor>, RepositoryError> {
        Ok(lock(&self.directory, "directory")?
            .supervisors
            .get(&id)
            .cloned())
    }

    fn offer(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        Ok(lock(&self.directory, "directory")?.offers.get(&id).cloned())
    }
}

struct Table<K, V> {
    next_id: u64,
    rows: BTreeMap<K, V>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V: PartialEq> Table<K, V> {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn compare_and_swap(&mut self, key: K, expected: &V, next: V) -> Result<(), RepositoryError> {
        match self.rows.get_mut(&key) {
            None => Err(RepositoryError::NotFound),
            Some(current) if current != expected => Err(RepositoryError::Conflict),
            Some(current) => {
                *current = next;
                Ok(())
            }
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCurriculumRepository {
    table: Arc<Mutex<Table<CurriculumId, Curriculum>>>,
}

impl CurriculumRepository for InMemoryCurriculumRepository {
    fn insert(&self, draft: CurriculumDraft) -> Result<Curriculum, RepositoryError> {
        let mut table = lock(&self.table, "curriculum")?;
        let id = CurriculumId(table.allocate());
        let curriculum = Curriculum::from_draft(id, draft);
        table.rows.insert(id, curriculum.clone());
        Ok(curriculum)
    }

    fn fetch(&self, id: CurriculumId) -> Result<Option<Curriculum>, RepositoryError> {
        Ok(lock(&self.table, "curriculum")?.rows.get(&id).cloned())
    }

    fn exists(&self, id: CurriculumId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.table, "curriculum")?.rows.contains_key(&id))
    }

    fn by_validity(&self, validity: Validity) -> Result<Vec<Curriculum>, RepositoryError> {
        Ok(lock(&self.table, "curriculum")?
            .rows
            .values()
            .filter(|curriculum| curriculum.validity == validity)
            .cloned()
            .collect())
    }

    fn replace(&self, expected: &Curriculum, next: Curriculum) -> Result<(), RepositoryError> {
        lock(&self.table, "curriculum")?.compare_and_swap(expected.id, expected, next)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryContractRepository {
    table: Arc<Mutex<Table<ContractId, Contract>>>,
}

impl ContractRepository for InMemoryContractRepository {
    fn insert(&self, draft: ContractDraft) -> Result<Contract, RepositoryError> {
        let mut table = lock(&self.table, "contract")?;
        let id = ContractId(table.allocate());
        let contract = Contract::from_draft(id, draft);
        table.rows.insert(id, contract.clone());
        Ok(contract)
    }

    fn fetch(&self, id: ContractId) -> Result<Option<Contract>, RepositoryError> {
        Ok(lock(&self.table, "contract")?.rows.get(&id).cloned())
    }

    fn matching(&self, query: &ContractQuery) -> Result<Vec<Contract>, RepositoryError> {
        Ok(lock(&self.table, "contract")?
            .rows
            .values()
            .filter(|contract| query.matches(contract))
            .cloned()
            .collect())
    }

    fn replace(&self, expected: &Contract, next: Contract) -> Result<(), RepositoryError> {
        lock(&self.table, "contract")?.compare_and_swap(expected.id, expected, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(owner: u64) -> CurriculumDraft {
        CurriculumDraft {
            name: "cv.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            data: b"%PDF".to_vec(),
            owner: StudentId(owner),
            validity: Validity::Pending,
        }
    }

    #[test]
    fn ids_are_assigned_sequentially() {
        let repository = InMemoryCurriculumRepository::default();
        let first = repository.insert(draft(1)).expect("insert");
        let second = repository.insert(draft(2)).expect("insert");

        assert_eq!(first.id, CurriculumId(1));
        assert_eq!(second.id, CurriculumId(2));
        assert!(repository.exists(CurriculumId(2)).expect("exists"));
        assert!(!repository.exists(CurriculumId(3)).expect("exists"));
    }

    #[test]
    fn replace_rejects_stale_expectations() {
        let repository = InMemoryCurriculumRepository::default();
        let stored = repository.insert(draft(1)).expect("insert");
        let accepted = stored.decide(true).expect("pending");
        let rejected = stored.decide(false).expect("pending");

        repository
            .replace(&stored, accepted.clone())
            .expect("first writer wins");
        assert!(matches!(
            repository.replace(&stored, rejected),
            Err(RepositoryError::Conflict)
        ));
        assert_eq!(
            repository.fetch(stored.id).expect("fetch"),
            Some(accepted)
        );
    }

    #[test]
    fn replace_reports_unknown_records() {
        let repository = InMemoryCurriculumRepository::default();
        let phantom = Curriculum::from_draft(CurriculumId(9), draft(1));

        assert!(matches!(
            repository.replace(&phantom, phantom.clone()),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn student_replacement_is_compare_and_swap() {
        let store = InMemoryIdentityStore::seeded();
        let original = store
            .student(StudentId(1))
            .expect("lookup")
            .expect("seeded student");
        let mut with_curriculum = original.clone();
        with_curriculum.principal_curriculum = Some(CurriculumId(4));
        store
            .replace_student(&original, with_curriculum)
            .expect("first writer wins");

        let mut stale = original.clone();
        stale.supervisor = Some(SupervisorId(1));
        assert!(matches!(
            store.replace_student(&original, stale),
            Err(RepositoryError::Conflict)
        ));

        let mut ghost = original.clone();
        ghost.id = StudentId(99);
        assert!(matches!(
            store.replace_student(&ghost, ghost.clone()),
            Err(RepositoryError::NotFound)
        ));
        assert_eq!(
            store
                .student_by_matricule("4673943")
                .expect("lookup")
                .and_then(|student| student.principal_curriculum),
            Some(CurriculumId(4))
        );
    }

    #[test]
    fn modify_student_keeps_fields_it_does_not_touch() {
        let store = InMemoryIdentityStore::seeded();
        store
            .modify_student(StudentId(1), |student| {
                student.principal_curriculum = Some(CurriculumId(2))
            })
            .expect("modify")
            .expect("seeded student");
        let updated = store
            .modify_student(StudentId(1), |student| {
                student.supervisor = Some(SupervisorId(1))
            })
            .expect("modify")
            .expect("seeded student");

        assert_eq!(updated.principal_curriculum, Some(CurriculumId(2)));
        assert_eq!(updated.supervisor, Some(SupervisorId(1)));
        assert!(store
            .modify_student(StudentId(99), |_| {})
            .expect("modify")
            .is_none());
    }
}
