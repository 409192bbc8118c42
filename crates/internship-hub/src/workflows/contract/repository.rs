use super::domain::{Contract, ContractDraft, ContractId, ContractStage};
use crate::workflows::identity::{ManagerId, MonitorId, StudentId};
use crate::workflows::store::RepositoryError;

/// Stage constraint applied by a [`ContractQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFilter {
    Exactly(ContractStage),
    AtLeast(ContractStage),
}

impl StageFilter {
    pub fn admits(self, stage: ContractStage) -> bool {
        match self {
            StageFilter::Exactly(expected) => stage == expected,
            StageFilter::AtLeast(floor) => stage >= floor,
        }
    }
}

/// Conjunctive filter over contracts; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractQuery {
    pub id: Option<ContractId>,
    pub stage: Option<StageFilter>,
    pub student: Option<StudentId>,
    pub manager: Option<ManagerId>,
    pub monitor: Option<MonitorId>,
    pub offer_creator: Option<MonitorId>,
}

impl ContractQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: ContractId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn in_stage(mut self, stage: ContractStage) -> Self {
        self.stage = Some(StageFilter::Exactly(stage));
        self
    }

    pub fn from_stage(mut self, stage: ContractStage) -> Self {
        self.stage = Some(StageFilter::AtLeast(stage));
        self
    }

    pub fn for_student(mut self, student: StudentId) -> Self {
        self.student = Some(student);
        self
    }

    pub fn for_manager(mut self, manager: ManagerId) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn for_monitor(mut self, monitor: MonitorId) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn created_by(mut self, creator: MonitorId) -> Self {
        self.offer_creator = Some(creator);
        self
    }

    pub fn matches(&self, contract: &Contract) -> bool {
        self.id.map_or(true, |id| contract.id == id)
            && self.stage.map_or(true, |filter| filter.admits(contract.stage()))
            && self.student.map_or(true, |id| contract.student == id)
            && self.manager.map_or(true, |id| contract.manager == id)
            && self.monitor.map_or(true, |id| contract.monitor == id)
            && self
                .offer_creator
                .map_or(true, |id| contract.offer.creator == id)
    }
}

/// Storage abstraction for contracts.
pub trait ContractRepository: Send + Sync {
    /// Persist a draft, assigning the next id.
    fn insert(&self, draft: ContractDraft) -> Result<Contract, RepositoryError>;
    fn fetch(&self, id: ContractId) -> Result<Option<Contract>, RepositoryError>;
    /// Contracts satisfying `query`, ordered by id.
    fn matching(&self, query: &ContractQuery) -> Result<Vec<Contract>, RepositoryError>;
    /// Store `next` only if the current record still equals `expected`.
    fn replace(&self, expected: &Contract, next: Contract) -> Result<(), RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::contract::domain::SigningRole;
    use crate::workflows::identity::{Offer, OfferId};
    use chrono::Utc;

    fn contract(id: u64, student: u64, creator: u64) -> Contract {
        Contract::from_draft(
            ContractId(id),
            ContractDraft {
                offer: Offer {
                    id: OfferId(1),
                    title: "QA intern".to_string(),
                    department: "info".to_string(),
                    creator: MonitorId(creator),
                },
                student: StudentId(student),
                manager: ManagerId(1),
                monitor: MonitorId(creator),
            },
        )
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(ContractQuery::all().matches(&contract(1, 1, 1)));
    }

    #[test]
    fn stage_filters_distinguish_exact_and_floor() {
        let draft = contract(1, 1, 1);
        let signed = draft
            .signed_by(SigningRole::Manager, Utc::now())
            .expect("manager signs");

        let exact = ContractQuery::all().in_stage(ContractStage::Draft);
        assert!(exact.matches(&draft));
        assert!(!exact.matches(&signed));

        let floor = ContractQuery::all().from_stage(ContractStage::AwaitingMonitor);
        assert!(!floor.matches(&draft));
        assert!(floor.matches(&signed));
    }

    #[test]
    fn party_filters_are_conjunctive() {
        let query = ContractQuery::all()
            .for_student(StudentId(2))
            .created_by(MonitorId(5));

        assert!(query.matches(&contract(1, 2, 5)));
        assert!(!query.matches(&contract(2, 2, 6)));
        assert!(!query.matches(&contract(3, 3, 5)));
    }
}
