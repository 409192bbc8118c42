use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::contract::{
    Contract, ContractDraft, ContractId, ContractQuery, ContractRepository, ContractService,
    NewContract, SigningRole,
};
use crate::workflows::identity::{
    DirectoryRoster, Manager, ManagerId, Monitor, MonitorId, Offer, OfferId, StudentId,
};
use crate::workflows::memory::{InMemoryContractRepository, InMemoryIdentityStore};
use crate::workflows::store::RepositoryError;

pub(super) type MemoryContractService =
    ContractService<InMemoryContractRepository, InMemoryIdentityStore>;

/// Demo roster plus a second employer so worklist filters have something to exclude.
pub(super) fn roster() -> DirectoryRoster {
    let mut roster = DirectoryRoster::demo();
    roster.managers.push(Manager {
        id: ManagerId(2),
        first_name: "Sophie".to_string(),
        last_name: "Lavoie".to_string(),
        email: "slavoie@college.qc.ca".to_string(),
    });
    roster.monitors.push(Monitor {
        id: MonitorId(2),
        first_name: "Amir".to_string(),
        last_name: "Haddad".to_string(),
        email: "ahaddad@desjardins.com".to_string(),
    });
    roster.offers.push(Offer {
        id: OfferId(2),
        title: "Data analyst intern".to_string(),
        department: "info".to_string(),
        creator: MonitorId(2),
    });
    roster
}

pub(super) fn build_service() -> (MemoryContractService, Arc<InMemoryContractRepository>) {
    let contracts = Arc::new(InMemoryContractRepository::default());
    let identities = Arc::new(InMemoryIdentityStore::from_roster(roster()));
    let service = ContractService::new(contracts.clone(), identities);
    (service, contracts)
}

pub(super) fn new_contract(offer: u64, student: u64, manager: u64, monitor: u64) -> NewContract {
    NewContract {
        offer_id: Some(OfferId(offer)),
        student_id: Some(StudentId(student)),
        manager_id: Some(ManagerId(manager)),
        monitor_id: Some(MonitorId(monitor)),
    }
}

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn ids(contracts: Vec<Contract>) -> Vec<ContractId> {
    contracts.into_iter().map(|contract| contract.id).collect()
}

/// Lets a competing signer land `role` on the stored record just before our write.
pub(super) struct ContestedContracts {
    pub(super) inner: InMemoryContractRepository,
    competitor: SigningRole,
    raced: AtomicBool,
}

impl ContestedContracts {
    pub(super) fn new(competitor: SigningRole) -> Self {
        Self {
            inner: InMemoryContractRepository::default(),
            competitor,
            raced: AtomicBool::new(false),
        }
    }
}

impl ContractRepository for ContestedContracts {
    fn insert(&self, draft: ContractDraft) -> Result<Contract, RepositoryError> {
        self.inner.insert(draft)
    }

    fn fetch(&self, id: ContractId) -> Result<Option<Contract>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn matching(&self, query: &ContractQuery) -> Result<Vec<Contract>, RepositoryError> {
        self.inner.matching(query)
    }

    fn replace(&self, expected: &Contract, next: Contract) -> Result<(), RepositoryError> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            if let Ok(signed) = expected.signed_by(self.competitor, at(8)) {
                self.inner.replace(expected, signed)?;
            }
        }
        self.inner.replace(expected, next)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
