use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    Contract, ContractDraft, ContractId, ContractStage, NewContract, SignatureError, SigningRole,
};
use super::repository::{ContractQuery, ContractRepository};
use crate::workflows::identity::{IdentityStore, ManagerId, MonitorId, StudentId};
use crate::workflows::store::{EntityRef, RepositoryError};

/// Service driving the manager, monitor, student signature sequence.
pub struct ContractService<K, S> {
    contracts: Arc<K>,
    identities: Arc<S>,
}

impl<K, S> ContractService<K, S>
where
    K: ContractRepository + 'static,
    S: IdentityStore + 'static,
{
    pub fn new(contracts: Arc<K>, identities: Arc<S>) -> Self {
        Self {
            contracts,
            identities,
        }
    }

    /// Open an unsigned contract for an accepted application.
    pub fn create_from_accepted_application(
        &self,
        request: NewContract,
    ) -> Result<Contract, ContractServiceError> {
        let offer_id = request
            .offer_id
            .ok_or(ContractServiceError::InvalidArgument("offer id is required"))?;
        let student_id = request
            .student_id
            .ok_or(ContractServiceError::InvalidArgument("student id is required"))?;
        let manager_id = request
            .manager_id
            .ok_or(ContractServiceError::InvalidArgument("manager id is required"))?;
        let monitor_id = request
            .monitor_id
            .ok_or(ContractServiceError::InvalidArgument("monitor id is required"))?;

        let offer = self
            .identities
            .offer(offer_id)?
            .ok_or(ContractServiceError::IdNotFound(EntityRef::Offer(offer_id)))?;
        if self.identities.student(student_id)?.is_none() {
            return Err(ContractServiceError::IdNotFound(EntityRef::Student(
                student_id,
            )));
        }
        if self.identities.manager(manager_id)?.is_none() {
            return Err(ContractServiceError::IdNotFound(EntityRef::Manager(
                manager_id,
            )));
        }
        if self.identities.monitor(monitor_id)?.is_none() {
            return Err(ContractServiceError::IdNotFound(EntityRef::Monitor(
                monitor_id,
            )));
        }

        let contract = self.contracts.insert(ContractDraft {
            offer,
            student: student_id,
            manager: manager_id,
            monitor: monitor_id,
        })?;

        info!(contract = %contract.id, offer = %offer_id, student = %student_id, "contract drafted");
        Ok(contract)
    }

    pub fn sign(
        &self,
        contract_id: ContractId,
        role: SigningRole,
    ) -> Result<Contract, ContractServiceError> {
        self.sign_at(contract_id, role, Utc::now())
    }

    /// Apply `role`'s signature with an explicit timestamp.
    pub fn sign_at(
        &self,
        contract_id: ContractId,
        role: SigningRole,
        at: DateTime<Utc>,
    ) -> Result<Contract, ContractServiceError> {
        let current = self.get(contract_id)?;
        let next = current.signed_by(role, at).map_err(|error| {
            warn!(contract = %contract_id, %role, %error, "signature rejected");
            error
        })?;

        match self.contracts.replace(&current, next.clone()) {
            Ok(()) => {
                info!(
                    contract = %contract_id,
                    %role,
                    stage = next.stage().label(),
                    "contract signed"
                );
                Ok(next)
            }
            Err(RepositoryError::Conflict) => {
                // Report the outcome against whatever the competing writer stored.
                let latest = self.get(contract_id)?;
                match latest.signed_by(role, at) {
                    Err(error) => Err(error.into()),
                    Ok(_) => Err(RepositoryError::Conflict.into()),
                }
            }
            Err(RepositoryError::NotFound) => Err(ContractServiceError::IdNotFound(
                EntityRef::Contract(contract_id),
            )),
            Err(other) => Err(other.into()),
        }
    }

    pub fn get(&self, contract_id: ContractId) -> Result<Contract, ContractServiceError> {
        self.contracts
            .fetch(contract_id)?
            .ok_or(ContractServiceError::IdNotFound(EntityRef::Contract(
                contract_id,
            )))
    }

    /// The contract, but only while it sits in `stage`.
    pub fn fetch_in_stage(
        &self,
        contract_id: ContractId,
        stage: ContractStage,
    ) -> Result<Option<Contract>, ContractServiceError> {
        self.first(&ContractQuery::all().with_id(contract_id).in_stage(stage))
    }

    /// Contracts no one has signed yet.
    pub fn awaiting_manager(&self) -> Result<Vec<Contract>, ContractServiceError> {
        self.all(&ContractQuery::all().in_stage(ContractStage::Draft))
    }

    /// Manager-signed contracts on offers published by this monitor.
    pub fn awaiting_monitor(
        &self,
        monitor_id: MonitorId,
    ) -> Result<Vec<Contract>, ContractServiceError> {
        self.all(
            &ContractQuery::all()
                .in_stage(ContractStage::AwaitingMonitor)
                .created_by(monitor_id),
        )
    }

    pub fn awaiting_student(
        &self,
        student_id: StudentId,
    ) -> Result<Option<Contract>, ContractServiceError> {
        self.first(
            &ContractQuery::all()
                .in_stage(ContractStage::AwaitingStudent)
                .for_student(student_id),
        )
    }

    pub fn signed_by_manager(
        &self,
        manager_id: ManagerId,
    ) -> Result<Vec<Contract>, ContractServiceError> {
        self.all(
            &ContractQuery::all()
                .from_stage(ContractStage::AwaitingMonitor)
                .for_manager(manager_id),
        )
    }

    pub fn signed_by_monitor(
        &self,
        monitor_id: MonitorId,
    ) -> Result<Vec<Contract>, ContractServiceError> {
        self.all(
            &ContractQuery::all()
                .from_stage(ContractStage::AwaitingStudent)
                .for_monitor(monitor_id),
        )
    }

    pub fn completed_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Option<Contract>, ContractServiceError> {
        self.first(
            &ContractQuery::all()
                .in_stage(ContractStage::Complete)
                .for_student(student_id),
        )
    }

    pub fn by_matricule(&self, matricule: &str) -> Result<Option<Contract>, ContractServiceError> {
        match self.identities.student_by_matricule(matricule)? {
            Some(student) => self.first(&ContractQuery::all().for_student(student.id)),
            None => Ok(None),
        }
    }

    pub fn exists_for_student(&self, student_id: StudentId) -> Result<bool, ContractServiceError> {
        Ok(self
            .first(&ContractQuery::all().for_student(student_id))?
            .is_some())
    }

    pub fn exists_for_matricule(&self, matricule: &str) -> Result<bool, ContractServiceError> {
        Ok(self.by_matricule(matricule)?.is_some())
    }

    fn all(&self, query: &ContractQuery) -> Result<Vec<Contract>, ContractServiceError> {
        Ok(self.contracts.matching(query)?)
    }

    fn first(&self, query: &ContractQuery) -> Result<Option<Contract>, ContractServiceError> {
        Ok(self.contracts.matching(query)?.into_iter().next())
    }
}

/// Error raised by the contract service.
#[derive(Debug, thiserror::Error)]
pub enum ContractServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("{0} does not exist")]
    IdNotFound(EntityRef),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
