//! Tri-party internship contracts and their fixed signature order.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Contract, ContractDraft, ContractId, ContractStage, ContractView, NewContract, Signature,
    SignatureError, Signatures, SigningRole,
};
pub use repository::{ContractQuery, ContractRepository, StageFilter};
pub use router::contract_router;
pub use service::{ContractService, ContractServiceError};
