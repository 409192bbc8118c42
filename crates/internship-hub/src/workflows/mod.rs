//! Placement workflows: the identity roster collaborator, curriculum review, and tri-party
//! contract signatures.

pub mod contract;
pub mod curriculum;
pub mod identity;
pub mod memory;
pub mod store;

pub use memory::{
    InMemoryContractRepository, InMemoryCurriculumRepository, InMemoryIdentityStore,
};
pub use store::{EntityRef, RepositoryError};
