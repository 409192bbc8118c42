//! Account roster the placement workflows resolve parties against.

pub mod domain;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;

pub use domain::{
    Manager, ManagerId, Monitor, MonitorId, Offer, OfferId, Student, StudentId, Supervisor,
    SupervisorId,
};
pub use repository::IdentityStore;
pub use roster::{DirectoryImportError, DirectoryRoster};
pub use router::{directory_router, SupervisorAssignment};
pub use service::{DirectoryService, DirectoryServiceError};
