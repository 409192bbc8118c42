//! Curriculum upload, single-decision review, and principal CV selection.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    sanitize_file_name, Curriculum, CurriculumDraft, CurriculumId, CurriculumReview,
    CurriculumUpload, CurriculumView, Validity,
};
pub use repository::CurriculumRepository;
pub use router::{curriculum_router, PrincipalSelection};
pub use service::{CurriculumService, CurriculumServiceError};
