use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::identity::StudentId;

const FALLBACK_FILE_NAME: &str = "curriculum";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurriculumId(pub u64);

impl fmt::Display for CurriculumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review state of an uploaded curriculum. Settles once and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Pending,
    Valid,
    Invalid,
}

impl Validity {
    pub const fn label(self) -> &'static str {
        match self {
            Validity::Pending => "pending",
            Validity::Valid => "valid",
            Validity::Invalid => "invalid",
        }
    }

    pub const fn is_settled(self) -> bool {
        !matches!(self, Validity::Pending)
    }

    pub const fn from_decision(accept: bool) -> Self {
        if accept {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }
}

/// Raw upload as received from the HTTP layer or CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurriculumUpload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
    pub student_id: Option<StudentId>,
}

/// Unsaved curriculum; the store assigns the id on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriculumDraft {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub owner: StudentId,
    pub validity: Validity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    pub id: CurriculumId,
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub owner: StudentId,
    pub validity: Validity,
}

impl Curriculum {
    pub fn from_draft(id: CurriculumId, draft: CurriculumDraft) -> Self {
        Self {
            id,
            name: draft.name,
            mime_type: draft.mime_type,
            data: draft.data,
            owner: draft.owner,
            validity: draft.validity,
        }
    }

    /// The reviewed copy, or `None` when a decision was already recorded.
    pub fn decide(&self, accept: bool) -> Option<Self> {
        if self.validity.is_settled() {
            return None;
        }

        let mut decided = self.clone();
        decided.validity = Validity::from_decision(accept);
        Some(decided)
    }

    pub fn view(&self) -> CurriculumView {
        CurriculumView {
            id: self.id,
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.data.len(),
            owner: self.owner,
            validity: self.validity.label(),
        }
    }
}

/// Metadata exposed over the API; the file body is served separately.
#[derive(Debug, Clone, Serialize)]
pub struct CurriculumView {
    pub id: CurriculumId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub owner: StudentId,
    pub validity: &'static str,
}

/// Reviewer decision on one curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CurriculumReview {
    #[serde(default)]
    pub curriculum_id: Option<CurriculumId>,
    pub valid: bool,
}

/// Keeps only the final path component of a client supplied file name.
pub fn sanitize_file_name(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    let candidate = normalized
        .rsplit('/')
        .next()
        .map(str::trim)
        .unwrap_or_default();

    match candidate {
        "" | "." | ".." => FALLBACK_FILE_NAME.to_string(),
        name => name.to_string(),
    }
}
