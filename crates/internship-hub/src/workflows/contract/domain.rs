use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::identity::{ManagerId, MonitorId, Offer, OfferId, StudentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractId(pub u64);

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Party allowed to sign a contract, in signing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningRole {
    Manager,
    Monitor,
    Student,
}

impl SigningRole {
    pub const fn ordered() -> [Self; 3] {
        [Self::Manager, Self::Monitor, Self::Student]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Monitor => "monitor",
            Self::Student => "student",
        }
    }

    /// Roles that must have signed before this one may.
    pub const fn predecessors(self) -> &'static [SigningRole] {
        match self {
            Self::Manager => &[],
            Self::Monitor => &[Self::Manager],
            Self::Student => &[Self::Manager, Self::Monitor],
        }
    }
}

impl fmt::Display for SigningRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Position of a contract in its signature sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStage {
    Draft,
    AwaitingMonitor,
    AwaitingStudent,
    Complete,
}

impl ContractStage {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Draft,
            Self::AwaitingMonitor,
            Self::AwaitingStudent,
            Self::Complete,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::AwaitingMonitor => "awaiting_monitor",
            Self::AwaitingStudent => "awaiting_student",
            Self::Complete => "complete",
        }
    }

    /// The party whose signature moves the contract out of this stage.
    pub const fn next_signer(self) -> Option<SigningRole> {
        match self {
            Self::Draft => Some(SigningRole::Manager),
            Self::AwaitingMonitor => Some(SigningRole::Monitor),
            Self::AwaitingStudent => Some(SigningRole::Student),
            Self::Complete => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signed_at: DateTime<Utc>,
}

/// Signature slots encoded so that only in-order combinations are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Signatures {
    Draft,
    AwaitingMonitor {
        manager: Signature,
    },
    AwaitingStudent {
        manager: Signature,
        monitor: Signature,
    },
    Complete {
        manager: Signature,
        monitor: Signature,
        student: Signature,
    },
}

impl Signatures {
    pub const fn stage(&self) -> ContractStage {
        match self {
            Signatures::Draft => ContractStage::Draft,
            Signatures::AwaitingMonitor { .. } => ContractStage::AwaitingMonitor,
            Signatures::AwaitingStudent { .. } => ContractStage::AwaitingStudent,
            Signatures::Complete { .. } => ContractStage::Complete,
        }
    }

    pub fn slot(&self, role: SigningRole) -> Option<Signature> {
        match (self, role) {
            (Signatures::AwaitingMonitor { manager }, SigningRole::Manager)
            | (Signatures::AwaitingStudent { manager, .. }, SigningRole::Manager)
            | (Signatures::Complete { manager, .. }, SigningRole::Manager) => Some(*manager),
            (Signatures::AwaitingStudent { monitor, .. }, SigningRole::Monitor)
            | (Signatures::Complete { monitor, .. }, SigningRole::Monitor) => Some(*monitor),
            (Signatures::Complete { student, .. }, SigningRole::Student) => Some(*student),
            _ => None,
        }
    }

    /// Apply `role`'s signature, advancing exactly one stage.
    pub fn sign(&self, role: SigningRole, at: DateTime<Utc>) -> Result<Self, SignatureError> {
        let signature = Signature { signed_at: at };
        match (*self, role) {
            (Signatures::Draft, SigningRole::Manager) => Ok(Signatures::AwaitingMonitor {
                manager: signature,
            }),
            (Signatures::AwaitingMonitor { manager }, SigningRole::Monitor) => {
                Ok(Signatures::AwaitingStudent {
                    manager,
                    monitor: signature,
                })
            }
            (Signatures::AwaitingStudent { manager, monitor }, SigningRole::Student) => {
                Ok(Signatures::Complete {
                    manager,
                    monitor,
                    student: signature,
                })
            }
            _ if self.slot(role).is_some() => Err(SignatureError::AlreadySigned { role }),
            _ => {
                let missing = role
                    .predecessors()
                    .iter()
                    .copied()
                    .find(|predecessor| self.slot(*predecessor).is_none())
                    .unwrap_or(SigningRole::Manager);
                Err(SignatureError::OutOfOrder { role, missing })
            }
        }
    }
}

/// Rejected signature attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("the {role} has already signed this contract")]
    AlreadySigned { role: SigningRole },
    #[error("the {role} cannot sign before the {missing}")]
    OutOfOrder {
        role: SigningRole,
        missing: SigningRole,
    },
}

/// Request to open a contract once an application has been accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewContract {
    #[serde(default)]
    pub offer_id: Option<OfferId>,
    #[serde(default)]
    pub student_id: Option<StudentId>,
    #[serde(default)]
    pub manager_id: Option<ManagerId>,
    #[serde(default)]
    pub monitor_id: Option<MonitorId>,
}

/// Unsaved contract with every party resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDraft {
    pub offer: Offer,
    pub student: StudentId,
    pub manager: ManagerId,
    pub monitor: MonitorId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub offer: Offer,
    pub student: StudentId,
    pub manager: ManagerId,
    pub monitor: MonitorId,
    pub signatures: Signatures,
}

impl Contract {
    pub fn from_draft(id: ContractId, draft: ContractDraft) -> Self {
        Self {
            id,
            offer: draft.offer,
            student: draft.student,
            manager: draft.manager,
            monitor: draft.monitor,
            signatures: Signatures::Draft,
        }
    }

    pub const fn stage(&self) -> ContractStage {
        self.signatures.stage()
    }

    pub fn manager_signature(&self) -> Option<Signature> {
        self.signatures.slot(SigningRole::Manager)
    }

    pub fn monitor_signature(&self) -> Option<Signature> {
        self.signatures.slot(SigningRole::Monitor)
    }

    pub fn student_signature(&self) -> Option<Signature> {
        self.signatures.slot(SigningRole::Student)
    }

    pub fn signed_by(&self, role: SigningRole, at: DateTime<Utc>) -> Result<Self, SignatureError> {
        let signatures = self.signatures.sign(role, at)?;
        Ok(Self {
            signatures,
            ..self.clone()
        })
    }

    pub fn view(&self) -> ContractView {
        ContractView {
            id: self.id,
            offer_id: self.offer.id,
            offer_title: self.offer.title.clone(),
            student: self.student,
            manager: self.manager,
            monitor: self.monitor,
            stage: self.stage().label(),
            manager_signed_at: self.manager_signature().map(|s| s.signed_at),
            monitor_signed_at: self.monitor_signature().map(|s| s.signed_at),
            student_signed_at: self.student_signature().map(|s| s.signed_at),
        }
    }
}

/// Flattened contract exposed over the API with one field per signature slot.
#[derive(Debug, Clone, Serialize)]
pub struct ContractView {
    pub id: ContractId,
    pub offer_id: OfferId,
    pub offer_title: String,
    pub student: StudentId,
    pub manager: ManagerId,
    pub monitor: MonitorId,
    pub stage: &'static str,
    pub manager_signed_at: Option<DateTime<Utc>>,
    pub monitor_signed_at: Option<DateTime<Utc>>,
    pub student_signed_at: Option<DateTime<Utc>>,
}
