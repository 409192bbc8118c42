use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{
    Manager, ManagerId, Monitor, MonitorId, Offer, OfferId, Student, StudentId, Supervisor,
    SupervisorId,
};

#[derive(Debug)]
pub enum DirectoryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownKind { line: usize, kind: String },
    MissingField { line: usize, field: &'static str },
    InvalidMatricule { line: usize, matricule: String },
    DuplicateId { line: usize, kind: &'static str, id: u64 },
    UnknownCreator { line: usize, creator: u64 },
}

impl std::fmt::Display for DirectoryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryImportError::Io(err) => write!(f, "failed to read roster: {}", err),
            DirectoryImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            DirectoryImportError::UnknownKind { line, kind } => {
                write!(f, "line {}: unknown account kind '{}'", line, kind)
            }
            DirectoryImportError::MissingField { line, field } => {
                write!(f, "line {}: missing required column '{}'", line, field)
            }
            DirectoryImportError::InvalidMatricule { line, matricule } => write!(
                f,
                "line {}: matricule '{}' must be exactly 7 digits",
                line, matricule
            ),
            DirectoryImportError::DuplicateId { line, kind, id } => {
                write!(f, "line {}: {} id {} appears more than once", line, kind, id)
            }
            DirectoryImportError::UnknownCreator { line, creator } => write!(
                f,
                "line {}: offer creator {} is not a listed monitor",
                line, creator
            ),
        }
    }
}

impl std::error::Error for DirectoryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectoryImportError::Io(err) => Some(err),
            DirectoryImportError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DirectoryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DirectoryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Accounts and offers used to seed an identity store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryRoster {
    pub students: Vec<Student>,
    pub managers: Vec<Manager>,
    pub monitors: Vec<Monitor>,
    pub supervisors: Vec<Supervisor>,
    pub offers: Vec<Offer>,
}

impl DirectoryRoster {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses `kind,id,first_name,last_name,email,matricule,department,title,creator_id` rows.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DirectoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut roster = Self::default();
        let mut seen: BTreeSet<(&'static str, u64)> = BTreeSet::new();
        let mut creators: Vec<(usize, MonitorId)> = Vec::new();

        for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
            let row = record?;
            let line = index + 2;
            let kind = row.kind.to_ascii_lowercase();
            let kind: &'static str = match kind.as_str() {
                "student" => "student",
                "manager" => "manager",
                "monitor" => "monitor",
                "supervisor" => "supervisor",
                "offer" => "offer",
                _ => {
                    return Err(DirectoryImportError::UnknownKind {
                        line,
                        kind: row.kind,
                    })
                }
            };

            if !seen.insert((kind, row.id)) {
                return Err(DirectoryImportError::DuplicateId {
                    line,
                    kind,
                    id: row.id,
                });
            }
            if let ("offer", Some(creator)) = (kind, row.creator_id) {
                creators.push((line, MonitorId(creator)));
            }

            roster.push_row(kind, line, row)?;
        }

        let monitors: BTreeSet<MonitorId> =
            roster.monitors.iter().map(|monitor| monitor.id).collect();
        if let Some((line, creator)) = creators
            .into_iter()
            .find(|(_, creator)| !monitors.contains(creator))
        {
            return Err(DirectoryImportError::UnknownCreator {
                line,
                creator: creator.0,
            });
        }

        Ok(roster)
    }

    fn push_row(
        &mut self,
        kind: &'static str,
        line: usize,
        row: RosterRow,
    ) -> Result<(), DirectoryImportError> {
        match kind {
            "student" => {
                let matricule = row.required(line, "matricule", &row.matricule)?;
                if matricule.len() != 7 || !matricule.chars().all(|c| c.is_ascii_digit()) {
                    return Err(DirectoryImportError::InvalidMatricule { line, matricule });
                }
                self.students.push(Student {
                    id: StudentId(row.id),
                    first_name: row.required(line, "first_name", &row.first_name)?,
                    last_name: row.required(line, "last_name", &row.last_name)?,
                    email: row.required(line, "email", &row.email)?,
                    matricule,
                    department: row.required(line, "department", &row.department)?,
                    principal_curriculum: None,
                    supervisor: None,
                });
            }
            "manager" => self.managers.push(Manager {
                id: ManagerId(row.id),
                first_name: row.required(line, "first_name", &row.first_name)?,
                last_name: row.required(line, "last_name", &row.last_name)?,
                email: row.required(line, "email", &row.email)?,
            }),
            "monitor" => self.monitors.push(Monitor {
                id: MonitorId(row.id),
                first_name: row.required(line, "first_name", &row.first_name)?,
                last_name: row.required(line, "last_name", &row.last_name)?,
                email: row.required(line, "email", &row.email)?,
            }),
            "supervisor" => self.supervisors.push(Supervisor {
                id: SupervisorId(row.id),
                first_name: row.required(line, "first_name", &row.first_name)?,
                last_name: row.required(line, "last_name", &row.last_name)?,
                email: row.required(line, "email", &row.email)?,
                department: row.required(line, "department", &row.department)?,
            }),
            _ => {
                let creator = row
                    .creator_id
                    .ok_or(DirectoryImportError::MissingField {
                        line,
                        field: "creator_id",
                    })?;
                self.offers.push(Offer {
                    id: OfferId(row.id),
                    title: row.required(line, "title", &row.title)?,
                    department: row.required(line, "department", &row.department)?,
                    creator: MonitorId(creator),
                });
            }
        }

        Ok(())
    }

    /// Small roster used by the demo command and when no CSV is configured.
    pub fn demo() -> Self {
        Self {
            students: vec![
                Student {
                    id: StudentId(1),
                    first_name: "Tea".to_string(),
                    last_name: "Candle".to_string(),
                    email: "cant@outlook.com".to_string(),
                    matricule: "4673943".to_string(),
                    department: "info".to_string(),
                    principal_curriculum: None,
                    supervisor: None,
                },
                Student {
                    id: StudentId(2),
                    first_name: "Olivier".to_string(),
                    last_name: "Gagnon".to_string(),
                    email: "ogagnon@college.qc.ca".to_string(),
                    matricule: "1740934".to_string(),
                    department: "info".to_string(),
                    principal_curriculum: None,
                    supervisor: None,
                },
            ],
            managers: vec![Manager {
                id: ManagerId(1),
                first_name: "Nathalie".to_string(),
                last_name: "Roy".to_string(),
                email: "nroy@college.qc.ca".to_string(),
            }],
            monitors: vec![Monitor {
                id: MonitorId(1),
                first_name: "Marc".to_string(),
                last_name: "Tremblay".to_string(),
                email: "mtremblay@cae.com".to_string(),
            }],
            supervisors: vec![Supervisor {
                id: SupervisorId(1),
                first_name: "Julie".to_string(),
                last_name: "Bouchard".to_string(),
                email: "jbouchard@college.qc.ca".to_string(),
                department: "info".to_string(),
            }],
            offers: vec![Offer {
                id: OfferId(1),
                title: "Backend developer intern".to_string(),
                department: "info".to_string(),
                creator: MonitorId(1),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    kind: String,
    id: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    first_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    last_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    matricule: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    department: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(default)]
    creator_id: Option<u64>,
}

impl RosterRow {
    fn required(
        &self,
        line: usize,
        field: &'static str,
        value: &Option<String>,
    ) -> Result<String, DirectoryImportError> {
        value
            .clone()
            .ok_or(DirectoryImportError::MissingField { line, field })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
