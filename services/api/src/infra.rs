use internship_hub::error::AppError;
use internship_hub::workflows::contract::ContractService;
use internship_hub::workflows::curriculum::CurriculumService;
use internship_hub::workflows::identity::{DirectoryRoster, DirectoryService};
use internship_hub::workflows::{
    InMemoryContractRepository, InMemoryCurriculumRepository, InMemoryIdentityStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Curricula = CurriculumService<InMemoryCurriculumRepository, InMemoryIdentityStore>;
pub(crate) type Contracts = ContractService<InMemoryContractRepository, InMemoryIdentityStore>;
pub(crate) type Directory = DirectoryService<InMemoryIdentityStore>;

/// The three workflow services sharing one identity store.
#[derive(Clone)]
pub(crate) struct PlacementServices {
    pub(crate) curricula: Arc<Curricula>,
    pub(crate) contracts: Arc<Contracts>,
    pub(crate) directory: Arc<Directory>,
}

impl PlacementServices {
    pub(crate) fn in_memory(roster: DirectoryRoster) -> Self {
        let identities = Arc::new(InMemoryIdentityStore::from_roster(roster));
        let curricula = Arc::new(CurriculumService::new(
            Arc::new(InMemoryCurriculumRepository::default()),
            identities.clone(),
        ));
        let contracts = Arc::new(ContractService::new(
            Arc::new(InMemoryContractRepository::default()),
            identities.clone(),
        ));
        let directory = Arc::new(DirectoryService::new(identities));

        Self {
            curricula,
            contracts,
            directory,
        }
    }
}

/// Reads the roster CSV when one is configured, otherwise falls back to the demo roster.
pub(crate) fn load_roster(path: Option<&Path>) -> Result<DirectoryRoster, AppError> {
    let roster = match path {
        Some(path) => {
            let roster = DirectoryRoster::from_path(path)?;
            info!(path = %path.display(), "directory roster imported");
            roster
        }
        None => DirectoryRoster::demo(),
    };

    info!(
        students = roster.students.len(),
        managers = roster.managers.len(),
        monitors = roster.monitors.len(),
        supervisors = roster.supervisors.len(),
        offers = roster.offers.len(),
        "identity store seeded"
    );
    Ok(roster)
}
