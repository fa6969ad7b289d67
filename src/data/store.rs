use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use super::loader::{load_centers, load_municipalities};
use crate::error::DataError;
use crate::model::EducationalCenterRecord;
use crate::scoring::{MunicipalityTable, Weights};

/// Where the two tables are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub municipalities: PathBuf,
    pub centers: PathBuf,
}

/// One consistent snapshot of both tables.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub municipalities: MunicipalityTable,
    pub centers: Vec<EducationalCenterRecord>,
    pub loaded_at: DateTime<Local>,
    /// Rows rejected by the loader across both files.
    pub skipped_rows: usize,
}

impl Dataset {
    pub fn load(sources: &DataSources, weights: &Weights) -> Result<Self, DataError> {
        let municipalities = load_municipalities(&sources.municipalities)?;
        let centers = load_centers(&sources.centers)?;
        let table = MunicipalityTable::build(municipalities.records, weights)?;
        Ok(Self {
            municipalities: table,
            centers: centers.records,
            loaded_at: Local::now(),
            skipped_rows: municipalities.skipped + centers.skipped,
        })
    }
}

/// Modification times of both files at load time.
type Stamp = (Option<SystemTime>, Option<SystemTime>);

struct Snapshot {
    dataset: Arc<Dataset>,
    stamp: Stamp,
}

/// Loads the tables once and hands out shared snapshots.
///
/// Readers keep whatever `Arc<Dataset>` they were given; a reload swaps in a
/// new snapshot without touching the old one. A failed reload leaves the
/// current snapshot in place.
pub struct DataStore {
    sources: DataSources,
    weights: Weights,
    current: RwLock<Snapshot>,
}

impl DataStore {
    pub fn open(sources: DataSources, weights: Weights) -> Result<Self, DataError> {
        let stamp = stamp(&sources);
        let dataset = Dataset::load(&sources, &weights)?;
        Ok(Self {
            sources,
            weights,
            current: RwLock::new(Snapshot {
                dataset: Arc::new(dataset),
                stamp,
            }),
        })
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard.dataset),
            Err(poisoned) => Arc::clone(&poisoned.into_inner().dataset),
        }
    }

    /// Reload only if either file changed on disk since the last load.
    /// Returns whether a new snapshot was installed.
    pub fn refresh_if_stale(&self) -> Result<bool, DataError> {
        let now = stamp(&self.sources);
        let previous = match self.current.read() {
            Ok(guard) => guard.stamp,
            Err(poisoned) => poisoned.into_inner().stamp,
        };
        if now == previous {
            log::debug!("Data files unchanged, keeping cached dataset");
            return Ok(false);
        }
        log::debug!("Data files changed on disk, reloading");
        self.install(now)?;
        Ok(true)
    }

    /// Reload unconditionally.
    pub fn reload(&self) -> Result<Arc<Dataset>, DataError> {
        self.install(stamp(&self.sources))
    }

    fn install(&self, stamp: Stamp) -> Result<Arc<Dataset>, DataError> {
        let dataset = match Dataset::load(&self.sources, &self.weights) {
            Ok(d) => Arc::new(d),
            Err(e) => {
                log::warn!("Reload failed, keeping previous data: {}", e);
                return Err(e);
            }
        };
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Snapshot {
            dataset: Arc::clone(&dataset),
            stamp,
        };
        Ok(dataset)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn stamp(sources: &DataSources) -> Stamp {
    (modified(&sources.municipalities), modified(&sources.centers))
}
