//! On-disk TLE cache.
//!
//! One `<designator>.tle` record per satellite, overwritten in place. Writes
//! go to a temporary file in the same directory and are renamed over the
//! record, so readers see either the old or the new pair, never a mix.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pass_core::{SatelliteId, TleFormatError, TwoLineElement};
use pass_importer::{CatalogSource, FetchError};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

const RECORD_EXTENSION: &str = "tle";

/// Errors reading or writing a stored record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no TLE stored for `{id}`")]
    MissingTle { id: SatelliteId },
    #[error("stored TLE for `{id}` is corrupt: {source}")]
    CorruptTle {
        id: SatelliteId,
        #[source]
        source: TleFormatError,
    },
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why refreshing one designator failed. The stored record is untouched.
#[derive(Debug, Error)]
pub enum UpdateFailure {
    #[error("network failure for `{id}`: {source}")]
    Network {
        id: SatelliteId,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-designator outcome of a batch refresh, in request order.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub outcomes: Vec<(SatelliteId, Result<(), UpdateFailure>)>,
}

impl UpdateReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &SatelliteId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_ok())
            .map(|(id, _)| id)
    }

    pub fn failed(&self) -> impl Iterator<Item = (&SatelliteId, &UpdateFailure)> {
        self.outcomes
            .iter()
            .filter_map(|(id, outcome)| outcome.as_ref().err().map(|err| (id, err)))
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Collapse into the refreshed designators, or every failure at once.
    pub fn into_result(self) -> Result<Vec<SatelliteId>, AggregateUpdateFailure> {
        let attempted = self.outcomes.len();
        let mut refreshed = Vec::new();
        let mut failures = Vec::new();
        for (id, outcome) in self.outcomes {
            match outcome {
                Ok(()) => refreshed.push(id),
                Err(err) => failures.push((id, err)),
            }
        }
        if failures.is_empty() {
            Ok(refreshed)
        } else {
            Err(AggregateUpdateFailure {
                attempted,
                failures,
            })
        }
    }
}

/// Every designator that failed in a batch refresh, with its cause.
#[derive(Debug)]
pub struct AggregateUpdateFailure {
    pub attempted: usize,
    pub failures: Vec<(SatelliteId, UpdateFailure)>,
}

impl fmt::Display for AggregateUpdateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} designator(s) failed to update",
            self.failures.len(),
            self.attempted
        )?;
        for (id, err) in &self.failures {
            write!(f, "; {id}: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateUpdateFailure {}

/// Directory-backed store of one element set per designator.
#[derive(Debug, Clone)]
pub struct TleStore {
    dir: PathBuf,
}

impl TleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, id: &SatelliteId) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXTENSION}", id.as_str()))
    }

    /// Read the stored element set for `id`.
    pub fn get(&self, id: &SatelliteId) -> Result<TwoLineElement, StoreError> {
        let path = self.record_path(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::MissingTle { id: id.clone() });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        TwoLineElement::from_record(&text).map_err(|source| StoreError::CorruptTle {
            id: id.clone(),
            source,
        })
    }

    /// Atomically replace the record for `id`.
    pub fn put(&self, id: &SatelliteId, tle: &TwoLineElement) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let mut scratch = NamedTempFile::new_in(&self.dir).map_err(io_error(&self.dir))?;
        scratch
            .write_all(tle.to_record().as_bytes())
            .and_then(|()| scratch.as_file().sync_all())
            .map_err(io_error(scratch.path()))?;
        let dest = self.record_path(id);
        scratch.persist(&dest).map_err(|err| StoreError::Io {
            path: dest.clone(),
            source: err.error,
        })?;
        Ok(())
    }

    /// Fetch a fresh element set for `id` and store it. On any failure the
    /// previous record stays as it was.
    pub fn update(
        &self,
        catalog: &impl CatalogSource,
        id: &SatelliteId,
    ) -> Result<(), UpdateFailure> {
        let tle = catalog.fetch(id).map_err(|source| UpdateFailure::Network {
            id: id.clone(),
            source,
        })?;
        self.put(id, &tle)?;
        Ok(())
    }

    /// Refresh every designator in turn. One failure never stops the rest.
    pub fn update_all<'a>(
        &self,
        catalog: &impl CatalogSource,
        ids: impl IntoIterator<Item = &'a SatelliteId>,
    ) -> UpdateReport {
        let mut report = UpdateReport::default();
        for id in ids {
            let outcome = self.update(catalog, id);
            match &outcome {
                Ok(()) => info!(designator = %id, "element set updated"),
                Err(err) => warn!(designator = %id, "element set not updated: {err}"),
            }
            report.outcomes.push((id.clone(), outcome));
        }
        report
    }

    /// Designators that currently have a record, sorted.
    pub fn list(&self) -> Result<Vec<SatelliteId>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };
        let mut ids: Vec<SatelliteId> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == RECORD_EXTENSION)
                    .unwrap_or(false)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| SatelliteId::new(stem).ok())
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + use<> {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}
