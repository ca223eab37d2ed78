//! Process-wide owner of the retailer dataset and its load state.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::dataset::{Dataset, DatasetStats};
use crate::error::{EngineError, LoadError};
use crate::retailer::RetailerMatch;

/// Readiness of a [`StoreEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No load attempt has finished yet.
    Pending,
    Ready,
    /// The load attempt failed; only a restart recovers.
    Failed,
}

/// Owns the retailer dataset for the lifetime of a process.
///
/// The outcome of the single load attempt is published through a write-once
/// cell, so concurrent readers either see nothing or the complete dataset.
/// Queries take `&self` and never lock.
#[derive(Debug)]
pub struct StoreEngine {
    dataset_path: PathBuf,
    outcome: OnceLock<Result<Dataset, String>>,
}

impl StoreEngine {
    #[must_use]
    pub fn new(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            outcome: OnceLock::new(),
        }
    }

    /// An engine that is already ready with `dataset`.
    #[must_use]
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            dataset_path: PathBuf::new(),
            outcome: OnceLock::from(Ok(dataset)),
        }
    }

    #[must_use]
    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    /// Loads the dataset from the configured path and publishes it.
    ///
    /// A failure is recorded too: the engine then reports
    /// [`EngineStatus::Failed`] and every query answers
    /// [`EngineError::NotReady`].
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] of the attempt, or
    /// [`LoadError::AlreadyLoaded`] if an attempt already finished.
    pub fn load(&self) -> Result<DatasetStats, LoadError> {
        if self.outcome.get().is_some() {
            return Err(LoadError::AlreadyLoaded);
        }

        match Dataset::load(&self.dataset_path) {
            Ok(dataset) => {
                let stats = dataset.stats();
                self.outcome
                    .set(Ok(dataset))
                    .map_err(|_| LoadError::AlreadyLoaded)?;
                tracing::info!(
                    path = %self.dataset_path.display(),
                    total_rows = stats.total_rows,
                    valid_rows = stats.valid_rows,
                    excluded_rows = stats.excluded_rows,
                    zip_codes = stats.zip_codes,
                    "retailer dataset loaded"
                );
                Ok(stats)
            }
            Err(error) => {
                tracing::error!(
                    path = %self.dataset_path.display(),
                    error = %error,
                    "retailer dataset failed to load"
                );
                if self.outcome.set(Err(error.to_string())).is_err() {
                    return Err(LoadError::AlreadyLoaded);
                }
                Err(error)
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        match self.outcome.get() {
            None => EngineStatus::Pending,
            Some(Ok(_)) => EngineStatus::Ready,
            Some(Err(_)) => EngineStatus::Failed,
        }
    }

    /// True once a load succeeded, even if no row had a usable location.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.status() == EngineStatus::Ready
    }

    /// Message of the failed load attempt, if there was one.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        match self.outcome.get() {
            Some(Err(message)) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn stats(&self) -> Option<DatasetStats> {
        self.dataset().ok().map(Dataset::stats)
    }

    /// The loaded dataset.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotReady`] unless a load succeeded.
    pub fn dataset(&self) -> Result<&Dataset, EngineError> {
        match self.outcome.get() {
            Some(Ok(dataset)) => Ok(dataset),
            _ => Err(EngineError::NotReady),
        }
    }

    /// Top `k` retailers nearest to `(lat, lon)`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotReady`] unless a load succeeded.
    pub fn closest_by_coords(
        &self,
        lat: f64,
        lon: f64,
        k: usize,
    ) -> Result<Vec<RetailerMatch<'_>>, EngineError> {
        Ok(self.dataset()?.closest_by_coords(lat, lon, k))
    }

    /// Top `k` retailers nearest to the centroid of `zip_code`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotReady`] unless a load succeeded.
    pub fn closest_by_zip(
        &self,
        zip_code: &str,
        k: usize,
    ) -> Result<Vec<RetailerMatch<'_>>, EngineError> {
        Ok(self.dataset()?.closest_by_zip(zip_code, k))
    }
}
