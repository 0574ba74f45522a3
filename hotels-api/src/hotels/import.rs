//! CSV import pipeline for hotels.
//!
//! 1. Decode the upload into rows (`hotels::csv`)
//! 2. Validate every row in parallel on a dedicated rayon pool
//! 3. Partition into candidates and per-row error records
//! 4. Persist all candidates with one bulk insert
//!
//! Decode and storage failures abort the whole import. Field-level failures
//! never do; they end up in [`ImportOutcome::error_records`].

use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::hotels::csv::{self, DecodeError, RawRow};
use crate::hotels::report::{ImportErrorRecord, ImportOutcome, ImportRecord};
use crate::hotels::repository::{HotelRepository, RepositoryError};
use crate::hotels::validation::{self, HotelCandidate, Violation};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Malformed(#[from] DecodeError),
    #[error("duplicate hotel name: {0}")]
    DuplicateName(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateKey { .. } => ImportError::DuplicateName(err.to_string()),
            RepositoryError::Storage(message) => ImportError::Storage(message),
        }
    }
}

type RowResult = (usize, Result<HotelCandidate, Vec<Violation>>);

/// Runs CSV imports against a [`HotelRepository`].
pub struct HotelImporter {
    repository: Arc<dyn HotelRepository>,
    workers: Arc<rayon::ThreadPool>,
}

impl HotelImporter {
    pub fn new(
        repository: Arc<dyn HotelRepository>,
        validation_workers: usize,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(validation_workers.max(1))
            .thread_name(|index| format!("hotel-import-{index}"))
            .build()?;

        Ok(Self {
            repository,
            workers: Arc::new(workers),
        })
    }

    /// Import one uploaded CSV buffer.
    ///
    /// On success the outcome lists every decoded row exactly once. On a
    /// storage failure nothing was persisted and no partial outcome is
    /// returned, so individually valid rows are never reported as imported.
    pub async fn import_batch(&self, buffer: Vec<u8>) -> Result<ImportOutcome, ImportError> {
        let workers = Arc::clone(&self.workers);

        let (candidates, outcome) = tokio::task::spawn_blocking(move || {
            let rows = csv::decode(&buffer)?;
            let results = workers.install(|| validate_rows(rows));
            Ok::<_, DecodeError>(partition(results))
        })
        .await
        .map_err(|err| ImportError::Storage(format!("validation worker failed: {err}")))??;

        log::info!(
            "hotel import: {} rows decoded, {} valid, {} rejected",
            outcome.total_rows(),
            candidates.len(),
            outcome.error_records.len()
        );

        if !candidates.is_empty() {
            match self.repository.bulk_insert(&candidates).await {
                Ok(inserted) => log::info!("hotel import: persisted {} hotels", inserted),
                Err(err) => {
                    log::warn!("hotel import aborted, nothing persisted: {}", err);
                    return Err(ImportError::from(err));
                }
            }
        }

        Ok(outcome)
    }
}

/// Validate rows independently. The indexed parallel collect keeps input
/// order, and each result carries its 1-based row number.
fn validate_rows(rows: Vec<RawRow>) -> Vec<RowResult> {
    rows.into_par_iter()
        .enumerate()
        .map(|(index, row)| (index + 1, validation::validate_row(&row)))
        .collect()
}

fn partition(results: Vec<RowResult>) -> (Vec<HotelCandidate>, ImportOutcome) {
    let mut candidates = Vec::new();
    let mut outcome = ImportOutcome::default();

    for (row, result) in results {
        match result {
            Ok(candidate) => {
                candidates.push(candidate);
                outcome.success_records.push(ImportRecord { row });
            }
            Err(violations) => outcome.error_records.push(ImportErrorRecord {
                row,
                errors: violations.into_iter().map(|v| v.message).collect(),
            }),
        }
    }

    (candidates, outcome)
}
