use crate::config::ImportConfig;
use crate::error::TripError;
use crate::models::{InvoiceId, RawInvoiceEntry};
use crate::service::session::{RecalcReason, Recalculation, TripSession};
use crate::spreadsheet;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Read;

/// What a batch import added to the trip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub assigned_ids: Vec<InvoiceId>,
    pub imported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub report: ImportReport,
    pub recalculation: Recalculation,
}

/// Normalizes bulk invoice data into records and merges them into a trip.
///
/// Never touches financial fields; those come from the recompute that
/// follows every import.
#[derive(Debug, Clone)]
pub struct BatchImportAdapter {
    config: ImportConfig,
}

impl BatchImportAdapter {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Imports `entries` in order. An empty batch is a normal result; a batch
    /// the engine cannot allocate is merged whole or not at all.
    pub fn import(
        &self,
        session: &mut TripSession,
        entries: Vec<RawInvoiceEntry>,
    ) -> Result<ImportOutcome, TripError> {
        let limit = self.config.max_batch_size;
        if entries.len() > limit {
            tracing::warn!(
                "Trip {}: refused batch of {} invoices (limit {})",
                session.trip_id(),
                entries.len(),
                limit
            );
            return Err(TripError::BatchTooLarge {
                received: entries.len(),
                limit,
            });
        }

        let assigned_ids: Vec<InvoiceId> = entries
            .into_iter()
            .map(|entry| session.admit(entry))
            .collect();
        let imported = assigned_ids.len();

        let recalculation = match session.recalculate(RecalcReason::BatchImported { count: imported }) {
            Ok(recalculation) => recalculation,
            Err(e) => {
                session.discard(&assigned_ids);
                return Err(e);
            }
        };

        tracing::info!("Trip {}: imported {} invoices", session.trip_id(), imported);

        Ok(ImportOutcome {
            report: ImportReport {
                imported,
                assigned_ids,
                imported_at: Utc::now(),
            },
            recalculation,
        })
    }

    /// Parses a CSV document first; a malformed document imports nothing.
    pub fn import_csv<R: Read>(
        &self,
        session: &mut TripSession,
        reader: R,
    ) -> Result<ImportOutcome, TripError> {
        let entries = spreadsheet::read_entries(reader, self.config.delimiter())?;
        self.import(session, entries)
    }
}
