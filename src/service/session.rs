use crate::error::TripError;
use crate::models::{
    AllocationSnapshot, AllocationSummary, HeaderParameters, InvoiceId, InvoiceRecord,
    RawInvoiceEntry, RecomputeOwed, TripTotals,
};
use crate::service::allocation;
use indexmap::IndexMap;
use serde::Serialize;

/// Why a recompute ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecalcReason {
    HeaderChanged,
    InvoiceAdded { id: InvoiceId },
    InvoiceRemoved { id: InvoiceId },
    BatchImported { count: usize },
    ManualReapply,
}

/// Result of a recompute, handed back to the caller to notify or persist.
#[derive(Debug, Clone, Serialize)]
pub struct Recalculation {
    pub reason: RecalcReason,
    pub snapshot: AllocationSnapshot,
}

/// Owns one trip's header and invoice set and keeps their allocation current.
///
/// Every change runs a full recompute; there is no incremental path. The
/// totals and every invoice's computed fields are swapped in together from a
/// single engine pass.
#[derive(Debug)]
pub struct TripSession {
    trip_id: String,
    header: HeaderParameters,
    invoices: IndexMap<InvoiceId, InvoiceRecord>,
    totals: TripTotals,
    next_id: u64,
}

impl TripSession {
    pub fn new(trip_id: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            header: HeaderParameters::default(),
            invoices: IndexMap::new(),
            totals: TripTotals::default(),
            next_id: 1,
        }
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn header(&self) -> &HeaderParameters {
        &self.header
    }

    pub fn totals(&self) -> &TripTotals {
        &self.totals
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<&InvoiceRecord> {
        self.invoices.get(&id)
    }

    pub fn invoice_count(&self) -> usize {
        self.invoices.len()
    }

    /// Current output, as of the last recompute.
    pub fn snapshot(&self) -> AllocationSnapshot {
        let invoices: Vec<InvoiceRecord> = self.invoices.values().cloned().collect();
        AllocationSnapshot {
            header: self.header,
            totals: self.totals,
            summary: AllocationSummary::from_invoices(&invoices),
            invoices,
        }
    }

    /// Replaces the header wholesale and recomputes. A rejected header, or
    /// one the engine cannot allocate, leaves the previous header and
    /// allocation in place.
    pub fn update_header(&mut self, next: HeaderParameters) -> Result<Recalculation, TripError> {
        let previous = self.header;
        let result = match self.header.replace(next) {
            Ok(owed) => self.settle(owed, RecalcReason::HeaderChanged),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &result {
            tracing::warn!("Trip {}: header rejected: {}", self.trip_id, e);
            self.header = previous;
        }
        result
    }

    /// Adds one invoice. If the engine rejects the new set, the invoice is
    /// dropped again (its id stays spent).
    pub fn add_invoice(&mut self, entry: RawInvoiceEntry) -> Result<Recalculation, TripError> {
        let id = self.admit(entry);
        let result = self.recalculate(RecalcReason::InvoiceAdded { id });
        if result.is_err() {
            self.discard(&[id]);
        }
        result
    }

    pub fn remove_invoice(&mut self, id: InvoiceId) -> Result<Recalculation, TripError> {
        if self.invoices.shift_remove(&id).is_none() {
            return Err(TripError::UnknownInvoice(id));
        }
        self.recalculate(RecalcReason::InvoiceRemoved { id })
    }

    /// Manual re-apply ("ratear"): recompute from unchanged inputs.
    pub fn reapply(&mut self) -> Result<Recalculation, TripError> {
        self.recalculate(RecalcReason::ManualReapply)
    }

    /// Assigns the next id and adds the entry without recomputing. Callers
    /// must follow up with [`TripSession::recalculate`].
    pub(crate) fn admit(&mut self, entry: RawInvoiceEntry) -> InvoiceId {
        let id = InvoiceId(self.next_id);
        self.next_id += 1;
        self.invoices.insert(id, InvoiceRecord::from_entry(id, entry));
        id
    }

    /// Takes back admitted invoices whose recompute failed.
    pub(crate) fn discard(&mut self, ids: &[InvoiceId]) {
        for id in ids {
            self.invoices.shift_remove(id);
        }
    }

    fn settle(&mut self, _owed: RecomputeOwed, reason: RecalcReason) -> Result<Recalculation, TripError> {
        self.recalculate(reason)
    }

    pub(crate) fn recalculate(&mut self, reason: RecalcReason) -> Result<Recalculation, TripError> {
        let snapshot = allocation::allocate(&self.header, self.invoices.values())?;

        self.totals = snapshot.totals;
        self.invoices = snapshot
            .invoices
            .iter()
            .map(|invoice| (invoice.id, invoice.clone()))
            .collect();

        tracing::info!(
            "Trip {}: recomputed ({:?}), {} invoices, {:.2} kg real / {:.2} kg considered, grand total {:.2}",
            self.trip_id,
            reason,
            snapshot.invoices.len(),
            snapshot.totals.total_real_weight_kg,
            snapshot.totals.considered_weight_kg,
            snapshot.totals.grand_total
        );

        let drift = snapshot.conservation_gaps().max_abs();
        if snapshot.totals.total_real_weight_kg > 0.0 && drift > 1e-6 * snapshot.totals.grand_total.max(1.0) {
            tracing::warn!("Trip {}: apportioned sums drift {} from trip totals", self.trip_id, drift);
        }

        Ok(Recalculation { reason, snapshot })
    }
}
