use crate::models::InvoiceId;
use thiserror::Error;

/// Failures of the allocation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    /// At 100% the gross-up divides by zero: there is no tax-exclusive
    /// remainder for the base to occupy.
    #[error("ICMS rate of {icms_rate_percent}% leaves the gross-up undefined; use a rate below 100%")]
    UndefinedGrossUp { icms_rate_percent: f64 },

    /// Finite inputs whose product or sum leaves the `f64` range.
    #[error("{quantity} overflows; inputs are too large to allocate")]
    Overflow { quantity: &'static str },
}

/// Failures of the trip session and batch import around the engine.
#[derive(Debug, Error)]
pub enum TripError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("invoice {0} is not part of this trip")]
    UnknownInvoice(InvoiceId),

    #[error("batch of {received} invoices exceeds the import limit of {limit}")]
    BatchTooLarge { received: usize, limit: usize },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}
