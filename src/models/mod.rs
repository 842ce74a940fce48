pub mod header;
pub mod invoice;
pub mod sanitize;
pub mod totals;

pub use header::{HeaderParameters, RecomputeOwed};
pub use invoice::{InvoiceCharges, InvoiceId, InvoiceRecord, RawInvoiceEntry};
pub use totals::{AllocationSnapshot, AllocationSummary, ConservationGaps, TripTotals};
