pub mod allocation;
pub mod import;
pub mod registry;
pub mod session;

pub use allocation::{allocate, compute_trip_totals};
pub use import::{BatchImportAdapter, ImportOutcome, ImportReport};
pub use registry::{SharedSession, TripRegistry};
pub use session::{RecalcReason, Recalculation, TripSession};
