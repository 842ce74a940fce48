//! CSV exchange with spreadsheets: invoice batches in, allocations out.

pub mod reader;
pub mod writer;

pub use reader::read_entries;
pub use writer::{snapshot_to_csv, write_snapshot};
