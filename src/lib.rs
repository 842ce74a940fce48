pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod spreadsheet;

pub use crate::config::AppConfig;
pub use error::{AllocationError, TripError};
pub use service::{allocate, compute_trip_totals, BatchImportAdapter, TripRegistry, TripSession};
