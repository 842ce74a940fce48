use crate::service::session::TripSession;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A trip's session. Writers hold the lock for a whole recompute cycle.
pub type SharedSession = Arc<Mutex<TripSession>>;

/// Trip sessions keyed by trip (loading order) id.
#[derive(Debug, Default)]
pub struct TripRegistry {
    trips: DashMap<String, SharedSession>,
}

impl TripRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `trip_id`, opened empty on first use.
    pub fn session(&self, trip_id: &str) -> SharedSession {
        self.trips
            .entry(trip_id.to_string())
            .or_insert_with(|| {
                tracing::info!("Opening trip {}", trip_id);
                Arc::new(Mutex::new(TripSession::new(trip_id)))
            })
            .clone()
    }

    pub fn get(&self, trip_id: &str) -> Option<SharedSession> {
        self.trips.get(trip_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
