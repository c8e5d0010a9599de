//! In-memory backend for tests and throwaway runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LatestAvailabilityStore, StorageResult, TourRepository};
use crate::models::{StoredAvailability, Tour};

/// Map-backed implementation of both storage traits
#[derive(Default)]
pub struct MemoryStore {
    tours: RwLock<HashMap<Uuid, Tour>>,
    latest: RwLock<HashMap<Uuid, StoredAvailability>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put_latest` calls that changed the stored record
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LatestAvailabilityStore for MemoryStore {
    async fn get_latest(&self, tour_id: Uuid) -> StorageResult<Option<StoredAvailability>> {
        Ok(self.latest.read().await.get(&tour_id).cloned())
    }

    async fn put_latest(&self, record: &StoredAvailability) -> StorageResult<bool> {
        let mut latest = self.latest.write().await;
        if let Some(stored) = latest.get(&record.tour_id) {
            if stored.availability_date >= record.availability_date {
                return Ok(false);
            }
        }

        latest.insert(record.tour_id, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[async_trait]
impl TourRepository for MemoryStore {
    async fn list_tours(&self) -> StorageResult<Vec<Tour>> {
        let mut tours: Vec<Tour> = self.tours.read().await.values().cloned().collect();
        tours.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tours)
    }

    async fn get_tour(&self, id: Uuid) -> StorageResult<Option<Tour>> {
        Ok(self.tours.read().await.get(&id).cloned())
    }

    async fn upsert_tour(&self, tour: &Tour) -> StorageResult<()> {
        self.tours.write().await.insert(tour.id, tour.clone());
        Ok(())
    }

    async fn delete_tour(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.tours.write().await.remove(&id).is_some())
    }
}
