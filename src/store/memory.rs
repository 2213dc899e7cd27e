use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    menu::CanonicalSnapshot,
    rating::{NewRating, RatingEntry},
};

use super::{RatingFilter, RatingStore, SnapshotStore, StoreError};

/// In-process store backing tests and storage-free local runs.
/// Mirrors the two collections of the persistent schema.
#[derive(Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<String, CanonicalSnapshot>>,
    ratings: RwLock<Vec<RatingEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rating entries, regardless of date or hall.
    pub async fn rating_count(&self) -> usize {
        self.ratings.read().await.len()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn upsert_by_key(
        &self,
        key: &str,
        snapshot: &CanonicalSnapshot,
    ) -> Result<(), StoreError> {
        self.snapshots
            .write()
            .await
            .insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<CanonicalSnapshot>, StoreError> {
        Ok(self.snapshots.read().await.get(key).cloned())
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn insert(&self, rating: NewRating) -> Result<RatingEntry, StoreError> {
        let entry = RatingEntry {
            id: Uuid::new_v4(),
            date_key: rating.date_key,
            hall_name: rating.hall_name,
            rating: rating.rating,
            visitor_id: rating.visitor_id,
            at: rating.at,
        };
        self.ratings.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        self.ratings.write().await.retain(|e| e.id != id);
        Ok(())
    }

    async fn find_many(&self, filter: RatingFilter) -> Result<Vec<RatingEntry>, StoreError> {
        Ok(self
            .ratings
            .read()
            .await
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}
