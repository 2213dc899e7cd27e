pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    menu::CanonicalSnapshot,
    rating::{NewRating, RatingEntry},
};

/// Fixed key the one-and-only snapshot document lives under.
pub const SNAPSHOT_KEY: &str = "latest";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keyed-document side of the persistence port. The snapshot is
/// replace-only: `upsert_by_key` overwrites the whole value.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn upsert_by_key(&self, key: &str, snapshot: &CanonicalSnapshot)
        -> Result<(), StoreError>;
    async fn find_by_key(&self, key: &str) -> Result<Option<CanonicalSnapshot>, StoreError>;
}

/// Filter for [`RatingStore::find_many`]; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct RatingFilter {
    pub date_key: Option<String>,
    pub hall_name: Option<String>,
    pub visitor_id: Option<String>,
}

impl RatingFilter {
    pub fn matches(&self, entry: &RatingEntry) -> bool {
        self.date_key.as_ref().is_none_or(|d| *d == entry.date_key)
            && self.hall_name.as_ref().is_none_or(|h| *h == entry.hall_name)
            && self
                .visitor_id
                .as_ref()
                .is_none_or(|v| entry.visitor_id.as_deref() == Some(v.as_str()))
    }
}

/// Entry side of the persistence port.
#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn insert(&self, rating: NewRating) -> Result<RatingEntry, StoreError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError>;
    async fn find_many(&self, filter: RatingFilter) -> Result<Vec<RatingEntry>, StoreError>;
}
