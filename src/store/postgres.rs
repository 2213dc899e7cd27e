use async_trait::async_trait;
use sqlx::{types::Json, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    menu::CanonicalSnapshot,
    rating::{NewRating, RatingEntry},
};

use super::{RatingFilter, RatingStore, SnapshotStore, StoreError};

/// Postgres-backed store. Schema lives in `migrations/`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SnapshotStore for PgStore {
    async fn upsert_by_key(
        &self,
        key: &str,
        snapshot: &CanonicalSnapshot,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO menu_snapshots (key, data, updated_at)
               VALUES ($1, $2, $3)
               ON CONFLICT (key) DO UPDATE SET
                   data = EXCLUDED.data,
                   updated_at = EXCLUDED.updated_at"#,
        )
        .bind(key)
        .bind(Json(snapshot))
        .bind(snapshot.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<CanonicalSnapshot>, StoreError> {
        let data: Option<Json<CanonicalSnapshot>> =
            sqlx::query_scalar("SELECT data FROM menu_snapshots WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(data.map(|j| j.0))
    }
}

#[async_trait]
impl RatingStore for PgStore {
    async fn insert(&self, rating: NewRating) -> Result<RatingEntry, StoreError> {
        let entry = sqlx::query_as::<_, RatingEntry>(
            r#"INSERT INTO ratings (id, date_key, hall_name, rating, visitor_id, "at")
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id, date_key, hall_name, rating, visitor_id, "at""#,
        )
        .bind(Uuid::new_v4())
        .bind(&rating.date_key)
        .bind(&rating.hall_name)
        .bind(rating.rating)
        .bind(&rating.visitor_id)
        .bind(rating.at)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_many(&self, filter: RatingFilter) -> Result<Vec<RatingEntry>, StoreError> {
        let mut qb = QueryBuilder::new(
            r#"SELECT id, date_key, hall_name, rating, visitor_id, "at" FROM ratings"#,
        );
        let mut sep = " WHERE ";
        if let Some(date_key) = &filter.date_key {
            qb.push(sep).push("date_key = ").push_bind(date_key);
            sep = " AND ";
        }
        if let Some(hall_name) = &filter.hall_name {
            qb.push(sep).push("hall_name = ").push_bind(hall_name);
            sep = " AND ";
        }
        if let Some(visitor_id) = &filter.visitor_id {
            qb.push(sep).push("visitor_id = ").push_bind(visitor_id);
        }
        let entries = qb
            .build_query_as::<RatingEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }
}
