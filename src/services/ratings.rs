use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::sync::Mutex as AsyncMutex;

use crate::error::AppError;
use crate::models::rating::{NewRating, RatingEntry, RatingSummary};
use crate::store::{RatingFilter, RatingStore};

/// All date keys are derived in this timezone, wherever the server runs.
pub const REFERENCE_TZ: Tz = chrono_tz::America::New_York;

/// The crowd-rating ledger.
///
/// A visitor holds at most one active rating per hall across all days;
/// a re-submit replaces the old entry. The delete-then-insert pair runs
/// under a per-(visitor, hall) lock so near-simultaneous submissions
/// cannot leave duplicates.
pub struct RatingsService {
    store: Arc<dyn RatingStore>,
    locks: std::sync::Mutex<HashMap<(String, String), Arc<AsyncMutex<()>>>>,
}

impl RatingsService {
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self {
            store,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Today's calendar-day key in the reference timezone.
    pub fn today_key() -> String {
        Utc::now()
            .with_timezone(&REFERENCE_TZ)
            .format("%Y-%m-%d")
            .to_string()
    }

    pub async fn add_rating(
        &self,
        date_key: &str,
        hall_name: &str,
        rating: i64,
        visitor_id: Option<&str>,
    ) -> Result<RatingSummary, AppError> {
        let hall_name = hall_name.trim();
        if hall_name.is_empty() {
            return Err(AppError::Validation("hallName is required".into()));
        }
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "rating must be an integer from 1 to 5".into(),
            ));
        }
        let rating = rating as i32;

        let new = NewRating {
            date_key: date_key.to_string(),
            hall_name: hall_name.to_string(),
            rating,
            visitor_id: visitor_id.map(str::to_string),
            at: Utc::now(),
        };

        match visitor_id {
            Some(visitor) => {
                let lock = self.pair_lock(visitor, hall_name);
                let outcome = {
                    let _guard = lock.lock().await;
                    self.replace_rating(new).await
                };
                drop(lock);
                self.prune_pair_lock(visitor, hall_name);
                outcome?;
            }
            None => {
                self.store.insert(new).await?;
            }
        }

        let entries = self
            .store
            .find_many(RatingFilter {
                date_key: Some(date_key.to_string()),
                hall_name: Some(hall_name.to_string()),
                ..Default::default()
            })
            .await?;
        Ok(summarize(&entries, visitor_id))
    }

    /// Per-hall aggregates for today. Halls without entries are omitted.
    pub async fn today_averages(
        &self,
        visitor_id: Option<&str>,
    ) -> Result<BTreeMap<String, RatingSummary>, AppError> {
        let date_key = Self::today_key();
        let entries = self
            .store
            .find_many(RatingFilter {
                date_key: Some(date_key),
                ..Default::default()
            })
            .await?;

        let mut by_hall: BTreeMap<String, Vec<RatingEntry>> = BTreeMap::new();
        for entry in entries {
            by_hall.entry(entry.hall_name.clone()).or_default().push(entry);
        }
        Ok(by_hall
            .into_iter()
            .map(|(hall, entries)| (hall, summarize(&entries, visitor_id)))
            .collect())
    }

    /// Delete any prior entry for the (visitor, hall) pair, whatever its
    /// day, then insert the new one. Callers hold the pair lock.
    async fn replace_rating(&self, new: NewRating) -> Result<(), AppError> {
        let existing = self
            .store
            .find_many(RatingFilter {
                visitor_id: new.visitor_id.clone(),
                hall_name: Some(new.hall_name.clone()),
                ..Default::default()
            })
            .await?;
        for entry in existing {
            self.store.delete_by_id(entry.id).await?;
        }
        self.store.insert(new).await?;
        Ok(())
    }

    fn pair_lock(&self, visitor: &str, hall: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry((visitor.to_string(), hall.to_string()))
            .or_default()
            .clone()
    }

    /// Remove a pair's lock entry once no submission holds it. Both key
    /// halves are caller-supplied strings, so the map must not grow
    /// without bound.
    fn prune_pair_lock(&self, visitor: &str, hall: &str) {
        let mut locks = self.locks.lock().unwrap();
        let key = (visitor.to_string(), hall.to_string());
        if locks.get(&key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&key);
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

/// Mean rounded half-up to one decimal, plus the requester's own rating.
fn summarize(entries: &[RatingEntry], visitor_id: Option<&str>) -> RatingSummary {
    let sum: i64 = entries.iter().map(|e| e.rating as i64).sum();
    let average = ((sum as f64 / entries.len() as f64) * 10.0).round() / 10.0;
    let user_rating = visitor_id.and_then(|v| {
        entries
            .iter()
            .find(|e| e.visitor_id.as_deref() == Some(v))
            .map(|e| e.rating)
    });
    RatingSummary {
        average,
        count: entries.len(),
        user_rating,
    }
}
