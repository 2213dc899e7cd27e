use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::menu::{CanonicalSnapshot, MealSlot};
use crate::scrape::{PrimarySource, ScrapeError, SupplementalSource, SOURCE_BUDGET};
use crate::services::{merge, normalize, order};
use crate::store::{SnapshotStore, SNAPSHOT_KEY};

/// Drives fetch -> normalize -> merge -> order and owns the snapshot.
///
/// Refreshes are serialized behind an async mutex; reads never touch the
/// fetchers and always serve the last persisted snapshot.
pub struct MenuService {
    snapshots: Arc<dyn SnapshotStore>,
    primary: Arc<dyn PrimarySource>,
    supplementals: Vec<Arc<dyn SupplementalSource>>,
    refresh_gate: AsyncMutex<()>,
    source_budget: Duration,
}

impl MenuService {
    pub fn new(
        snapshots: Arc<dyn SnapshotStore>,
        primary: Arc<dyn PrimarySource>,
        supplementals: Vec<Arc<dyn SupplementalSource>>,
    ) -> Self {
        Self {
            snapshots,
            primary,
            supplementals,
            refresh_gate: AsyncMutex::new(()),
            source_budget: SOURCE_BUDGET,
        }
    }

    /// Run one refresh cycle and persist the result.
    ///
    /// Primary-source failure aborts the cycle and propagates; the prior
    /// snapshot stays in place. Supplemental failures (including budget
    /// overruns) are logged and treated as absent data.
    pub async fn refresh(&self) -> Result<CanonicalSnapshot, AppError> {
        let _gate = self.refresh_gate.lock().await;

        let primary_raw = timeout(self.source_budget, self.primary.fetch())
            .await
            .map_err(|_| ScrapeError::Timeout("primary source budget exceeded".into()))??;
        let mut by_meal = normalize::normalize_menu(primary_raw);
        for slot in MealSlot::ALL {
            by_meal.entry(slot).or_default();
        }

        for source in &self.supplementals {
            match timeout(self.source_budget, source.fetch()).await {
                Ok(Ok(raw)) => {
                    let supplemental: BTreeMap<_, _> = raw
                        .into_iter()
                        .filter_map(|(slot, hall)| {
                            normalize::normalize_hall(hall).map(|h| (slot, h))
                        })
                        .collect();
                    merge::fold_supplemental(
                        &mut by_meal,
                        &supplemental,
                        source.aliases(),
                        source.canonical_name(),
                        |slot| source.hours_fallback(slot),
                    );
                }
                Ok(Err(e)) => {
                    warn!(source = source.canonical_name(), "supplemental fetch failed: {e}");
                }
                Err(_) => {
                    warn!(
                        source = source.canonical_name(),
                        "supplemental fetch exceeded its {}s budget",
                        self.source_budget.as_secs()
                    );
                }
            }
        }

        for halls in by_meal.values_mut() {
            order::sort_halls(halls);
        }

        let snapshot = CanonicalSnapshot {
            by_meal,
            updated_at: Utc::now(),
        };
        self.snapshots.upsert_by_key(SNAPSHOT_KEY, &snapshot).await?;
        info!("menu snapshot refreshed");
        Ok(snapshot)
    }

    /// Last persisted snapshot, with the display order re-applied so
    /// snapshots written before an ordering change still read correctly.
    pub async fn snapshot(&self) -> Result<Option<CanonicalSnapshot>, AppError> {
        let mut snapshot = self.snapshots.find_by_key(SNAPSHOT_KEY).await?;
        if let Some(snapshot) = &mut snapshot {
            for halls in snapshot.by_meal.values_mut() {
                order::sort_halls(halls);
            }
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::models::menu::{HallMenu, MenuByMeal, Station};
    use crate::store::memory::MemoryStore;

    fn station(name: &str, items: &[&str]) -> Station {
        Station {
            name: name.into(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn hall(name: &str, hours: &str, stations: Vec<Station>) -> HallMenu {
        HallMenu {
            name: name.into(),
            hours: hours.into(),
            stations,
            capacity_percent: None,
        }
    }

    struct FixedPrimary(MenuByMeal);

    #[async_trait]
    impl PrimarySource for FixedPrimary {
        async fn fetch(&self) -> Result<MenuByMeal, ScrapeError> {
            Ok(self.0.clone())
        }
    }

    struct FailingPrimary;

    #[async_trait]
    impl PrimarySource for FailingPrimary {
        async fn fetch(&self) -> Result<MenuByMeal, ScrapeError> {
            Err(ScrapeError::Navigation("unreachable".into()))
        }
    }

    struct FailingSupplemental(&'static str);

    #[async_trait]
    impl SupplementalSource for FailingSupplemental {
        fn canonical_name(&self) -> &'static str {
            self.0
        }
        fn aliases(&self) -> &'static [&'static str] {
            &[]
        }
        async fn fetch(&self) -> Result<BTreeMap<MealSlot, HallMenu>, ScrapeError> {
            Err(ScrapeError::Timeout("tab never settled".into()))
        }
    }

    struct FixedSupplemental {
        by_meal: BTreeMap<MealSlot, HallMenu>,
    }

    #[async_trait]
    impl SupplementalSource for FixedSupplemental {
        fn canonical_name(&self) -> &'static str {
            "John Jay"
        }
        fn aliases(&self) -> &'static [&'static str] {
            &["John Jay", "John Jay Dining Hall"]
        }
        async fn fetch(&self) -> Result<BTreeMap<MealSlot, HallMenu>, ScrapeError> {
            Ok(self.by_meal.clone())
        }
    }

    fn primary_data() -> MenuByMeal {
        let mut by_meal = MenuByMeal::new();
        by_meal.insert(
            MealSlot::Lunch,
            vec![
                hall("Hewitt", "11-2", vec![station("Grill", &["Burgers", "Burgers", " "])]),
                hall("John Jay", "9:30-8", vec![station("Main", &["Pasta"])]),
                hall("Empty Hall", "", vec![station("Ghost", &[" "])]),
            ],
        );
        by_meal
    }

    #[tokio::test]
    async fn supplemental_failures_never_abort_the_cycle() {
        let store = Arc::new(MemoryStore::new());
        let svc = MenuService::new(
            store.clone(),
            Arc::new(FixedPrimary(primary_data())),
            vec![
                Arc::new(FailingSupplemental("Ferris Booth Commons")),
                Arc::new(FailingSupplemental("John Jay")),
                Arc::new(FailingSupplemental("Johnny's")),
            ],
        );

        let snapshot = svc.refresh().await.unwrap();

        // normalized + ordered primary-only data
        let lunch = &snapshot.by_meal[&MealSlot::Lunch];
        let names: Vec<_> = lunch.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["John Jay", "Hewitt"]);
        assert_eq!(lunch[1].stations[0].items, vec!["Burgers"]);
        // every slot is present, even when the source had nothing for it
        assert!(snapshot.by_meal[&MealSlot::Latenight].is_empty());

        let stored = store.find_by_key(SNAPSHOT_KEY).await.unwrap().unwrap();
        assert_eq!(stored, snapshot);
    }

    #[tokio::test]
    async fn primary_failure_aborts_and_keeps_the_prior_snapshot() {
        let store = Arc::new(MemoryStore::new());

        let seed = MenuService::new(
            store.clone(),
            Arc::new(FixedPrimary(primary_data())),
            vec![],
        );
        let prior = seed.refresh().await.unwrap();

        let broken = MenuService::new(store.clone(), Arc::new(FailingPrimary), vec![]);
        let err = broken.refresh().await.unwrap_err();
        assert!(matches!(err, AppError::Source(_)));

        let kept = broken.snapshot().await.unwrap().unwrap();
        assert_eq!(kept, prior);
    }

    #[tokio::test]
    async fn supplemental_data_is_merged_into_the_snapshot() {
        let store = Arc::new(MemoryStore::new());
        let mut sup = BTreeMap::new();
        sup.insert(
            MealSlot::Lunch,
            HallMenu {
                capacity_percent: Some(70),
                ..hall("John Jay", "", vec![station("Rendered", &["Stir Fry"])])
            },
        );
        let svc = MenuService::new(
            store,
            Arc::new(FixedPrimary(primary_data())),
            vec![Arc::new(FixedSupplemental { by_meal: sup })],
        );

        let snapshot = svc.refresh().await.unwrap();
        let lunch = &snapshot.by_meal[&MealSlot::Lunch];
        let jj = lunch.iter().find(|h| h.name == "John Jay").unwrap();
        assert_eq!(jj.stations[0].name, "Rendered");
        assert_eq!(jj.hours, "9:30-8");
        assert_eq!(jj.capacity_percent, Some(70));
    }

    #[tokio::test]
    async fn snapshot_read_reapplies_the_display_order() {
        let store = Arc::new(MemoryStore::new());
        let mut by_meal = MenuByMeal::new();
        by_meal.insert(
            MealSlot::Dinner,
            vec![
                hall("Hewitt", "h", vec![station("A", &["x"])]),
                hall("John Jay", "h", vec![station("B", &["y"])]),
            ],
        );
        store
            .upsert_by_key(
                SNAPSHOT_KEY,
                &CanonicalSnapshot {
                    by_meal,
                    updated_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let svc = MenuService::new(store, Arc::new(FailingPrimary), vec![]);
        let snapshot = svc.snapshot().await.unwrap().unwrap();
        let names: Vec<_> = snapshot.by_meal[&MealSlot::Dinner]
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["John Jay", "Hewitt"]);
    }
}
