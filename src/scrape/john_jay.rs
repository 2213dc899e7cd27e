use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::menu::{HallMenu, MealSlot};

use super::browser::Browser;
use super::tabbed::{self, FallbackRule, TabSpec, TabbedScrape};
use super::{ScrapeError, SupplementalSource, POST_LOAD_SETTLE, TAB_SETTLE};

pub const JOHN_JAY_URL: &str = "https://dining.columbia.edu/content/john-jay-dining-hall";

static TABS: &[TabSpec] = &[
    TabSpec { label: "Brunch", meals: &[MealSlot::Breakfast] },
    TabSpec { label: "Breakfast", meals: &[MealSlot::Breakfast] },
    TabSpec { label: "Lunch", meals: &[MealSlot::Lunch] },
    TabSpec { label: "Lunch & Dinner", meals: &[MealSlot::Lunch, MealSlot::Dinner] },
    TabSpec { label: "Dinner", meals: &[MealSlot::Dinner] },
];

/// Tabbed John Jay page; reports crowdedness.
pub struct JohnJaySource {
    browser: Arc<dyn Browser>,
    post_load: Duration,
    settle: Duration,
}

impl JohnJaySource {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            browser,
            post_load: POST_LOAD_SETTLE,
            settle: TAB_SETTLE,
        }
    }

    #[cfg(test)]
    fn with_delays(browser: Arc<dyn Browser>, post_load: Duration, settle: Duration) -> Self {
        Self { browser, post_load, settle }
    }
}

#[async_trait]
impl SupplementalSource for JohnJaySource {
    fn canonical_name(&self) -> &'static str {
        "John Jay"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["John Jay", "John Jay Dining Hall"]
    }

    async fn fetch(&self) -> Result<BTreeMap<MealSlot, HallMenu>, ScrapeError> {
        let cfg = TabbedScrape {
            url: JOHN_JAY_URL,
            tabs: TABS,
            fallback: FallbackRule::BreakfastFromActiveTab,
            post_load: self.post_load,
            settle: self.settle,
        };
        let mut page = self.browser.open().await?;
        let result = tabbed::run(&cfg, page.as_mut()).await;
        let _ = page.close().await;
        let outcome = result?;

        Ok(outcome
            .by_meal
            .into_iter()
            .map(|(slot, stations)| {
                (
                    slot,
                    HallMenu {
                        name: self.canonical_name().into(),
                        hours: "Hours vary".into(),
                        stations,
                        capacity_percent: outcome.capacity,
                    },
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::browser::MenuPage;
    use crate::scrape::tabbed::tests::{ScriptedPage, BAKERY_HTML, GRILL_HTML};

    struct TabbedBrowser;

    #[async_trait]
    impl Browser for TabbedBrowser {
        async fn open(&self) -> Result<Box<dyn MenuPage>, ScrapeError> {
            Ok(Box::new(ScriptedPage::new(
                vec![("Brunch", BAKERY_HTML), ("Lunch & Dinner", GRILL_HTML)],
                "<div></div>",
            )))
        }
    }

    #[tokio::test]
    async fn tabs_map_to_slots_under_the_canonical_name() {
        let source = JohnJaySource::with_delays(
            Arc::new(TabbedBrowser),
            Duration::ZERO,
            Duration::ZERO,
        );
        let by_meal = source.fetch().await.unwrap();

        assert_eq!(by_meal[&MealSlot::Breakfast].stations[0].name, "Bakery");
        assert_eq!(by_meal[&MealSlot::Lunch].stations[0].name, "Grill");
        assert_eq!(by_meal[&MealSlot::Dinner].stations[0].name, "Grill");
        for hall in by_meal.values() {
            assert_eq!(hall.name, "John Jay");
            assert_eq!(hall.hours, "Hours vary");
        }
        assert!(!by_meal.contains_key(&MealSlot::Latenight));
    }
}
