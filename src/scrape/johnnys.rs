use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::menu::{HallMenu, MealSlot};

use super::browser::Browser;
use super::tabbed::{self, FallbackRule, TabSpec, TabbedScrape};
use super::{ScrapeError, SupplementalSource, POST_LOAD_SETTLE, TAB_SETTLE};

pub const JOHNNYS_URL: &str = "https://dining.columbia.edu/johnnys";

static TABS: &[TabSpec] = &[
    TabSpec { label: "Lunch", meals: &[MealSlot::Lunch] },
    TabSpec { label: "Dinner", meals: &[MealSlot::Dinner] },
];

/// Johnny's only serves lunch and dinner and has no crowdedness widget.
pub struct JohnnysSource {
    browser: Arc<dyn Browser>,
    post_load: Duration,
    settle: Duration,
}

impl JohnnysSource {
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
impl SupplementalSource for JohnnysSource {
    fn canonical_name(&self) -> &'static str {
        "Johnny's"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["Johnny's", "Johnnys"]
    }

    async fn fetch(&self) -> Result<BTreeMap<MealSlot, HallMenu>, ScrapeError> {
        let cfg = TabbedScrape {
            url: JOHNNYS_URL,
            tabs: TABS,
            fallback: FallbackRule::LunchDinnerFromActiveTab,
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
                        capacity_percent: None,
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
    use crate::scrape::tabbed::tests::{ScriptedPage, GRILL_HTML};

    struct NoTabBrowser;

    #[async_trait]
    impl Browser for NoTabBrowser {
        async fn open(&self) -> Result<Box<dyn MenuPage>, ScrapeError> {
            // page renders content but the tab bar never appears
            Ok(Box::new(ScriptedPage::new(vec![], GRILL_HTML)))
        }
    }

    #[tokio::test]
    async fn untabbed_render_fills_both_midday_slots() {
        let source = JohnnysSource::with_delays(
            Arc::new(NoTabBrowser),
            Duration::ZERO,
            Duration::ZERO,
        );
        let by_meal = source.fetch().await.unwrap();
        assert!(by_meal.contains_key(&MealSlot::Lunch));
        assert!(by_meal.contains_key(&MealSlot::Dinner));
        assert_eq!(by_meal[&MealSlot::Lunch].name, "Johnny's");
        assert_eq!(by_meal[&MealSlot::Lunch].capacity_percent, None);
    }
}
