use std::collections::BTreeMap;
use std::time::Duration;

use tracing::warn;

use crate::models::menu::{MealSlot, Station};
use crate::services::classify;

use super::browser::MenuPage;
use super::extract::{capacity_from, stations_from};
use super::ScrapeError;

/// One entry of a page's fixed tab list and the slot(s) it fills.
pub struct TabSpec {
    pub label: &'static str,
    pub meals: &'static [MealSlot],
}

/// What to do when the explicit tab pass left gaps.
pub enum FallbackRule {
    None,
    /// Breakfast empty but lunch/dinner filled: re-extract the active
    /// tab and classify its label.
    BreakfastFromActiveTab,
    /// Lunch and dinner both empty: assign the current extraction by
    /// active-tab label, or to both when the label says neither.
    LunchDinnerFromActiveTab,
}

pub struct TabbedScrape {
    pub url: &'static str,
    pub tabs: &'static [TabSpec],
    pub fallback: FallbackRule,
    pub post_load: Duration,
    pub settle: Duration,
}

#[derive(Debug, Default)]
pub struct TabbedOutcome {
    pub by_meal: BTreeMap<MealSlot, Vec<Station>>,
    pub capacity: Option<u8>,
}

/// Drive one rendered page through its tabs. A meal slot is filled by
/// the FIRST tab whose extraction succeeds for it; later tabs never
/// overwrite. Per-tab failures are logged and skipped, matching the
/// one-bad-tab-shouldn't-kill-the-hall behavior of the sources.
pub async fn run(cfg: &TabbedScrape, page: &mut dyn MenuPage) -> Result<TabbedOutcome, ScrapeError> {
    page.navigate(cfg.url).await?;
    tokio::time::sleep(cfg.post_load).await;

    let mut outcome = TabbedOutcome::default();

    for tab in cfg.tabs {
        let clicked = match page.click_tab(tab.label).await {
            Ok(clicked) => clicked,
            Err(e) => {
                warn!(url = cfg.url, tab = tab.label, "tab click failed: {e}");
                continue;
            }
        };
        if !clicked {
            continue;
        }
        tokio::time::sleep(cfg.settle).await;

        let html = match page.html().await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = cfg.url, tab = tab.label, "extraction failed: {e}");
                continue;
            }
        };
        if outcome.capacity.is_none() {
            outcome.capacity = capacity_from(&html);
        }
        let stations = stations_from(&html);
        if !stations.is_empty() {
            for meal in tab.meals {
                outcome
                    .by_meal
                    .entry(*meal)
                    .or_insert_with(|| stations.clone());
            }
        }
    }

    match cfg.fallback {
        FallbackRule::None => {}
        FallbackRule::BreakfastFromActiveTab => {
            let lunch_or_dinner = outcome.by_meal.contains_key(&MealSlot::Lunch)
                || outcome.by_meal.contains_key(&MealSlot::Dinner);
            if !outcome.by_meal.contains_key(&MealSlot::Breakfast) && lunch_or_dinner {
                apply_active_tab(page, &mut outcome, |label| classify::classify(label)).await;
            }
        }
        FallbackRule::LunchDinnerFromActiveTab => {
            if !outcome.by_meal.contains_key(&MealSlot::Lunch)
                && !outcome.by_meal.contains_key(&MealSlot::Dinner)
            {
                apply_active_tab(page, &mut outcome, |label| {
                    let t = label.to_lowercase();
                    if t.contains("lunch") {
                        vec![MealSlot::Lunch]
                    } else if t.contains("dinner") {
                        vec![MealSlot::Dinner]
                    } else {
                        vec![MealSlot::Lunch, MealSlot::Dinner]
                    }
                })
                .await;
            }
        }
    }

    Ok(outcome)
}

async fn apply_active_tab<F>(page: &mut dyn MenuPage, outcome: &mut TabbedOutcome, to_meals: F)
where
    F: Fn(&str) -> Vec<MealSlot>,
{
    let html = match page.html().await {
        Ok(html) => html,
        Err(e) => {
            warn!("active-tab fallback extraction failed: {e}");
            return;
        }
    };
    if outcome.capacity.is_none() {
        outcome.capacity = capacity_from(&html);
    }
    let stations = stations_from(&html);
    if stations.is_empty() {
        return;
    }
    let label = match page.active_tab().await {
        Ok(label) => label,
        Err(e) => {
            warn!("active-tab lookup failed: {e}");
            return;
        }
    };
    for meal in to_meals(&label) {
        outcome.by_meal.entry(meal).or_insert_with(|| stations.clone());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Scripted page: tab label -> page HTML; unknown labels don't click.
    /// `active_label` is fixed by the test, independent of clicks.
    pub struct ScriptedPage {
        pub tabs: Vec<(&'static str, &'static str)>,
        pub current: &'static str,
        pub active_label: &'static str,
        pub navigations: usize,
    }

    impl ScriptedPage {
        pub fn new(tabs: Vec<(&'static str, &'static str)>, initial: &'static str) -> Self {
            Self {
                tabs,
                current: initial,
                active_label: "",
                navigations: 0,
            }
        }
    }

    #[async_trait]
    impl MenuPage for ScriptedPage {
        async fn navigate(&mut self, _url: &str) -> Result<(), ScrapeError> {
            self.navigations += 1;
            Ok(())
        }

        async fn click_tab(&mut self, label: &str) -> Result<bool, ScrapeError> {
            let wanted = label.to_lowercase();
            for (tab, html) in &self.tabs {
                if tab.to_lowercase() == wanted {
                    self.current = html;
                    return Ok(true);
                }
            }
            Ok(false)
        }

        async fn active_tab(&mut self) -> Result<String, ScrapeError> {
            Ok(self.active_label.to_string())
        }

        async fn html(&mut self) -> Result<String, ScrapeError> {
            Ok(self.current.to_string())
        }

        async fn close(&mut self) -> Result<(), ScrapeError> {
            Ok(())
        }
    }

    pub const GRILL_HTML: &str = r#"<div class="cu-dining-meals"><div class="wrapper">
        <div class="station-title">Grill</div>
        <div class="meal-item"><h5 class="meal-title">Burgers</h5></div>
        </div></div>"#;

    pub const BAKERY_HTML: &str = r#"<div class="cu-dining-meals"><div class="wrapper">
        <div class="station-title">Bakery</div>
        <div class="meal-item"><h5 class="meal-title">Croissant</h5></div>
        </div></div>"#;

    const EMPTY_HTML: &str = "<div></div>";

    fn cfg(tabs: &'static [TabSpec], fallback: FallbackRule) -> TabbedScrape {
        TabbedScrape {
            url: "http://test",
            tabs,
            fallback,
            post_load: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn first_successful_tab_wins_a_slot() {
        static TABS: &[TabSpec] = &[
            TabSpec { label: "Lunch", meals: &[MealSlot::Lunch] },
            TabSpec { label: "Lunch & Dinner", meals: &[MealSlot::Lunch, MealSlot::Dinner] },
        ];
        let mut page = ScriptedPage::new(
            vec![("Lunch", GRILL_HTML), ("Lunch & Dinner", BAKERY_HTML)],
            EMPTY_HTML,
        );
        let out = run(&cfg(TABS, FallbackRule::None), &mut page).await.unwrap();
        // lunch kept the first tab's stations; dinner got the second's
        assert_eq!(out.by_meal[&MealSlot::Lunch][0].name, "Grill");
        assert_eq!(out.by_meal[&MealSlot::Dinner][0].name, "Bakery");
    }

    #[tokio::test]
    async fn missing_tabs_are_skipped() {
        static TABS: &[TabSpec] = &[
            TabSpec { label: "Brunch", meals: &[MealSlot::Breakfast] },
            TabSpec { label: "Dinner", meals: &[MealSlot::Dinner] },
        ];
        let mut page = ScriptedPage::new(vec![("Dinner", GRILL_HTML)], EMPTY_HTML);
        let out = run(&cfg(TABS, FallbackRule::None), &mut page).await.unwrap();
        assert!(!out.by_meal.contains_key(&MealSlot::Breakfast));
        assert!(out.by_meal.contains_key(&MealSlot::Dinner));
    }

    #[tokio::test]
    async fn breakfast_fallback_classifies_the_active_tab() {
        static TABS: &[TabSpec] = &[
            TabSpec { label: "Lunch", meals: &[MealSlot::Lunch] },
        ];
        // after the Lunch click the page stays on a brunch-labelled tab
        let mut page = ScriptedPage::new(vec![("Lunch", GRILL_HTML)], EMPTY_HTML);
        page.active_label = "Brunch";
        let out = run(&cfg(TABS, FallbackRule::BreakfastFromActiveTab), &mut page)
            .await
            .unwrap();
        // fallback re-read the current page and filed it under breakfast
        assert_eq!(out.by_meal[&MealSlot::Breakfast][0].name, "Grill");
    }

    #[tokio::test]
    async fn lunch_dinner_fallback_fills_both_when_label_is_unhelpful() {
        static TABS: &[TabSpec] = &[
            TabSpec { label: "Lunch", meals: &[MealSlot::Lunch] },
            TabSpec { label: "Dinner", meals: &[MealSlot::Dinner] },
        ];
        // no tab bar at all, but the page itself has content
        let mut page = ScriptedPage::new(vec![], GRILL_HTML);
        let out = run(&cfg(TABS, FallbackRule::LunchDinnerFromActiveTab), &mut page)
            .await
            .unwrap();
        assert!(out.by_meal.contains_key(&MealSlot::Lunch));
        assert!(out.by_meal.contains_key(&MealSlot::Dinner));
    }

    #[tokio::test]
    async fn capacity_comes_from_the_first_tab_that_reports_it() {
        static TABS: &[TabSpec] = &[
            TabSpec { label: "Lunch", meals: &[MealSlot::Lunch] },
        ];
        const WITH_CAP: &str = r#"<div class="cu-dining-crowdedness">
            <div class="marker">40% Full</div></div>
            <div class="cu-dining-meals"><div class="wrapper">
            <div class="station-title">Grill</div>
            <div class="meal-item"><h5 class="meal-title">Burgers</h5></div>
            </div></div>"#;
        let mut page = ScriptedPage::new(vec![("Lunch", WITH_CAP)], "<div></div>");
        let out = run(&cfg(TABS, FallbackRule::None), &mut page).await.unwrap();
        assert_eq!(out.capacity, Some(40));
    }
}
