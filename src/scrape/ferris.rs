use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::models::menu::{HallMenu, MealSlot, Station};
use crate::services::{classify, normalize::clean};

use super::browser::Browser;
use super::extract::{capacity_from, stations_in};
use super::{ScrapeError, SupplementalSource, POST_LOAD_SETTLE};

pub const FERRIS_URL: &str = "https://dining.columbia.edu/content/ferris-booth-commons-0";

const MENUS_SEL: &str = "#cu-dining-meals .menus, .cu-dining-meals .menus";
const SCOPED_WRAPPER_SEL: &str = ".wrapper";
const PAGE_WRAPPER_SEL: &str = ".cu-dining-meals .wrapper, #cu-dining-meals .wrapper";

/// Ferris publishes every meal section on one page, each `.menus` block
/// titled with a date-range label that names the meal. No tab clicking,
/// just one settled extraction.
pub struct FerrisSource {
    browser: Arc<dyn Browser>,
    post_load: Duration,
}

impl FerrisSource {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self {
            browser,
            post_load: POST_LOAD_SETTLE,
        }
    }

    #[cfg(test)]
    fn with_post_load(browser: Arc<dyn Browser>, post_load: Duration) -> Self {
        Self { browser, post_load }
    }
}

#[async_trait]
impl SupplementalSource for FerrisSource {
    fn canonical_name(&self) -> &'static str {
        "Ferris Booth Commons"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["Ferris", "Ferris Booth Commons"]
    }

    async fn fetch(&self) -> Result<BTreeMap<MealSlot, HallMenu>, ScrapeError> {
        let mut page = self.browser.open().await?;
        let result = async {
            page.navigate(FERRIS_URL).await?;
            tokio::time::sleep(self.post_load).await;
            page.html().await
        }
        .await;
        let _ = page.close().await;
        Ok(parse_ferris_page(&result?))
    }
}

/// Pure extraction over the settled Ferris DOM.
pub fn parse_ferris_page(html: &str) -> BTreeMap<MealSlot, HallMenu> {
    let doc = Html::parse_document(html);
    let menus_sel = Selector::parse(MENUS_SEL).unwrap();

    let capacity = capacity_from(html);
    let hours = page_hours(&doc);

    let mut by_meal: BTreeMap<MealSlot, Vec<Station>> = BTreeMap::new();
    let mut seen: BTreeMap<MealSlot, HashSet<String>> = BTreeMap::new();

    let mut any_menus = false;
    for menu_el in doc.select(&menus_sel) {
        any_menus = true;
        let title = menu_el.value().attr("data-date-range-title").unwrap_or("");
        let stations = stations_in(menu_el, SCOPED_WRAPPER_SEL);
        if stations.is_empty() {
            continue;
        }
        for meal in classify::classify(title) {
            let slot_seen = seen.entry(meal).or_default();
            let slot = by_meal.entry(meal).or_default();
            for station in &stations {
                if slot_seen.insert(station.name.clone()) {
                    slot.push(station.clone());
                }
            }
        }
    }

    // Some renders skip the .menus level entirely; whatever stations the
    // page shows then belong to the midday menu.
    if !any_menus {
        let stations = stations_in(doc.root_element(), PAGE_WRAPPER_SEL);
        if !stations.is_empty() {
            by_meal.insert(MealSlot::Lunch, stations);
        }
    }

    let hours = hours.unwrap_or_else(|| "Hours vary".into());
    by_meal
        .into_iter()
        .map(|(slot, stations)| {
            (
                slot,
                HallMenu {
                    name: "Ferris Booth Commons".into(),
                    hours: hours.clone(),
                    stations,
                    capacity_percent: capacity,
                },
            )
        })
        .collect()
}

/// Opening hours scraped from the page body: an "Open ... ." sentence
/// when one exists, else a bare "9:00 a.m. - 8:00 p.m." style range.
fn page_hours(doc: &Html) -> Option<String> {
    let body_sel = Selector::parse("body").unwrap();
    let body = doc.select(&body_sel).next()?;
    let text = body.text().collect::<Vec<_>>().join(" ");
    if let Some(start) = text.find("Open") {
        let rest = &text[start..];
        if let Some(end) = rest.find('.').filter(|&end| end <= 120) {
            let hours = clean(&rest[..=end]);
            if !hours.is_empty() {
                return Some(hours);
            }
        }
    }
    time_range_in(&text)
}

/// First "<time> [ap].m. <sep> <time> [ap].m." run in the text, with
/// "-", an en dash, or "to" as the separator.
fn time_range_in(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    for start in 0..tokens.len() {
        let Some(mid) = clock_end(&tokens, start) else {
            continue;
        };
        if !matches!(tokens.get(mid).copied(), Some("-" | "\u{2013}" | "to")) {
            continue;
        }
        if let Some(end) = clock_end(&tokens, mid + 1) {
            return Some(tokens[start..end].join(" "));
        }
    }
    None
}

/// Index past a clock reading at `i`, written "9:00 a.m." or "9:00a.m.".
fn clock_end(tokens: &[&str], i: usize) -> Option<usize> {
    let tok = *tokens.get(i)?;
    for meridiem in ["a.m.", "p.m."] {
        if let Some(digits) = tok.strip_suffix(meridiem) {
            return is_clock(digits).then_some(i + 1);
        }
    }
    if is_clock(tok) && matches!(tokens.get(i + 1).copied(), Some("a.m." | "p.m.")) {
        return Some(i + 2);
    }
    None
}

fn is_clock(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit()) && s.chars().all(|c| c.is_ascii_digit() || c == ':')
}
