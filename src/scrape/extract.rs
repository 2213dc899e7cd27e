//! Shared DOM extraction for the Columbia dining pages.
//!
//! Selector lists carry several variants because the pages have shipped
//! under different wrappers over time.

use scraper::{ElementRef, Html, Selector};

use crate::models::menu::Station;
use crate::services::normalize::clean;

const WRAPPER_SEL: &str = ".cu-dining-meals .wrapper, #cu-dining-meals .wrapper";
const STATION_TITLE_SEL: &str = ".station-title, h2";
const MEAL_ITEM_SEL: &str = ".meal-item";
const MEAL_TITLE_SEL: &str = ".meal-title, h5";
const MARKER_SEL: &str = ".cu-dining-crowdedness .marker, .indicator .marker, .indicator-item .marker";
const BAR_SEL: &str = ".cu-dining-crowdedness .bar, .indicator .bar, .indicator-item .bar";

fn sel(s: &str) -> Selector {
    Selector::parse(s).unwrap()
}

fn text_of(el: ElementRef<'_>) -> String {
    clean(&el.text().collect::<Vec<_>>().join(" "))
}

/// Stations under a given scope element: one `.wrapper` per station,
/// titled by `.station-title`, items under `.meal-item .meal-title`.
pub fn stations_in(scope: ElementRef<'_>, wrapper_selector: &str) -> Vec<Station> {
    let wrapper_sel = sel(wrapper_selector);
    let title_sel = sel(STATION_TITLE_SEL);
    let item_sel = sel(MEAL_ITEM_SEL);
    let item_title_sel = sel(MEAL_TITLE_SEL);

    let mut stations = Vec::new();
    for wrapper in scope.select(&wrapper_sel) {
        let name = match wrapper.select(&title_sel).next() {
            Some(t) => text_of(t),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }
        let items: Vec<String> = wrapper
            .select(&item_sel)
            .filter_map(|item| item.select(&item_title_sel).next())
            .map(text_of)
            .filter(|i| !i.is_empty())
            .collect();
        if !items.is_empty() {
            stations.push(Station { name, items });
        }
    }
    stations
}

/// Stations of the whole page.
pub fn stations_from(html: &str) -> Vec<Station> {
    let doc = Html::parse_document(html);
    stations_in(doc.root_element(), WRAPPER_SEL)
}

/// Crowd level: a "N% Full" marker first, then the width of the
/// crowdedness progress bar. Never fabricated — out-of-range and
/// missing values are `None`.
pub fn capacity_from(html: &str) -> Option<u8> {
    let doc = Html::parse_document(html);

    if let Some(marker) = doc.select(&sel(MARKER_SEL)).next() {
        if let Some(pct) = percent_in(&text_of(marker)) {
            return Some(pct);
        }
    }

    let bar = doc.select(&sel(BAR_SEL)).next()?;
    let style = bar.value().attr("style")?;
    let after_width = &style[style.find("width")?..];
    bounded_percent(first_uint(after_width)?)
}

/// First "<digits> %" occurrence in a chunk of text.
fn percent_in(text: &str) -> Option<u8> {
    let idx = text.find('%')?;
    let digits: Vec<char> = text[..idx]
        .chars()
        .rev()
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let n: u32 = digits.iter().rev().collect::<String>().parse().ok()?;
    bounded_percent(n)
}

fn first_uint(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn bounded_percent(n: u32) -> Option<u8> {
    (n <= 100).then_some(n as u8)
}
