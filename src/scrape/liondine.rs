use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::models::menu::{HallMenu, MealSlot, MenuByMeal, Station};
use crate::services::normalize::clean;

use super::{PrimarySource, ScrapeError};

pub const LIONDINE_BASE_URL: &str = "https://liondine.com";

const USER_AGENT: &str = "Mozilla/5.0 (HungryLionScraper)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The primary source: one static page per meal slot, every hall on it.
pub struct LiondineSource {
    client: reqwest::Client,
    base_url: String,
}

impl LiondineSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn fetch_meal(&self, meal: MealSlot) -> Result<Vec<HallMenu>, ScrapeError> {
        let url = format!("{}/{}", self.base_url, meal.as_str());
        let html = self
            .client
            .get(&url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?
            .text()
            .await?;
        Ok(parse_meal_page(&html))
    }
}

#[async_trait]
impl PrimarySource for LiondineSource {
    async fn fetch(&self) -> Result<MenuByMeal, ScrapeError> {
        let mut by_meal = MenuByMeal::new();
        for meal in MealSlot::ALL {
            by_meal.insert(meal, self.fetch_meal(meal).await?);
        }
        Ok(by_meal)
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    clean(&el.text().collect::<Vec<_>>().join(" "))
}

/// Parse one meal page. Each `div.col` is a hall: name in `a h3`, hours
/// in `div.hours`, then a sequential scan of `div.menu` children where a
/// `food-type` line opens a station (flushing the previous one) and each
/// `food-name` line adds an item to it.
pub fn parse_meal_page(html: &str) -> Vec<HallMenu> {
    let doc = Html::parse_document(html);
    let col_sel = Selector::parse("div.col").unwrap();
    let name_sel = Selector::parse("a h3").unwrap();
    let hours_sel = Selector::parse("div.hours").unwrap();
    let menu_sel = Selector::parse("div.menu").unwrap();

    let mut halls = Vec::new();
    for col in doc.select(&col_sel) {
        let name = match col.select(&name_sel).next() {
            Some(h) => text_of(h),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }
        let hours = col
            .select(&hours_sel)
            .next()
            .map(text_of)
            .unwrap_or_default();

        let mut stations = Vec::new();
        if let Some(menu) = col.select(&menu_sel).next() {
            let mut current_station = String::new();
            let mut current_items: Vec<String> = Vec::new();

            for child in menu.children().filter_map(ElementRef::wrap) {
                if child.value().classes().any(|c| c == "food-type") {
                    if !current_station.is_empty() {
                        stations.push(Station {
                            name: std::mem::take(&mut current_station),
                            items: std::mem::take(&mut current_items),
                        });
                    }
                    current_station = text_of(child);
                } else if child.value().classes().any(|c| c == "food-name") {
                    let item = text_of(child);
                    if !item.is_empty() {
                        current_items.push(item);
                    }
                }
            }
            if !current_station.is_empty() {
                stations.push(Station {
                    name: current_station,
                    items: current_items,
                });
            }
        }

        halls.push(HallMenu {
            name,
            hours,
            stations,
            capacity_percent: None,
        });
    }
    halls
}
