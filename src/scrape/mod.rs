pub mod browser;
pub mod extract;
pub mod ferris;
pub mod john_jay;
pub mod johnnys;
pub mod liondine;
pub mod tabbed;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::menu::{HallMenu, MealSlot, MenuByMeal};

/// Bounded wait for a page load on the rendered sources.
pub const NAV_TIMEOUT: Duration = Duration::from_secs(20);
/// Settle delay after the initial load of a rendered page.
pub const POST_LOAD_SETTLE: Duration = Duration::from_secs(4);
/// Settle delay after each tab click.
pub const TAB_SETTLE: Duration = Duration::from_secs(2);
/// Wall-clock budget the orchestrator grants each source.
pub const SOURCE_BUDGET: Duration = Duration::from_secs(120);

/// Single-source failure. Non-fatal for supplemental sources; fatal for
/// the refresh cycle when the primary source raises it.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("extraction failed: {0}")]
    Extraction(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScrapeError::Timeout(e.to_string())
        } else {
            ScrapeError::Navigation(e.to_string())
        }
    }
}

/// The static primary source: full hall list for every meal slot.
#[async_trait]
pub trait PrimarySource: Send + Sync {
    async fn fetch(&self) -> Result<MenuByMeal, ScrapeError>;
}

/// A rendered supplemental source covering a single hall. Yields that
/// hall's entry for each meal slot it could populate.
#[async_trait]
pub trait SupplementalSource: Send + Sync {
    /// Name the merged entry is published under.
    fn canonical_name(&self) -> &'static str;

    /// Primary-source spellings of this hall, removed before insertion.
    /// Alias sets must stay pairwise disjoint across sources.
    fn aliases(&self) -> &'static [&'static str];

    /// Hours used when the primary side had no entry to inherit from.
    fn hours_fallback(&self, _slot: MealSlot) -> String {
        "Hours vary".into()
    }

    async fn fetch(&self) -> Result<BTreeMap<MealSlot, HallMenu>, ScrapeError>;
}
