use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the four meal pages served by the menu sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Latenight,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Latenight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Latenight => "latenight",
        }
    }

    /// Parse a meal name from a URL path segment (case-insensitive).
    pub fn parse(s: &str) -> Option<MealSlot> {
        match s.to_lowercase().as_str() {
            "breakfast" => Some(MealSlot::Breakfast),
            "lunch" => Some(MealSlot::Lunch),
            "dinner" => Some(MealSlot::Dinner),
            "latenight" => Some(MealSlot::Latenight),
            _ => None,
        }
    }
}

/// A named food-service section and its item list, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub items: Vec<String>,
}

/// One dining hall's offering for a single meal slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallMenu {
    pub name: String,
    pub hours: String,
    pub stations: Vec<Station>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_percent: Option<u8>,
}

/// Halls per meal slot — the shape every fetcher and the merge work on.
pub type MenuByMeal = BTreeMap<MealSlot, Vec<HallMenu>>;

/// The single persisted, fully merged and ordered dataset.
/// Replace-only: each refresh overwrites it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSnapshot {
    pub by_meal: MenuByMeal,
    pub updated_at: DateTime<Utc>,
}
