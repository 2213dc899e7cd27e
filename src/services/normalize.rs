use std::collections::HashSet;

use crate::models::menu::{HallMenu, MenuByMeal, Station};

/// Collapse whitespace runs to single spaces and trim.
pub fn clean(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a station's text fields, deduplicate items preserving
/// first-seen order, and drop the station if nothing survives.
pub fn normalize_station(station: Station) -> Option<Station> {
    let name = clean(&station.name);
    if name.is_empty() {
        return None;
    }
    let mut seen = HashSet::new();
    let items: Vec<String> = station
        .items
        .iter()
        .map(|i| clean(i))
        .filter(|i| !i.is_empty() && seen.insert(i.clone()))
        .collect();
    if items.is_empty() {
        return None;
    }
    Some(Station { name, items })
}

/// Clean every station of a hall entry; `None` when no stations survive,
/// which removes the hall from that meal slot entirely.
pub fn normalize_hall(hall: HallMenu) -> Option<HallMenu> {
    let stations: Vec<Station> = hall
        .stations
        .into_iter()
        .filter_map(normalize_station)
        .collect();
    if stations.is_empty() {
        return None;
    }
    let hours = clean(&hall.hours);
    Some(HallMenu {
        name: clean(&hall.name),
        hours: if hours.is_empty() { "Hours vary".into() } else { hours },
        stations,
        capacity_percent: hall.capacity_percent,
    })
}

/// Normalize a whole per-meal dataset, dropping empty halls per slot.
pub fn normalize_menu(raw: MenuByMeal) -> MenuByMeal {
    raw.into_iter()
        .map(|(slot, halls)| {
            (
                slot,
                halls.into_iter().filter_map(normalize_hall).collect(),
            )
        })
        .collect()
}
