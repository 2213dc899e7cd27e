use std::collections::BTreeMap;

use crate::models::menu::{HallMenu, MealSlot, MenuByMeal};

/// Fold one supplemental source's per-meal data into the primary dataset.
///
/// Precedence, per slot:
/// 1. every primary entry whose name is in `aliases` is removed, keeping
///    the first one as the carrier of primary hours/capacity;
/// 2. if the supplemental source has data for the slot, a replacement
///    entry named `canonical_name` is inserted with the supplemental
///    stations, the removed entry's hours (else `hours_fallback`), and
///    the primary capacity when present (else the supplemental's);
/// 3. otherwise the removed primary entry is kept as-is, only gaining a
///    capacity figure when it had none and the supplemental provides one.
///
/// The supplemental capacity is the first non-null value found across
/// that source's own meal slots, applied uniformly.
pub fn fold_supplemental<F>(
    primary: &mut MenuByMeal,
    supplemental: &BTreeMap<MealSlot, HallMenu>,
    aliases: &[&str],
    canonical_name: &str,
    hours_fallback: F,
) where
    F: Fn(MealSlot) -> String,
{
    let supplemental_capacity = supplemental
        .values()
        .find_map(|hall| hall.capacity_percent);

    for slot in MealSlot::ALL {
        let halls = primary.entry(slot).or_default();

        let removed = halls
            .iter()
            .position(|h| aliases.contains(&h.name.as_str()))
            .map(|i| halls.remove(i));
        halls.retain(|h| !aliases.contains(&h.name.as_str()));

        match (supplemental.get(&slot), removed) {
            (Some(sup), removed) => {
                let hours = removed
                    .as_ref()
                    .map(|h| h.hours.clone())
                    .unwrap_or_else(|| hours_fallback(slot));
                let capacity_percent = removed
                    .and_then(|h| h.capacity_percent)
                    .or(supplemental_capacity);
                halls.push(HallMenu {
                    name: canonical_name.to_string(),
                    hours,
                    stations: sup.stations.clone(),
                    capacity_percent,
                });
            }
            (None, Some(mut kept)) => {
                if kept.capacity_percent.is_none() {
                    kept.capacity_percent = supplemental_capacity;
                }
                halls.push(kept);
            }
            (None, None) => {}
        }
    }
}
