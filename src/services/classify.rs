use crate::models::menu::MealSlot;

/// Map a page's displayed meal label to the slot(s) it covers.
///
/// Rules are case-insensitive substring checks, evaluated in priority
/// order; an unrecognized label defaults to lunch, matching how the
/// dining pages title their midday menus.
pub fn classify(label: &str) -> Vec<MealSlot> {
    let t = label.to_lowercase();
    if t.contains("breakfast") || t.contains("brunch") {
        vec![MealSlot::Breakfast]
    } else if t.contains("lunch") && t.contains("dinner") {
        vec![MealSlot::Lunch, MealSlot::Dinner]
    } else if t.contains("lunch") {
        vec![MealSlot::Lunch]
    } else if t.contains("dinner") {
        vec![MealSlot::Dinner]
    } else if t.contains("late") {
        vec![MealSlot::Latenight]
    } else {
        vec![MealSlot::Lunch]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::menu::MealSlot::*;

    #[test]
    fn combined_label_maps_to_both_slots() {
        assert_eq!(classify("Lunch & Dinner"), vec![Lunch, Dinner]);
        assert_eq!(classify("lunch and dinner"), vec![Lunch, Dinner]);
    }

    #[test]
    fn brunch_counts_as_breakfast() {
        assert_eq!(classify("Weekend Brunch"), vec![Breakfast]);
        assert_eq!(classify("BREAKFAST"), vec![Breakfast]);
        // breakfast wins even when lunch also appears
        assert_eq!(classify("Breakfast & Lunch"), vec![Breakfast]);
    }

    #[test]
    fn single_meal_labels() {
        assert_eq!(classify("Lunch"), vec![Lunch]);
        assert_eq!(classify("Dinner Menu"), vec![Dinner]);
        assert_eq!(classify("Late Night"), vec![Latenight]);
    }

    #[test]
    fn unknown_label_defaults_to_lunch() {
        assert_eq!(classify(""), vec![Lunch]);
        assert_eq!(classify("Daily Offerings"), vec![Lunch]);
    }
}
