use std::cmp::Ordering;

use crate::models::menu::HallMenu;

/// Display order for the halls we know about. Anything not listed sorts
/// after all known halls, alphabetically (case-sensitive).
const CANONICAL_ORDER: &[&str] = &[
    "John Jay",
    "JJ's Place",
    "Ferris Booth Commons",
    "Johnny's",
    "Chef Mike's Sub Shop",
    "Chef Don's Pizza Pi",
    "Grace Dodge",
    "The Diana",
    "Hewitt",
    "Faculty House",
];

fn canonical_index(name: &str) -> i32 {
    CANONICAL_ORDER
        .iter()
        .position(|&n| n == name)
        .map(|i| i as i32)
        .unwrap_or(-1)
}

/// Stable, total ordering over a slot's hall list.
pub fn sort_halls(halls: &mut [HallMenu]) {
    halls.sort_by(|a, b| {
        let ia = canonical_index(&a.name);
        let ib = canonical_index(&b.name);
        match (ia, ib) {
            (-1, -1) => a.name.cmp(&b.name),
            (-1, _) => Ordering::Greater,
            (_, -1) => Ordering::Less,
            (ia, ib) => ia.cmp(&ib),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hall(name: &str) -> HallMenu {
        HallMenu {
            name: name.into(),
            hours: "Hours vary".into(),
            stations: vec![],
            capacity_percent: None,
        }
    }

    #[test]
    fn known_halls_first_then_unknown_alphabetically() {
        let mut halls = vec![
            hall("Hewitt"),
            hall("Ferris Booth Commons"),
            hall("Unknown Z"),
            hall("Unknown A"),
        ];
        sort_halls(&mut halls);
        let names: Vec<_> = halls.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Ferris Booth Commons", "Hewitt", "Unknown A", "Unknown Z"]
        );
    }

    #[test]
    fn known_halls_follow_the_canonical_sequence() {
        let mut halls = vec![hall("Hewitt"), hall("Johnny's"), hall("John Jay")];
        sort_halls(&mut halls);
        let names: Vec<_> = halls.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["John Jay", "Johnny's", "Hewitt"]);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut once = vec![hall("Unknown B"), hall("The Diana"), hall("Unknown A")];
        sort_halls(&mut once);
        let mut twice = once.clone();
        sort_halls(&mut twice);
        assert_eq!(once, twice);
    }
}
