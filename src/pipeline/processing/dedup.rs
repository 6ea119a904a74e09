use std::collections::HashSet;

use crate::domain::WeatherEvent;

/// Merge normalized event lists, keeping the first event seen for each
/// `(date, type)` key.
///
/// Lists are scanned in the order given, so earlier lists take priority over
/// later ones when they describe the same day and kind of event. Events are
/// kept whole; fields are never combined across duplicates. The result keeps
/// the relative order of first occurrences.
pub fn dedupe<I>(lists: I) -> Vec<WeatherEvent>
where
    I: IntoIterator<Item = Vec<WeatherEvent>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for event in lists.into_iter().flatten() {
        if seen.insert(event.dedup_key()) {
            merged.push(event);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventType;
    use chrono::NaiveDate;

    fn event(date: &str, event_type: EventType, details: &str) -> WeatherEvent {
        WeatherEvent::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), event_type, details).unwrap()
    }

    #[test]
    fn test_first_list_wins_on_shared_key() {
        let historical = vec![event("2024-04-09", EventType::Hail, "1in hail")];
        let search = vec![event("2024-04-09", EventType::Hail, "golf ball hail")];

        let merged = dedupe([historical, search]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].details(), "1in hail");
    }

    #[test]
    fn test_key_includes_type() {
        let merged = dedupe([vec![
            event("2024-04-09", EventType::Hail, "hail"),
            event("2024-04-09", EventType::Wind, "wind"),
        ]]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_duplicates_within_one_list_are_collapsed() {
        let merged = dedupe([vec![
            event("2024-05-01", EventType::Wind, "first"),
            event("2024-06-01", EventType::Hail, "other"),
            event("2024-05-01", EventType::Wind, "second"),
        ]]);

        let details: Vec<_> = merged.iter().map(|e| e.details()).collect();
        assert_eq!(details, vec!["first", "other"]);
    }

    #[test]
    fn test_preserves_first_occurrence_order() {
        let merged = dedupe([
            vec![event("2023-01-01", EventType::Hail, "a")],
            vec![
                event("2024-01-01", EventType::Hail, "b"),
                event("2023-01-01", EventType::Hail, "dup"),
                event("2022-01-01", EventType::Wind, "c"),
            ],
        ]);

        let details: Vec<_> = merged.iter().map(|e| e.details()).collect();
        assert_eq!(details, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_no_lists() {
        assert!(dedupe(Vec::<Vec<WeatherEvent>>::new()).is_empty());
    }
}
