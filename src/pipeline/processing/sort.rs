use std::cmp::Reverse;

use crate::domain::WeatherEvent;

/// Order events most recent first.
///
/// Comparison is on the parsed calendar date. The sort is stable, so events
/// sharing a date keep their incoming (priority) order.
pub fn sort_most_recent_first(mut events: Vec<WeatherEvent>) -> Vec<WeatherEvent> {
    events.sort_by_key(|event| Reverse(event.date()));
    events
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
    fn test_sorts_descending_by_date() {
        let sorted = sort_most_recent_first(vec![
            event("2023-07-22", EventType::Wind, "a"),
            event("2024-04-09", EventType::Hail, "b"),
            event("2023-12-31", EventType::Hail, "c"),
        ]);

        let dates: Vec<_> = sorted.iter().map(|e| e.date().to_string()).collect();
        assert_eq!(dates, vec!["2024-04-09", "2023-12-31", "2023-07-22"]);
    }

    #[test]
    fn test_equal_dates_keep_input_order() {
        let sorted = sort_most_recent_first(vec![
            event("2024-04-09", EventType::Wind, "first"),
            event("2024-05-01", EventType::Hail, "newest"),
            event("2024-04-09", EventType::Hail, "second"),
        ]);

        let details: Vec<_> = sorted.iter().map(|e| e.details()).collect();
        assert_eq!(details, vec!["newest", "first", "second"]);
    }

    #[test]
    fn test_adjacent_pairs_are_non_increasing() {
        let sorted = sort_most_recent_first(vec![
            event("2021-03-03", EventType::Hail, "a"),
            event("2024-01-15", EventType::Wind, "b"),
            event("2022-08-30", EventType::Wind, "c"),
            event("2024-01-15", EventType::Hail, "d"),
        ]);

        assert!(sorted.windows(2).all(|pair| pair[0].date() >= pair[1].date()));
    }
}
