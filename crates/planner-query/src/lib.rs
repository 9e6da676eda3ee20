//! Presentation views over a raw event list.
//!
//! Nothing here touches the database: the store hands back events in storage
//! order and these functions derive the sorted and filtered lists shown to
//! the user.

use planner_types::Event;

/// Sort key of an event: `"{date} {time}"`.
///
/// Compared as a plain string. Chronological only while dates are fixed-width
/// `YYYY-MM-DD` and all times share one format; `"09:00 PM"` sorts before
/// `"10:00 AM"`.
pub fn occurrence_key(event: &Event) -> String {
    format!("{} {}", event.date, event.time)
}

/// Ascending by [`occurrence_key`]. Events with equal keys keep their input order.
pub fn sorted_by_occurrence(events: &[Event]) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by_cached_key(occurrence_key);
    sorted
}

/// Events whose name or date contains `query`, ignoring case.
///
/// An empty query keeps everything.
pub fn filter_by_text(events: &[Event], query: &str) -> Vec<Event> {
    if query.is_empty() {
        return events.to_vec();
    }

    let needle = query.to_lowercase();
    events
        .iter()
        .filter(|event| matches_text(event, &needle))
        .cloned()
        .collect()
}

fn matches_text(event: &Event, needle: &str) -> bool {
    event.name.to_lowercase().contains(needle) || event.date.to_lowercase().contains(needle)
}

/// Chains the filter and sort stages over an owned list.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    events: Vec<Event>,
}

impl EventQuery {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn filter(self, query: &str) -> Self {
        Self::new(filter_by_text(&self.events, query))
    }

    pub fn sorted(self) -> Self {
        Self::new(sorted_by_occurrence(&self.events))
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}
