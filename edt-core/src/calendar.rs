//! Output timetable assembly.

use std::fmt;

use crate::event::Event;
use crate::ics::generate_ics;

/// A student's timetable: included events in insertion order plus a display
/// name. Built fresh for every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputCalendar {
    name: String,
    events: Vec<Event>,
}

impl OutputCalendar {
    pub fn new(name: impl Into<String>) -> Self {
        OutputCalendar {
            name: name.into(),
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn summaries(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.summary.as_str()).collect()
    }

    pub fn to_ics(&self) -> String {
        generate_ics(self)
    }
}

impl Extend<Event> for OutputCalendar {
    fn extend<I: IntoIterator<Item = Event>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

impl fmt::Display for OutputCalendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} events)", self.name, self.events.len())
    }
}

/// Collect `events` under `name`, keeping their order.
pub fn assemble(name: impl Into<String>, events: impl IntoIterator<Item = Event>) -> OutputCalendar {
    let mut calendar = OutputCalendar::new(name);
    calendar.extend(events);
    calendar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::NaiveDate;

    fn event(summary: &str) -> Event {
        Event::new(
            summary,
            EventTime::Date(NaiveDate::from_ymd_opt(2023, 1, 23).unwrap()),
        )
    }

    #[test]
    fn test_assemble_keeps_insertion_order() {
        let calendar = assemble("M1 AND", vec![event("b"), event("a"), event("c")]);

        assert_eq!(calendar.name(), "M1 AND");
        assert_eq!(calendar.summaries(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_assemble_keeps_duplicates() {
        let calendar = assemble("M1 AND", vec![event("a"), event("a")]);
        assert_eq!(calendar.len(), 2);
    }

    #[test]
    fn test_display() {
        let calendar = assemble("M2 DAC", vec![event("a")]);
        assert_eq!(calendar.to_string(), "M2 DAC (1 events)");
    }
}
