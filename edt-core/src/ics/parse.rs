//! Calendar snapshot parsing using the icalendar crate's parser.

use icalendar::{
    DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use crate::error::{EdtError, EdtResult};
use crate::event::{Event, EventTime};

/// Parse every `VEVENT` of a calendar snapshot.
///
/// Events without a usable `DTSTART` are skipped: they can never be placed
/// relative to a semester cutoff. Group sets are left to be derived on
/// demand.
pub fn parse_events(content: &str) -> EdtResult<Vec<Event>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| EdtError::IcsParse(e.to_string()))?;

    let mut skipped = 0usize;
    let events: Vec<Event> = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| {
            let event = parse_vevent(vevent);
            if event.is_none() {
                skipped += 1;
            }
            event
        })
        .collect();

    if skipped > 0 {
        tracing::debug!(skipped, "skipped VEVENTs without DTSTART");
    }

    Ok(events)
}

fn parse_vevent(vevent: &Component) -> Option<Event> {
    let start = to_event_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time);

    // TEXT values come back already unescaped from the parser
    let text = |name: &str| vevent.find_prop(name).map(|p| p.val.to_string());

    Some(Event {
        uid: vevent.find_prop("UID").map(|p| p.val.to_string()),
        summary: text("SUMMARY").unwrap_or_default(),
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        start,
        end,
        groups: None,
    })
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}
