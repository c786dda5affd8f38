//! ICS generation for assembled timetables.

use std::collections::HashMap;

use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::calendar::OutputCalendar;
use crate::constants::PRODID;
use crate::event::{Event, EventTime};

/// Serialize a timetable to iCalendar text (CRLF line endings, folded
/// lines).
///
/// Output only depends on the events: UIDs missing from the source are
/// derived from the event itself and DTSTAMP is the event start. Repeated
/// UIDs get a `-2`, `-3`, ... suffix so every entry stays distinct.
pub fn generate_ics(calendar: &OutputCalendar) -> String {
    let mut cal = Calendar::new();

    // X-WR-CALNAME - Human-readable calendar name (de facto standard)
    cal.append_property(Property::new("X-WR-CALNAME", calendar.name()));

    // An event kept twice must not collapse into one entry in clients
    let mut seen: HashMap<String, usize> = HashMap::new();
    for event in calendar.iter() {
        let uid = event.uid.clone().unwrap_or_else(|| derived_uid(event));
        let count = seen.entry(uid.clone()).or_default();
        *count += 1;
        let uid = if *count == 1 { uid } else { format!("{uid}-{count}") };
        cal.push(to_ics_event(event, &uid));
    }

    let cal = cal.done();
    rewrite_prodid(&cal.to_string())
}

fn to_ics_event(event: &Event, uid: &str) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(uid);

    // DTSTAMP - required by RFC 5545
    let dtstamp = event.start_utc().format("%Y%m%dT%H%M%SZ").to_string();
    ics_event.add_property("DTSTAMP", &dtstamp);

    ics_event.summary(&event.summary);

    add_datetime_property(&mut ics_event, "DTSTART", &event.start);
    if let Some(ref end) = event.end {
        add_datetime_property(&mut ics_event, "DTEND", end);
    }

    if let Some(ref loc) = event.location {
        ics_event.location(loc);
    }

    if let Some(ref desc) = event.description {
        ics_event.description(desc);
    }

    ics_event.done()
}

/// Replace the icalendar crate's PRODID with ours.
fn rewrite_prodid(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
        } else {
            result.push_str(line);
        }
        result.push_str("\r\n");
    }

    result
}

/// Add a datetime property with proper formatting based on EventTime variant
fn add_datetime_property(ics_event: &mut icalendar::Event, name: &str, time: &EventTime) {
    match time {
        EventTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        EventTime::DateTimeUtc(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%SZ").to_string());
        }
        EventTime::DateTimeFloating(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%S").to_string());
        }
        EventTime::DateTimeZoned { datetime, tzid } => {
            let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tzid);
            ics_event.append_property(prop);
        }
    }
}

/// FNV-1a over start, end and summary: stable across runs and processes.
fn derived_uid(event: &Event) -> String {
    let start = event.start.to_utc().to_rfc3339();
    let end = event
        .end
        .as_ref()
        .map(|e| e.to_utc().to_rfc3339())
        .unwrap_or_default();

    let mut hash: u64 = 0xcbf29ce484222325;
    for b in start
        .bytes()
        .chain(end.bytes())
        .chain(event.summary.bytes())
    {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}@edt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_test_event() -> Event {
        Event::new(
            "MU4IN202-MOGPL-TD3",
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2023, 1, 23, 8, 30, 0).unwrap()),
        )
        .with_end(EventTime::DateTimeUtc(
            Utc.with_ymd_and_hms(2023, 1, 23, 10, 30, 0).unwrap(),
        ))
    }

    fn calendar_with(events: Vec<Event>) -> OutputCalendar {
        crate::calendar::assemble("M1 AND", events)
    }

    #[test]
    fn test_generate_ics_has_calendar_envelope_and_name() {
        let ics = generate_ics(&calendar_with(vec![make_test_event()]));

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"), "ICS:\n{}", ics);
        assert!(ics.ends_with("END:VCALENDAR\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("X-WR-CALNAME:M1 AND\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains(&format!("PRODID:{PRODID}\r\n")), "ICS:\n{}", ics);
        assert!(!ics.contains("ICALENDAR-RS"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_writes_one_vevent_per_event() {
        let mut second = make_test_event();
        second.summary = "AND - Conférence".to_string();
        let ics = generate_ics(&calendar_with(vec![make_test_event(), second]));

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("SUMMARY:MU4IN202-MOGPL-TD3"));
        assert!(ics.contains("DTSTART:20230123T083000Z"));
        assert!(ics.contains("DTEND:20230123T103000Z"));
    }

    #[test]
    fn test_generate_ics_omits_unknown_end_and_optional_fields() {
        let mut event = make_test_event();
        event.end = None;
        let ics = generate_ics(&calendar_with(vec![event]));

        assert!(!ics.contains("DTEND"), "ICS:\n{}", ics);
        assert!(!ics.contains("LOCATION"), "ICS:\n{}", ics);
        assert!(!ics.contains("DESCRIPTION"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_keeps_location_and_description() {
        let mut event = make_test_event();
        event.location = Some("Jussieu".to_string());
        event.description = Some("Salle 105".to_string());
        let ics = generate_ics(&calendar_with(vec![event]));

        assert!(ics.contains("LOCATION:Jussieu"), "ICS:\n{}", ics);
        assert!(ics.contains("DESCRIPTION:Salle 105"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_zoned_and_all_day_times() {
        let mut event = make_test_event();
        event.start = EventTime::DateTimeZoned {
            datetime: NaiveDate::from_ymd_opt(2023, 1, 24)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            tzid: "Europe/Paris".to_string(),
        };
        event.end = Some(EventTime::Date(NaiveDate::from_ymd_opt(2023, 1, 25).unwrap()));
        let ics = generate_ics(&calendar_with(vec![event]));

        assert!(
            ics.contains("DTSTART;TZID=Europe/Paris:20230124T140000"),
            "ICS:\n{}",
            ics
        );
        assert!(ics.contains("DTEND;VALUE=DATE:20230125"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_is_deterministic() {
        let calendar = calendar_with(vec![make_test_event()]);
        assert_eq!(generate_ics(&calendar), generate_ics(&calendar));
    }

    #[test]
    fn test_source_uid_is_kept_and_missing_uid_is_derived() {
        let mut with_uid = make_test_event();
        with_uid.uid = Some("mogpl-td3@ufr".to_string());
        let ics = generate_ics(&calendar_with(vec![with_uid, make_test_event()]));

        assert!(ics.contains("UID:mogpl-td3@ufr"), "ICS:\n{}", ics);
        assert!(ics.contains(&format!("UID:{}", derived_uid(&make_test_event()))));
    }

    #[test]
    fn test_generated_ics_parses_back() {
        let mut event = make_test_event();
        event.location = Some("Jussieu".to_string());
        let ics = generate_ics(&calendar_with(vec![event.clone()]));

        let parsed = crate::ics::parse_events(&ics).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].summary, event.summary);
        assert_eq!(parsed[0].start, event.start);
        assert_eq!(parsed[0].end, event.end);
        assert_eq!(parsed[0].location, event.location);
    }

    #[test]
    fn test_text_fields_survive_a_round_trip() {
        let mut event = make_test_event();
        event.summary = "MOGPL; TD3, salle \\ test".to_string();
        event.location = Some("Jussieu\nTour 24".to_string());
        event.description = Some("ligne 1\nligne 2; fin, \\x".to_string());
        let ics = generate_ics(&calendar_with(vec![event.clone()]));

        let parsed = crate::ics::parse_events(&ics).unwrap();
        assert_eq!(parsed[0].summary, event.summary, "ICS:\n{}", ics);
        assert_eq!(parsed[0].location, event.location, "ICS:\n{}", ics);
        assert_eq!(parsed[0].description, event.description, "ICS:\n{}", ics);
    }

    #[test]
    fn test_duplicate_events_get_distinct_uids() {
        let mut with_uid = make_test_event();
        with_uid.uid = Some("conf@ufr".to_string());
        let derived = derived_uid(&make_test_event());
        let ics = generate_ics(&calendar_with(vec![
            with_uid.clone(),
            make_test_event(),
            with_uid,
            make_test_event(),
        ]));

        assert!(ics.contains("UID:conf@ufr\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("UID:conf@ufr-2\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains(&format!("UID:{derived}\r\n")), "ICS:\n{}", ics);
        assert!(ics.contains(&format!("UID:{derived}-2\r\n")), "ICS:\n{}", ics);
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 4);
    }
}
