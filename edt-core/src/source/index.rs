//! Precomputed track index records.
//!
//! An index is a JSON array written by the snapshot pipeline, one record per
//! event, with times already normalized to UTC:
//!
//! ```json
//! [{ "uid": "…", "summary": "MU4IN202-MOGPL-TD3",
//!    "start": "2023-01-23T08:30:00Z", "end": "2023-01-23T10:30:00Z",
//!    "groups": [3], "location": "Jussieu 24-25 105" }]
//! ```
//!
//! `start`/`end` also accept the ICS basic UTC form (`20230123T083000Z`).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EdtError, EdtResult};
use crate::event::{Event, EventTime, GroupSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub summary: String,
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Absent when the pipeline could not precompute groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<GroupSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IndexRecord {
    pub fn into_event(self) -> EdtResult<Event> {
        let start = parse_instant(&self.start)?;
        let end = self.end.as_deref().map(parse_instant).transpose()?;

        Ok(Event {
            uid: self.uid,
            summary: self.summary,
            description: self.description,
            location: self.location,
            start: EventTime::DateTimeUtc(start),
            end: end.map(EventTime::DateTimeUtc),
            groups: self.groups,
        })
    }
}

/// Parse an index file into events.
pub fn parse_index(content: &str) -> EdtResult<Vec<Event>> {
    let records: Vec<IndexRecord> = serde_json::from_str(content)
        .map_err(|e| EdtError::IcsParse(format!("invalid index: {e}")))?;

    records.into_iter().map(IndexRecord::into_event).collect()
}

fn parse_instant(s: &str) -> EdtResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), "%Y%m%dT%H%M%S")
        .map(|dt| dt.and_utc())
        .map_err(|_| EdtError::IcsParse(format!("invalid index time '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_index_records() {
        let content = r#"[
            {"uid": "a@ufr", "summary": "MU4IN202-MOGPL-TD3",
             "start": "2023-01-23T09:30:00+01:00", "end": "2023-01-23T10:30:00Z",
             "groups": [3], "location": "Jussieu"},
            {"summary": "MOGPL-Cours", "start": "20230124T080000Z", "groups": []},
            {"summary": "MOGPL-TD2", "start": "2023-01-25T08:00:00Z"}
        ]"#;

        let events = parse_index(content).unwrap();
        assert_eq!(events.len(), 3);

        assert_eq!(
            events[0].start,
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2023, 1, 23, 8, 30, 0).unwrap())
        );
        assert_eq!(events[0].groups, Some([3].into_iter().collect()));
        assert_eq!(events[0].location.as_deref(), Some("Jussieu"));

        assert_eq!(
            events[1].start,
            EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2023, 1, 24, 8, 0, 0).unwrap())
        );
        assert_eq!(events[1].groups, Some(GroupSet::new()));
        assert!(events[1].end.is_none());

        assert!(events[2].groups.is_none());
    }

    #[test]
    fn test_parse_index_rejects_bad_time() {
        let content = r#"[{"summary": "x", "start": "next monday"}]"#;
        assert!(matches!(parse_index(content), Err(EdtError::IcsParse(_))));
    }

    #[test]
    fn test_parse_index_rejects_bad_json() {
        assert!(parse_index("{not json").is_err());
    }
}
