//! Scheduled session types.
//!
//! An [`Event`] is one session read from a track's calendar. Both event
//! source backends produce this same shape; the filtering engine never
//! needs to know which one served a track.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TIMEZONE;

/// One scheduled session of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// UID from the source calendar, when it had one
    pub uid: Option<String>,
    /// Human-readable title, e.g. `MU4IN202-MOGPL-TD3`
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: Option<EventTime>,
    /// Group numbers precomputed by the index pipeline.
    /// `None` means they have to be derived from the summary.
    pub groups: Option<GroupSet>,
}

impl Event {
    pub fn new(summary: impl Into<String>, start: EventTime) -> Self {
        Event {
            uid: None,
            summary: summary.into(),
            description: None,
            location: None,
            start,
            end: None,
            groups: None,
        }
    }

    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_groups(mut self, groups: GroupSet) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Start instant, used for cutoff comparison and ordering.
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.to_utc()
    }

    /// Whether the summary contains `needle` as a literal substring.
    pub fn mentions(&self, needle: &str) -> bool {
        self.summary.contains(needle)
    }
}

/// Start or end time of an event, preserving the form it was written in.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Resolve to an instant. Dates are taken at local midnight; floating
    /// times and unknown TZIDs are read in the default timezone.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::Date(d) => local_to_utc(&DEFAULT_TIMEZONE, d.and_time(chrono::NaiveTime::MIN)),
            EventTime::DateTimeUtc(dt) => *dt,
            EventTime::DateTimeFloating(dt) => local_to_utc(&DEFAULT_TIMEZONE, *dt),
            EventTime::DateTimeZoned { datetime, tzid } => {
                let tz: Tz = tzid.parse().unwrap_or(DEFAULT_TIMEZONE);
                local_to_utc(&tz, *datetime)
            }
        }
    }
}

fn local_to_utc(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Wall time skipped by a DST jump: read it as UTC
        .unwrap_or_else(|| naive.and_utc())
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
        }
    }
}

/// Group numbers a session applies to.
///
/// An empty set means the session is shared by every group (lectures,
/// exams).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupSet(BTreeSet<u32>);

impl GroupSet {
    pub fn new() -> Self {
        GroupSet(BTreeSet::new())
    }

    pub fn insert(&mut self, group: u32) {
        self.0.insert(group);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, group: u32) -> bool {
        self.0.contains(&group)
    }

    /// Whether a student enrolled in `group` attends the session.
    pub fn admits(&self, group: u32) -> bool {
        self.is_empty() || self.contains(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for GroupSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        GroupSet(iter.into_iter().collect())
    }
}

impl Extend<u32> for GroupSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_group_set_admits_every_group() {
        let groups = GroupSet::new();
        assert!(groups.admits(1));
        assert!(groups.admits(7));
    }

    #[test]
    fn test_group_set_admits_members_only() {
        let groups: GroupSet = [1, 2, 3].into_iter().collect();
        assert!(groups.admits(2));
        let groups: GroupSet = [1, 3].into_iter().collect();
        assert!(!groups.admits(2));
    }

    #[test]
    fn test_zoned_time_resolves_to_utc() {
        let datetime = NaiveDate::from_ymd_opt(2023, 1, 23)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let zoned = EventTime::DateTimeZoned {
            datetime,
            tzid: "Europe/Paris".to_string(),
        };
        assert_eq!(
            zoned.to_utc(),
            Utc.with_ymd_and_hms(2023, 1, 23, 7, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_unknown_tzid_falls_back_to_default_zone() {
        let datetime = NaiveDate::from_ymd_opt(2023, 7, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let zoned = EventTime::DateTimeZoned {
            datetime,
            tzid: "Not/AZone".to_string(),
        };
        assert_eq!(
            zoned.to_utc(),
            Utc.with_ymd_and_hms(2023, 7, 3, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_group_set_serializes_as_plain_list() {
        let groups: GroupSet = [3, 1].into_iter().collect();
        assert_eq!(serde_json::to_string(&groups).unwrap(), "[1,3]");
    }
}
