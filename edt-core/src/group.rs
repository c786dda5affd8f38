//! Group-token parsing over event summaries.
//!
//! Summaries carry their group numbers as text: either right after a short
//! session-kind abbreviation (`TD3`, `TME1-2`) or after an explicit group
//! marker (`Gr 2`, `groupe 4`). Both forms are collected into one
//! [`GroupSet`]. All knowledge of the summary format lives here so the
//! filtering rules never look at raw text beyond substring checks.

use std::borrow::Cow;

use regex::Regex;

use crate::error::{EdtError, EdtResult};
use crate::event::{Event, GroupSet};

/// Numbers above this are years or room numbers, not groups.
const MAX_GROUP: u32 = 99;

/// Digit run with optional `-`, `,`, `/`, `+`, `&` separated continuations.
const DIGITS: &str = r"(\d+(?:\s*[-,/+&]\s*\d+)*)";

/// Extracts group numbers from summaries.
#[derive(Debug, Clone)]
pub struct GroupParser {
    session: Regex,
    marker: Option<Regex>,
}

impl GroupParser {
    /// Build a parser from session-kind regex fragments (e.g. `T[A-Z]{1,2}`)
    /// and literal group markers (e.g. `GR`, `GROUPE`).
    ///
    /// Session kinds are case-sensitive and must be immediately followed by
    /// the digits. Markers are case-insensitive and may be separated from
    /// the digits by a space, `-` or `_`.
    pub fn new(session_kinds: &[String], group_markers: &[String]) -> EdtResult<Self> {
        if session_kinds.is_empty() {
            return Err(EdtError::MalformedPattern(
                "at least one session kind is required".into(),
            ));
        }

        let kinds = session_kinds
            .iter()
            .map(|k| format!("(?:{k})"))
            .collect::<Vec<_>>()
            .join("|");
        let session = Regex::new(&format!("(?:{kinds}){DIGITS}"))
            .map_err(|e| EdtError::MalformedPattern(e.to_string()))?;

        let marker = if group_markers.is_empty() {
            None
        } else {
            // Longest first so GROUPE wins over GR
            let mut markers: Vec<&String> = group_markers.iter().collect();
            markers.sort_by_key(|m| std::cmp::Reverse(m.len()));
            let alternatives = markers
                .iter()
                .map(|m| regex::escape(m))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"(?i)(?:{alternatives})\s*[-_ ]?{DIGITS}"))
                .map_err(|e| EdtError::MalformedPattern(e.to_string()))?;
            Some(re)
        };

        Ok(GroupParser { session, marker })
    }

    /// Group numbers implied by `summary`. Empty when the summary names no
    /// group, i.e. the session applies to everyone.
    pub fn group_set(&self, summary: &str) -> GroupSet {
        let mut groups = GroupSet::new();
        collect(&self.session, summary, &mut groups);
        if let Some(marker) = &self.marker {
            collect(marker, summary, &mut groups);
        }
        groups
    }

    /// The event's precomputed group set, or one derived from its summary.
    pub fn groups_for<'a>(&self, event: &'a Event) -> Cow<'a, GroupSet> {
        match &event.groups {
            Some(groups) => Cow::Borrowed(groups),
            None => Cow::Owned(self.group_set(&event.summary)),
        }
    }
}

fn collect(re: &Regex, summary: &str, groups: &mut GroupSet) {
    for caps in re.captures_iter(summary) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // A token glued to preceding letters (e.g. `MASTD2`) is not a marker
        let glued = summary[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphabetic());
        if glued {
            continue;
        }
        groups.extend(
            digits
                .as_str()
                .split(|c: char| !c.is_ascii_digit())
                .filter_map(|n| n.parse::<u32>().ok())
                .filter(|n| *n <= MAX_GROUP),
        );
    }
}
