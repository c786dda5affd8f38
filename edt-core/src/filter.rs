//! The filtering engine: decides which events of which tracks end up in a
//! student's timetable.
//!
//! For every track the student needs and every event of that track (from
//! the semester cutoff on), [`FilterEngine::decide`] runs these passes:
//!
//! 1. exclusion: an always-exclude keyword drops the event, no matter what
//! 2. home track: on the student's own track, events naming the track or a
//!    common marker are kept and evaluation stops
//! 3. cross track: configured marker sessions of another track are kept for
//!    students of a given home track; evaluation continues
//! 4. unit match: the first selected unit whose code appears in the summary
//!    decides alone, by group
//!
//! Decisions are pure; output order follows track order, then event order.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::calendar::OutputCalendar;
use crate::config::SemesterConfig;
use crate::directory::{TrackDirectory, group_by_track};
use crate::error::EdtResult;
use crate::event::Event;
use crate::group::GroupParser;
use crate::selection::Selection;
use crate::source::{EventSource, FsLoader, TrackKey, TrackLoader};

/// Outcome of the passes for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision<'a> {
    /// Kept by a cross-track marker, independently of `verdict`
    pub cross_track: bool,
    pub verdict: Verdict<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// Matched an always-exclude keyword
    Excluded,
    /// Shared session of the student's home track
    Home,
    /// Session of this unit, for the student's group
    Unit(&'a str),
    /// No pass kept it
    Discard,
}

impl Decision<'_> {
    fn only(verdict: Verdict<'_>) -> Decision<'_> {
        Decision {
            cross_track: false,
            verdict,
        }
    }

    /// How many times the event is written to the output. Cross-track and
    /// unit matches are not merged.
    pub fn copies(&self) -> usize {
        let kept = matches!(self.verdict, Verdict::Home | Verdict::Unit(_));
        usize::from(self.cross_track) + usize::from(kept)
    }
}

/// Filtering rules of one semester, compiled once and shared by requests.
pub struct FilterEngine<L = FsLoader> {
    id: String,
    semester: SemesterConfig,
    directory: TrackDirectory,
    parser: Option<GroupParser>,
    source: Arc<EventSource<L>>,
}

impl<L: TrackLoader> FilterEngine<L> {
    /// Compile `semester`. A group pattern that does not compile is logged
    /// and leaves the engine unable to derive groups: units whose events
    /// need derivation then never match.
    pub fn new(id: impl Into<String>, semester: SemesterConfig, source: Arc<EventSource<L>>) -> Self {
        let id = id.into();
        let parser = match GroupParser::new(
            &semester.rules.session_kinds,
            &semester.rules.group_markers,
        ) {
            Ok(parser) => Some(parser),
            Err(e) => {
                tracing::warn!(semester = %id, error = %e, "group pattern disabled");
                None
            }
        };

        FilterEngine {
            id,
            directory: semester.directory(),
            semester,
            parser,
            source,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn semester(&self) -> &SemesterConfig {
        &self.semester
    }

    /// Tracks to read for `selection`, each with the selected units it owns.
    ///
    /// Only tracks owning a selected unit are read. The home track's shared
    /// sessions therefore show up only when the student takes one of its
    /// units (or a unit mapped to it at request time).
    pub fn tracks_for(&self, selection: &Selection) -> EdtResult<Vec<(String, BTreeSet<String>)>> {
        let directory = self
            .directory
            .with_home_units(&self.semester.home_track_units, selection.home_track());

        let grouping = group_by_track(selection.units(), &directory)?;
        Ok(grouping.into_iter().collect())
    }

    /// Run the passes for one event of `track`.
    ///
    /// `units` are the selected units owned by `track`, scanned in order.
    pub fn decide<'u>(
        &self,
        track: &str,
        units: &'u BTreeSet<String>,
        event: &Event,
        selection: &Selection,
    ) -> Decision<'u> {
        let rules = &self.semester.rules;
        let home = selection.home_track();

        if rules.exclude_keywords.iter().any(|k| event.mentions(k)) {
            return Decision::only(Verdict::Excluded);
        }

        if track == home && (event.mentions(track) || rules.home_markers.iter().any(|m| event.mentions(m)))
        {
            return Decision::only(Verdict::Home);
        }

        let cross_track = rules
            .cross_track
            .iter()
            .filter(|rule| rule.home == home && rule.track == track)
            .any(|rule| rule.markers.iter().any(|m| event.mentions(m)));

        Decision {
            cross_track,
            verdict: self.match_unit(units, event, selection),
        }
    }

    /// First unit named by the summary decides. A unit whose group set can't
    /// be obtained is skipped as if it did not match.
    fn match_unit<'u>(&self, units: &'u BTreeSet<String>, event: &Event, selection: &Selection) -> Verdict<'u> {
        for unit in units {
            let Some(group) = selection.group_of(unit) else {
                continue;
            };
            if !event.mentions(unit) {
                continue;
            }

            let admitted = match (&self.parser, &event.groups) {
                (Some(parser), _) => parser.groups_for(event).admits(group),
                // Without a parser only precomputed groups can be used
                (None, Some(groups)) => groups.admits(group),
                (None, None) => {
                    tracing::debug!(semester = %self.id, unit = %unit, "no group parser, unit skipped");
                    continue;
                }
            };

            return if admitted {
                Verdict::Unit(unit)
            } else {
                Verdict::Discard
            };
        }
        Verdict::Discard
    }

    /// Build the timetable of `selection`.
    ///
    /// Every needed track is loaded before filtering starts, so a data error
    /// never yields a partial calendar.
    pub async fn filter_courses(&self, selection: &Selection) -> EdtResult<OutputCalendar> {
        let tracks = self.tracks_for(selection)?;
        let cutoff = self.semester.cutoff_utc();

        let mut loaded = Vec::with_capacity(tracks.len());
        for (track, units) in tracks {
            let key = TrackKey::new(&self.semester.level, &track);
            let data = self.source.track(&key).await?;
            loaded.push((track, units, data));
        }

        let mut calendar = OutputCalendar::new(self.semester.calendar_name(selection.home_track()));
        for (track, units, data) in &loaded {
            for event in data.events_from(cutoff) {
                let decision = self.decide(track, units, event, selection);
                for _ in 0..decision.copies() {
                    calendar.push(event.clone());
                }
            }
        }

        tracing::debug!(
            semester = %self.id,
            home = %selection.home_track(),
            tracks = loaded.len(),
            events = calendar.len(),
            "filtered timetable"
        );

        Ok(calendar)
    }
}
