//! Personalized university timetables.
//!
//! This crate turns per-track calendar data into a single student's
//! timetable:
//! - `source` loads track events (precomputed index or raw ICS snapshot)
//!   once per process
//! - `filter` decides which events a student attends from their selected
//!   course units, groups and home track
//! - `calendar` and `ics` assemble and serialize the result
//! - `timetable` wires configured semesters together behind one call

pub mod calendar;
pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod event;
pub mod filter;
pub mod group;
pub mod ics;
pub mod selection;
pub mod source;
pub mod timetable;

pub use calendar::{OutputCalendar, assemble};
pub use config::{EdtConfig, SemesterConfig};
pub use directory::{TrackDirectory, TrackGrouping, group_by_track};
pub use error::{EdtError, EdtResult};
pub use event::{Event, EventTime, GroupSet};
pub use filter::{Decision, FilterEngine, Verdict};
pub use group::GroupParser;
pub use selection::Selection;
pub use source::{Backend, EventSource, FsLoader, TrackData, TrackKey, TrackLoader};
pub use timetable::Timetable;
