//! Track directory: which track owns the calendar of each course unit.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{EdtError, EdtResult};

/// Course units of one request, grouped by the track that owns them.
/// Tracks and units iterate in sorted order.
pub type TrackGrouping = BTreeMap<String, BTreeSet<String>>;

/// Fixed mapping from UE code to owning track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackDirectory(BTreeMap<String, String>);

impl TrackDirectory {
    pub fn new() -> Self {
        TrackDirectory(BTreeMap::new())
    }

    pub fn insert(&mut self, unit: impl Into<String>, track: impl Into<String>) {
        self.0.insert(unit.into(), track.into());
    }

    pub fn track_of(&self, unit: &str) -> Option<&str> {
        self.0.get(unit).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Directory for one request where each of `home_units` is owned by
    /// `home_track` (e.g. an elective whose sessions are published in every
    /// track's calendar). The shared directory is left untouched.
    pub fn with_home_units<'a>(&'a self, home_units: &[String], home_track: &str) -> Cow<'a, Self> {
        if home_units.is_empty() {
            return Cow::Borrowed(self);
        }
        let mut extended = self.clone();
        for unit in home_units {
            extended.insert(unit.clone(), home_track);
        }
        Cow::Owned(extended)
    }
}

impl<U: Into<String>, T: Into<String>> FromIterator<(U, T)> for TrackDirectory {
    fn from_iter<I: IntoIterator<Item = (U, T)>>(iter: I) -> Self {
        TrackDirectory(iter.into_iter().map(|(u, t)| (u.into(), t.into())).collect())
    }
}

/// Partition `units` by owning track.
///
/// Fails with [`EdtError::UnknownUnit`] on the first code missing from the
/// directory.
pub fn group_by_track<'a, I>(units: I, directory: &TrackDirectory) -> EdtResult<TrackGrouping>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut grouping = TrackGrouping::new();
    for unit in units {
        let track = directory
            .track_of(unit)
            .ok_or_else(|| EdtError::UnknownUnit(unit.to_string()))?;
        grouping
            .entry(track.to_string())
            .or_default()
            .insert(unit.to_string());
    }
    Ok(grouping)
}
