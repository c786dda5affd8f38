//! A student's selection: one group number per course unit plus a home
//! track.

use std::collections::BTreeMap;

use crate::error::{EdtError, EdtResult};

/// Per-request selection, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    groups: BTreeMap<String, u32>,
    home_track: String,
}

impl Selection {
    pub fn new(home_track: impl Into<String>) -> Self {
        Selection {
            groups: BTreeMap::new(),
            home_track: home_track.into(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>, group: u32) -> Self {
        self.groups.insert(unit.into(), group);
        self
    }

    /// Build a selection from flat query parameters: `UE_CODE=group`
    /// entries plus one `home_key=TRACK` entry.
    ///
    /// Later duplicates of a key override earlier ones. Group numbers must be
    /// positive integers.
    pub fn from_query<'a, I>(pairs: I, home_key: &str) -> EdtResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut home_track = None;
        let mut groups = BTreeMap::new();

        for (key, value) in pairs {
            if key == home_key {
                home_track = Some(value.trim().to_string());
                continue;
            }
            let group = value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|g| *g > 0)
                .ok_or_else(|| EdtError::InvalidGroup {
                    unit: key.to_string(),
                    value: value.to_string(),
                })?;
            groups.insert(key.to_string(), group);
        }

        let home_track = home_track
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EdtError::MissingHomeTrack(home_key.to_string()))?;

        Ok(Selection { groups, home_track })
    }

    pub fn home_track(&self) -> &str {
        &self.home_track
    }

    /// Selected group for `unit`, if the student takes it.
    pub fn group_of(&self, unit: &str) -> Option<u32> {
        self.groups.get(unit).copied()
    }

    /// Selected UE codes, in sorted order.
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
