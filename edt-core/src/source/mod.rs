//! Per-track event sources.
//!
//! A track's events come from one of two backends: a precomputed index or
//! a raw calendar snapshot. The backend is picked on first access and kept,
//! together with the events, for the life of the process.

mod cache;
mod fs;
mod index;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::EdtResult;
use crate::event::Event;

pub use cache::TrackCache;
pub use fs::FsLoader;
pub use index::{IndexRecord, parse_index};

/// Identity of a track's data files, e.g. `M1_AND`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub level: String,
    pub track: String,
}

impl TrackKey {
    pub fn new(level: impl Into<String>, track: impl Into<String>) -> Self {
        TrackKey {
            level: level.into(),
            track: track.into(),
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.level, self.track)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Precomputed records, group sets included
    Index,
    /// Full calendar snapshot, group sets derived on demand
    Raw,
}

/// A loaded track: its events sorted by start, and which backend served
/// them. Immutable once built.
#[derive(Debug, Clone)]
pub struct TrackData {
    backend: Backend,
    events: Vec<Event>,
}

impl TrackData {
    pub fn new(backend: Backend, mut events: Vec<Event>) -> Self {
        events.sort_by_key(Event::start_utc);
        TrackData { backend, events }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events starting at or after `cutoff`, in start order.
    pub fn events_from(&self, cutoff: DateTime<Utc>) -> impl Iterator<Item = &Event> {
        let first = self.events.partition_point(|e| e.start_utc() < cutoff);
        self.events[first..].iter()
    }
}

/// Loads the data of one track. Implementations pick the backend.
pub trait TrackLoader: Send + Sync {
    fn load(&self, key: &TrackKey) -> impl Future<Output = EdtResult<TrackData>> + Send;
}

/// Cached access to every track's events.
///
/// Each track is loaded at most once per process, even under concurrent
/// first access. Failed loads are not cached.
pub struct EventSource<L = FsLoader> {
    loader: L,
    cache: TrackCache,
}

impl<L: TrackLoader> EventSource<L> {
    pub fn new(loader: L) -> Self {
        EventSource {
            loader,
            cache: TrackCache::new(),
        }
    }

    /// The track's data, loading it on first access.
    pub async fn track(&self, key: &TrackKey) -> EdtResult<Arc<TrackData>> {
        self.cache
            .get_or_load(key, || self.loader.load(key))
            .await
    }

    /// Events of `key` starting at or after `cutoff`.
    pub async fn events_for(&self, key: &TrackKey, cutoff: DateTime<Utc>) -> EdtResult<Vec<Event>> {
        let data = self.track(key).await?;
        Ok(data.events_from(cutoff).cloned().collect())
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn cache(&self) -> &TrackCache {
        &self.cache
    }
}
