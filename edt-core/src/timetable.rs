//! Entry point tying configuration, sources and engines together.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::calendar::OutputCalendar;
use crate::config::EdtConfig;
use crate::error::{EdtError, EdtResult};
use crate::filter::FilterEngine;
use crate::selection::Selection;
use crate::source::{EventSource, FsLoader, TrackLoader};

/// All configured semesters over one shared event source, so a track
/// loaded for one request is reused by every later one.
pub struct Timetable<L = FsLoader> {
    home_key: String,
    engines: BTreeMap<String, FilterEngine<L>>,
}

impl Timetable<FsLoader> {
    /// Engines for every semester of `config`, reading tracks from its data
    /// directory.
    pub fn from_config(config: &EdtConfig) -> Self {
        let source = Arc::new(EventSource::new(FsLoader::new(config.data_path())));
        Self::with_source(config, source)
    }
}

impl<L: TrackLoader> Timetable<L> {
    pub fn with_source(config: &EdtConfig, source: Arc<EventSource<L>>) -> Self {
        let engines = config
            .semesters
            .iter()
            .map(|(id, semester)| {
                let engine = FilterEngine::new(id.clone(), semester.clone(), Arc::clone(&source));
                (id.clone(), engine)
            })
            .collect();

        Timetable {
            home_key: config.home_key.clone(),
            engines,
        }
    }

    pub fn semesters(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn engine(&self, semester: &str) -> EdtResult<&FilterEngine<L>> {
        self.engines
            .get(semester)
            .ok_or_else(|| EdtError::UnknownSemester(semester.to_string()))
    }

    /// Timetable for raw query pairs: one `<unit>=<group>` per unit plus the
    /// home track under the configured key.
    pub async fn calendar<'a, I>(&self, semester: &str, query: I) -> EdtResult<OutputCalendar>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let engine = self.engine(semester)?;
        let selection = Selection::from_query(query, &self.home_key)?;
        engine.filter_courses(&selection).await
    }

    /// Same as [`Timetable::calendar`], serialized as iCalendar text.
    pub async fn ics<'a, I>(&self, semester: &str, query: I) -> EdtResult<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Ok(self.calendar(semester, query).await?.to_ics())
    }
}
