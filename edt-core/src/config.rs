//! Service configuration: data location and per-semester tables.
//!
//! Layers, lowest priority first:
//! 1. built-in `defaults.toml`
//! 2. user file (default `~/.config/edt/config.toml`)
//! 3. `EDT_*` environment variables (e.g. `EDT_DATA_DIR`)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_HOME_KEY;
use crate::directory::TrackDirectory;
use crate::error::{EdtError, EdtResult};

static DEFAULTS: &str = include_str!("defaults.toml");

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_home_key() -> String {
    DEFAULT_HOME_KEY.to_string()
}

fn default_session_kinds() -> Vec<String> {
    vec!["T[A-Z]{1,2}".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdtConfig {
    /// Directory holding `<level>_<track>.ics` snapshots and `index/`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Query key carrying the home track
    #[serde(default = "default_home_key")]
    pub home_key: String,

    #[serde(default)]
    pub semesters: BTreeMap<String, SemesterConfig>,
}

/// One semester window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterConfig {
    /// Year level shown in the calendar name, e.g. `M1`
    pub level: String,

    /// Events starting before this instant are never considered
    pub cutoff: DateTime<FixedOffset>,

    /// Track ownership of every selectable course unit
    pub tracks: Vec<TrackUnits>,

    /// Units read from the student's own track at request time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub home_track_units: Vec<String>,

    #[serde(default)]
    pub rules: FilterRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackUnits {
    pub track: String,
    pub units: Vec<String>,
}

/// Keyword tables used by the filtering passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Events mentioning any of these are always dropped
    #[serde(default)]
    pub exclude_keywords: Vec<String>,

    /// Extra markers of sessions common to every student of the home track
    #[serde(default)]
    pub home_markers: Vec<String>,

    #[serde(default)]
    pub cross_track: Vec<CrossTrackRule>,

    /// Regex fragments for session kinds followed by group digits
    #[serde(default = "default_session_kinds")]
    pub session_kinds: Vec<String>,

    /// Literal group markers (`GR`, `GROUPE`), matched case-insensitively
    #[serde(default)]
    pub group_markers: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        FilterRules {
            exclude_keywords: Vec::new(),
            home_markers: Vec::new(),
            cross_track: Vec::new(),
            session_kinds: default_session_kinds(),
            group_markers: Vec::new(),
        }
    }
}

/// Sessions of `track` that students of `home` attend even without taking
/// any of its units (e.g. conference slots).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTrackRule {
    pub home: String,
    pub track: String,
    pub markers: Vec<String>,
}

impl SemesterConfig {
    pub fn directory(&self) -> TrackDirectory {
        self.tracks
            .iter()
            .flat_map(|t| t.units.iter().map(move |u| (u.clone(), t.track.clone())))
            .collect()
    }

    pub fn cutoff_utc(&self) -> DateTime<Utc> {
        self.cutoff.with_timezone(&Utc)
    }

    /// Display name of a student's calendar, e.g. `M1 AND`.
    pub fn calendar_name(&self, home_track: &str) -> String {
        format!("{} {}", self.level, home_track)
    }
}

impl EdtConfig {
    pub fn config_path() -> EdtResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EdtError::Config("Could not determine config directory".into()))?
            .join("edt");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default user config path.
    pub fn load() -> EdtResult<Self> {
        let path = Self::config_path()?;
        Self::load_from(Some(&path))
    }

    /// Load the built-in tables, then `path` if given and present, then
    /// the environment.
    pub fn load_from(path: Option<&Path>) -> EdtResult<Self> {
        let mut builder = Config::builder().add_source(File::from_str(DEFAULTS, FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder
            .add_source(Environment::with_prefix("EDT"))
            .build()
            .map_err(|e| EdtError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| EdtError::Config(e.to_string()))
    }

    /// Built-in tables only.
    pub fn defaults() -> EdtResult<Self> {
        toml::from_str(DEFAULTS).map_err(|e| EdtError::Config(e.to_string()))
    }

    /// Save the current config as TOML.
    pub fn save(&self, path: &Path) -> EdtResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EdtError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| EdtError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned())
    }

    pub fn semester(&self, id: &str) -> EdtResult<&SemesterConfig> {
        self.semesters
            .get(id)
            .ok_or_else(|| EdtError::UnknownSemester(id.to_string()))
    }
}
