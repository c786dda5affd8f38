use chrono_tz::Tz;

/// Timezone used for floating and all-day times, and for unknown TZIDs.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Paris;

/// Query parameter that carries the student's home track.
pub const DEFAULT_HOME_KEY: &str = "MAJ";

/// PRODID written into generated calendars.
pub const PRODID: &str = "-//edt//timetable//FR";

/// Sub-directory of the data dir holding precomputed track indexes.
pub const INDEX_DIR: &str = "index";
