//! Pipeline configuration.
//!
//! # Responsibility
//! - Load and validate the JSON configuration document once at startup.
//! - Resolve relative directories against the notes root.
//!
//! # Invariants
//! - A successfully loaded `Config` only refers to existing directories.
//! - Configuration is passed by reference; there is no global state.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// File name of the SQLite database inside the data directory.
const DB_FILE_NAME: &str = "ilm.db";

/// Directory name for rotated log files inside the data directory.
const LOG_DIR_NAME: &str = "logs";

/// Raw shape of the configuration document on disk.
#[derive(Debug, Deserialize)]
struct RawConfig {
    notes_dir: PathBuf,
    zotero_notes_dir: PathBuf,
    data_dir: PathBuf,
    timezone: String,
    #[serde(default)]
    zotero_user_id: Option<String>,
    #[serde(default)]
    zotero_api_key: Option<String>,
}

/// Validated process-wide configuration.
///
/// The Zotero credentials are carried opaquely for the external ingestion
/// listener; the pipeline itself never uses them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the user's note tree. Absolute, exists.
    pub notes_dir: PathBuf,
    /// Directory the external listener drops ingested notes into.
    /// Resolved against `notes_dir` when given as a relative path.
    pub zotero_notes_dir: PathBuf,
    /// Directory holding the database and log files. Absolute, exists.
    pub data_dir: PathBuf,
    /// IANA timezone the scheduling day boundaries are computed in.
    pub timezone: Tz,
    pub zotero_user_id: Option<String>,
    pub zotero_api_key: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    MissingDir {
        field: &'static str,
        path: PathBuf,
    },
    RelativePath {
        field: &'static str,
        path: PathBuf,
    },
    BadTimezone(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "invalid config document `{}`: {source}", path.display())
            }
            Self::MissingDir { field, path } => {
                write!(f, "{field} directory `{}` does not exist", path.display())
            }
            Self::RelativePath { field, path } => {
                write!(f, "{field} must be an absolute path, got `{}`", path.display())
            }
            Self::BadTimezone(tz) => write!(f, "unknown timezone identifier `{tz}`"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Config {
    /// Loads and validates the configuration document at `path`.
    ///
    /// # Errors
    /// - `Io`/`Json` when the document is unreadable or malformed.
    /// - `RelativePath`/`MissingDir` when a required directory is invalid.
    /// - `BadTimezone` when the timezone identifier is unknown.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        if !raw.notes_dir.is_absolute() {
            return Err(ConfigError::RelativePath {
                field: "notes_dir",
                path: raw.notes_dir,
            });
        }
        if !raw.notes_dir.is_dir() {
            return Err(ConfigError::MissingDir {
                field: "notes_dir",
                path: raw.notes_dir,
            });
        }

        let zotero_notes_dir = if raw.zotero_notes_dir.is_absolute() {
            raw.zotero_notes_dir
        } else {
            raw.notes_dir.join(raw.zotero_notes_dir)
        };
        if !zotero_notes_dir.is_dir() {
            return Err(ConfigError::MissingDir {
                field: "zotero_notes_dir",
                path: zotero_notes_dir,
            });
        }

        if !raw.data_dir.is_absolute() {
            return Err(ConfigError::RelativePath {
                field: "data_dir",
                path: raw.data_dir,
            });
        }
        if !raw.data_dir.is_dir() {
            return Err(ConfigError::MissingDir {
                field: "data_dir",
                path: raw.data_dir,
            });
        }

        let timezone: Tz = raw
            .timezone
            .parse()
            .map_err(|_| ConfigError::BadTimezone(raw.timezone.clone()))?;

        Ok(Self {
            notes_dir: raw.notes_dir,
            zotero_notes_dir,
            data_dir: raw.data_dir,
            timezone,
            zotero_user_id: raw.zotero_user_id,
            zotero_api_key: raw.zotero_api_key,
        })
    }

    /// Location of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Location of the rotating log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    /// Current wall-clock time in the configured timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}
