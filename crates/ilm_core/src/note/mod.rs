//! Note file I/O.
//!
//! # Responsibility
//! - Read and write note files as a YAML frontmatter block plus body.
//! - Walk the notes tree and yield tracked notes.
//!
//! # Invariants
//! - The body round-trips byte-for-byte across read/write.
//! - Unknown frontmatter keys and their order are preserved.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod frontmatter;
pub mod walk;

pub use frontmatter::{NoteFile, DATETIME_FORMAT, DATE_FORMAT};
pub use walk::tracked_notes;

pub type NoteResult<T> = Result<T, NoteError>;

/// Error reading, parsing, or writing a single note file.
#[derive(Debug)]
pub enum NoteError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file does not begin with a `---` delimited frontmatter block.
    MissingFrontmatter { path: PathBuf },
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl NoteError {
    /// Path of the note file the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. }
            | Self::MissingFrontmatter { path }
            | Self::Yaml { path, .. } => path,
        }
    }
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "io error on note `{}`: {source}", path.display())
            }
            Self::MissingFrontmatter { path } => {
                write!(f, "note `{}` has no frontmatter block", path.display())
            }
            Self::Yaml { path, source } => {
                write!(f, "invalid frontmatter in `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for NoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::MissingFrontmatter { .. } => None,
            Self::Yaml { source, .. } => Some(source),
        }
    }
}
