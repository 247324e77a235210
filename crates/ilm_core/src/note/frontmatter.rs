//! YAML frontmatter parsing and typed metadata access.
//!
//! # Responsibility
//! - Split a note document into a metadata mapping and an opaque body.
//! - Provide typed get/set helpers for the scheduling keys.
//!
//! # Invariants
//! - The body is never interpreted or normalized.
//! - Metadata key order survives a read/modify/write cycle.

use super::{NoteError, NoteResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Date format used in frontmatter and storage (`review` key).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Datetime format used in frontmatter and storage (`created` key).
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One note document: ordered metadata mapping plus verbatim body text.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFile {
    pub metadata: Mapping,
    pub body: String,
}

impl NoteFile {
    /// Builds an empty note with the given body. Used by tests and by the
    /// external ingestion listener when it drops new files on disk.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            metadata: Mapping::new(),
            body: body.into(),
        }
    }

    /// Reads and parses the note file at `path`.
    pub fn read(path: &Path) -> NoteResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| NoteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parses a full note document.
    ///
    /// The document must start with a `---` line; everything up to the
    /// closing `---` line is YAML metadata, everything after it is the
    /// body, kept byte-for-byte.
    pub fn parse(path: &Path, content: &str) -> NoteResult<Self> {
        let missing = || NoteError::MissingFrontmatter {
            path: path.to_path_buf(),
        };

        let rest = content.strip_prefix("---\n").ok_or_else(missing)?;
        let (yaml, body) = match rest.find("\n---\n") {
            Some(end) => (&rest[..end + 1], &rest[end + 5..]),
            // Closing delimiter at end of file without trailing newline.
            None => match rest.strip_suffix("\n---") {
                Some(yaml) => (yaml, ""),
                None => return Err(missing()),
            },
        };

        let metadata: Mapping = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            serde_yaml::from_str(yaml).map_err(|source| NoteError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        Ok(Self {
            metadata,
            body: body.to_string(),
        })
    }

    /// Serializes the note back to document form.
    pub fn to_document(&self) -> Result<String, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(&Value::Mapping(self.metadata.clone()))?;
        Ok(format!("---\n{yaml}---\n{}", self.body))
    }

    /// Writes the note to `path`, replacing the previous content.
    pub fn write(&self, path: &Path) -> NoteResult<()> {
        let document = self.to_document().map_err(|source| NoteError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, document).map_err(|source| NoteError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether the note opted into tracking by carrying the `ilm` key,
    /// even with a null value.
    pub fn is_tracked(&self) -> bool {
        self.metadata.contains_key("ilm")
    }

    /// Returns whether `key` holds a non-null value.
    pub fn has_value(&self, key: &str) -> bool {
        matches!(self.metadata.get(key), Some(value) if !value.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)?.as_str()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key)?.as_bool()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.metadata.get(key)? {
            Value::Number(number) => number.as_f64(),
            _ => None,
        }
    }

    pub fn get_date(&self, key: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.get_str(key)?, DATE_FORMAT).ok()
    }

    pub fn get_datetime(&self, key: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.get_str(key)?, DATETIME_FORMAT).ok()
    }

    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, Value::String(value.into()));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, Value::Bool(value));
    }

    pub fn set_f64(&mut self, key: &str, value: f64) {
        self.set(key, Value::Number(value.into()));
    }

    pub fn set_date(&mut self, key: &str, value: NaiveDate) {
        self.set_str(key, value.format(DATE_FORMAT).to_string());
    }

    pub fn set_datetime(&mut self, key: &str, value: NaiveDateTime) {
        self.set_str(key, value.format(DATETIME_FORMAT).to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.metadata.remove(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        self.metadata.insert(Value::String(key.to_string()), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("/notes/test.md")
    }

    #[test]
    fn parses_frontmatter_and_body() {
        let doc = "---\nilm: ab12cd34\nscore: 2.5\nreviewed: false\n---\nBody text.\n";
        let note = NoteFile::parse(&path(), doc).unwrap();
        assert_eq!(note.get_str("ilm"), Some("ab12cd34"));
        assert_eq!(note.get_f64("score"), Some(2.5));
        assert_eq!(note.get_bool("reviewed"), Some(false));
        assert_eq!(note.body, "Body text.\n");
    }

    #[test]
    fn body_round_trips_byte_identical() {
        let doc = "---\nilm: x\n---\n\n  indented\n\ttabbed\nno trailing newline";
        let note = NoteFile::parse(&path(), doc).unwrap();
        let rewritten = note.to_document().unwrap();
        let reparsed = NoteFile::parse(&path(), &rewritten).unwrap();
        assert_eq!(reparsed.body, note.body);
        assert_eq!(reparsed.metadata, note.metadata);
    }

    #[test]
    fn unknown_keys_and_order_are_preserved() {
        let doc = "---\ncustom: value\nilm: x\ntags:\n- a\n- b\n---\nbody";
        let mut note = NoteFile::parse(&path(), doc).unwrap();
        note.set_f64("score", 3.0);
        let rewritten = note.to_document().unwrap();
        let custom_pos = rewritten.find("custom:").unwrap();
        let ilm_pos = rewritten.find("ilm:").unwrap();
        assert!(custom_pos < ilm_pos);
        assert!(rewritten.contains("tags:"));
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        let err = NoteFile::parse(&path(), "just text\n").unwrap_err();
        assert!(matches!(err, NoteError::MissingFrontmatter { .. }));
    }

    #[test]
    fn unterminated_frontmatter_is_an_error() {
        let err = NoteFile::parse(&path(), "---\nilm: x\nbody without close\n").unwrap_err();
        assert!(matches!(err, NoteError::MissingFrontmatter { .. }));
    }

    #[test]
    fn null_ilm_key_still_marks_tracking() {
        let note = NoteFile::parse(&path(), "---\nilm:\n---\nbody").unwrap();
        assert!(note.is_tracked());
        assert!(!note.has_value("ilm"));
    }

    #[test]
    fn date_accessors_round_trip() {
        let mut note = NoteFile::new("");
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        let datetime = date.and_hms_opt(23, 5, 1).unwrap();
        note.set_date("review", date);
        note.set_datetime("created", datetime);
        assert_eq!(note.get_date("review"), Some(date));
        assert_eq!(note.get_datetime("created"), Some(datetime));
    }

    #[test]
    fn integer_scores_read_as_f64() {
        let note = NoteFile::parse(&path(), "---\nilm: x\nscore: 4\n---\n").unwrap();
        assert_eq!(note.get_f64("score"), Some(4.0));
    }
}
