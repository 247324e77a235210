//! Indexed-note domain record.
//!
//! # Responsibility
//! - Define the canonical record the indexer keeps per tracked note.
//! - Provide validation guarding the score/multiplier range invariants.
//!
//! # Invariants
//! - `ilm_id` is stable for the lifetime of the note file.
//! - `score > 0` and `multiplier > 1` for every persisted record.
//! - `path` is the absolute location of the backing note file.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Length of the short note id carried in the `ilm` frontmatter key.
pub const ILM_ID_LEN: usize = 8;

/// Default score assigned to a freshly tracked note.
pub const DEFAULT_SCORE: f64 = 1.0;

/// Default interval multiplier assigned to a freshly tracked note.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Canonical record for one tracked note, mirrored between the note file
/// frontmatter and the `ilms` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ilm {
    /// Stable short id stored in the note's `ilm` frontmatter key.
    pub ilm_id: String,
    /// Optional key linking the note to its external bibliographic item.
    pub zot_key: Option<String>,
    /// Absolute path of the backing note file. Updated when files move.
    pub path: String,
    /// Creation timestamp; immutable from the note's perspective.
    pub created_date: NaiveDateTime,
    /// Date the next review is due. Advanced by the review processor.
    pub review_date: NaiveDate,
    /// Monotonically increasing mastery measure; Dirichlet concentration
    /// weight when ranking same-day notes.
    pub score: f64,
    /// Per-note growth factor applied to each review interval.
    pub multiplier: f64,
}

/// Validation failure for an [`Ilm`] record.
#[derive(Debug, Clone, PartialEq)]
pub enum IlmValidationError {
    EmptyId,
    RelativePath(String),
    NonPositiveScore(f64),
    MultiplierNotAboveOne(f64),
}

impl Display for IlmValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "ilm id must not be empty"),
            Self::RelativePath(path) => {
                write!(f, "note path must be absolute, got `{path}`")
            }
            Self::NonPositiveScore(score) => {
                write!(f, "score must be > 0, got {score}")
            }
            Self::MultiplierNotAboveOne(multiplier) => {
                write!(f, "multiplier must be > 1, got {multiplier}")
            }
        }
    }
}

impl Error for IlmValidationError {}

impl Ilm {
    /// Checks the record against the persistence invariants.
    ///
    /// Write paths must call this before any SQL mutation; invalid values
    /// coming from a note file are coerced by the indexer before this
    /// point, so a failure here signals a core bug rather than user input.
    pub fn validate(&self) -> Result<(), IlmValidationError> {
        if self.ilm_id.trim().is_empty() {
            return Err(IlmValidationError::EmptyId);
        }
        if !std::path::Path::new(&self.path).is_absolute() {
            return Err(IlmValidationError::RelativePath(self.path.clone()));
        }
        if !valid_score(self.score) {
            return Err(IlmValidationError::NonPositiveScore(self.score));
        }
        if !valid_multiplier(self.multiplier) {
            return Err(IlmValidationError::MultiplierNotAboveOne(self.multiplier));
        }
        Ok(())
    }
}

/// Returns whether a score value satisfies the persistence invariant.
pub fn valid_score(score: f64) -> bool {
    score.is_finite() && score > 0.0
}

/// Returns whether a multiplier value satisfies the persistence invariant.
pub fn valid_multiplier(multiplier: f64) -> bool {
    multiplier.is_finite() && multiplier > 1.0
}

/// Generates a fresh short note id.
///
/// Derived from a v4 UUID truncated to [`ILM_ID_LEN`] hex characters,
/// matching the width users see in the `ilm` frontmatter key.
pub fn generate_ilm_id() -> String {
    let mut buffer = Uuid::encode_buffer();
    let simple = Uuid::new_v4().simple().encode_lower(&mut buffer);
    simple[..ILM_ID_LEN].to_string()
}
