//! Note-tree to index reconciliation.
//!
//! # Responsibility
//! - Walk the notes root, reconcile every tracked note against the
//!   `ilms` table, and sweep rows whose files disappeared.
//! - Normalize malformed frontmatter fields and write corrections back.
//!
//! # Invariants
//! - The index is authoritative on invalid or illegal note values.
//! - A note file is rewritten only when its metadata actually changed.
//! - Per-file failures are logged and skipped; they never abort the scan.

use crate::config::Config;
use crate::model::ilm::{
    generate_ilm_id, valid_multiplier, valid_score, Ilm, DEFAULT_MULTIPLIER, DEFAULT_SCORE,
};
use crate::note::{tracked_notes, NoteFile};
use crate::repo::{IlmRepository, RepoError, SqliteIlmRepository};
use crate::service::{ServiceError, ServiceResult};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{info, warn};
use rand::Rng;
use rusqlite::Connection;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::Path;

/// Scheduling keys the indexer owns, in canonical frontmatter order.
const CANONICAL_KEYS: [&str; 6] = ["ilm", "review", "reviewed", "score", "multiplier", "created"];

/// Counters summarizing one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tracked notes visited.
    pub scanned: usize,
    /// New index rows created.
    pub created: usize,
    /// Existing index rows mutated.
    pub updated: usize,
    /// Note files rewritten with normalized metadata.
    pub rewritten: usize,
    /// Index rows removed by the deletion sweep.
    pub deleted: usize,
}

/// Reconciles the note tree with the index.
pub struct Indexer<'a> {
    config: &'a Config,
}

/// Default metadata generated for a freshly tracked note.
struct GeneratedDefaults {
    ilm_id: String,
    review: NaiveDate,
    score: f64,
    multiplier: f64,
    created: NaiveDateTime,
}

impl GeneratedDefaults {
    /// Fresh id, review in 1-5 random days, unit score, doubling interval.
    fn draw<R: Rng + ?Sized>(now: NaiveDateTime, rng: &mut R) -> Self {
        Self {
            ilm_id: generate_ilm_id(),
            review: now.date() + Duration::days(rng.gen_range(1..=5)),
            score: DEFAULT_SCORE,
            multiplier: DEFAULT_MULTIPLIER,
            created: now,
        }
    }
}

/// Outcome of reconciling one frontmatter field against the index row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOutcome {
    /// File and index already agree.
    Kept,
    /// The note's valid new value was copied into the index row.
    Propagated,
    /// The note's invalid value was replaced with the index value.
    Coerced,
}

/// One entry of the uniform field-reconciliation table: every indexed
/// scheduling field is checked by a validity predicate and falls back to
/// the index value when the check fails.
struct FieldRule {
    key: &'static str,
    reconcile: fn(&mut NoteFile, &mut Ilm, NaiveDate) -> FieldOutcome,
}

const FIELD_RULES: [FieldRule; 4] = [
    FieldRule {
        key: "score",
        reconcile: |note, ilm, _today| match note.get_f64("score") {
            Some(score) if valid_score(score) => {
                if score != ilm.score {
                    ilm.score = score;
                    FieldOutcome::Propagated
                } else {
                    FieldOutcome::Kept
                }
            }
            _ => {
                note.set_f64("score", ilm.score);
                FieldOutcome::Coerced
            }
        },
    },
    FieldRule {
        key: "multiplier",
        reconcile: |note, ilm, _today| match note.get_f64("multiplier") {
            Some(multiplier) if valid_multiplier(multiplier) => {
                if multiplier != ilm.multiplier {
                    ilm.multiplier = multiplier;
                    FieldOutcome::Propagated
                } else {
                    FieldOutcome::Kept
                }
            }
            _ => {
                note.set_f64("multiplier", ilm.multiplier);
                FieldOutcome::Coerced
            }
        },
    },
    FieldRule {
        key: "review",
        reconcile: |note, ilm, today| match note.get_date("review") {
            Some(date) if date == ilm.review_date => FieldOutcome::Kept,
            // Moves into the future are genuine reschedules; moves to
            // today or the past would re-enter the processed queue.
            Some(date) if date > today => {
                ilm.review_date = date;
                FieldOutcome::Propagated
            }
            _ => {
                note.set_date("review", ilm.review_date);
                FieldOutcome::Coerced
            }
        },
    },
    FieldRule {
        key: "created",
        reconcile: |note, ilm, _today| match note.get_datetime("created") {
            Some(created) if created == ilm.created_date => FieldOutcome::Kept,
            // Creation time is immutable from the note's perspective.
            _ => {
                note.set_datetime("created", ilm.created_date);
                FieldOutcome::Coerced
            }
        },
    },
];

impl<'a> Indexer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Walks the note tree and reconciles every tracked note against the
    /// index, then deletes rows whose ids were not observed.
    pub fn sync<R: Rng + ?Sized>(
        &self,
        conn: &Connection,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> ServiceResult<SyncReport> {
        info!("event=index_sync module=indexer status=start");
        let repo = SqliteIlmRepository::new(conn);
        let mut report = SyncReport::default();
        let mut unseen: HashSet<String> = repo.list_ids()?.into_iter().collect();

        for (path, note) in tracked_notes(&self.config.notes_dir) {
            report.scanned += 1;
            match self.reconcile_note(&repo, &path, note, now, rng, &mut report) {
                Ok(ilm_id) => {
                    unseen.remove(&ilm_id);
                }
                Err(err) => {
                    warn!(
                        "event=index_note module=indexer status=skip path={} error={err}",
                        path.display()
                    );
                }
            }
        }

        let stale: Vec<String> = unseen.into_iter().collect();
        report.deleted = repo.delete_ids(&stale)?;
        if report.deleted > 0 {
            info!(
                "event=index_sweep module=indexer status=ok removed={}",
                report.deleted
            );
        }

        info!(
            "event=index_sync module=indexer status=ok scanned={} created={} updated={} rewritten={} deleted={}",
            report.scanned, report.created, report.updated, report.rewritten, report.deleted
        );
        Ok(report)
    }

    /// Reconciles one tracked note. Returns the note's stable id so the
    /// caller can exempt it from the deletion sweep.
    fn reconcile_note<R: Rng + ?Sized>(
        &self,
        repo: &SqliteIlmRepository<'_>,
        path: &Path,
        mut note: NoteFile,
        now: NaiveDateTime,
        rng: &mut R,
        report: &mut SyncReport,
    ) -> ServiceResult<String> {
        let original = note.metadata.clone();
        let ilm_id = note
            .get_str("ilm")
            .unwrap_or_default()
            .trim()
            .to_string();
        let path_text = path.display().to_string();

        let ilm_id = match repo.get(&ilm_id)? {
            None => {
                let defaults = GeneratedDefaults::draw(now, rng);
                normalize_metadata(&mut note, &defaults);
                coerce_new_note(&mut note, &defaults, path);
                let ilm = ilm_from_note(&ilm_id, &path_text, &note);
                self.create_with_conflict_retry(repo, &ilm)?;
                report.created += 1;
                info!(
                    "event=index_create module=indexer status=ok ilm={} path={path_text}",
                    ilm.ilm_id
                );
                ilm.ilm_id
            }
            Some(mut ilm) => {
                let before = ilm.clone();
                for rule in &FIELD_RULES {
                    let outcome = (rule.reconcile)(&mut note, &mut ilm, now.date());
                    if outcome == FieldOutcome::Coerced {
                        warn!(
                            "event=index_coerce module=indexer status=ok ilm={ilm_id} field={}",
                            rule.key
                        );
                    }
                }
                // Key order in a note the index already knows is the
                // user's business; only value repairs may trigger a
                // rewrite here.
                if note.get_bool("reviewed").is_none() {
                    note.set_bool("reviewed", false);
                }
                if ilm.path != path_text {
                    info!(
                        "event=index_move module=indexer status=ok ilm={ilm_id} path={path_text}"
                    );
                    ilm.path = path_text;
                }
                if ilm != before {
                    repo.update(&ilm)?;
                    report.updated += 1;
                }
                ilm.ilm_id
            }
        };

        if note.metadata != original {
            note.write(path)?;
            report.rewritten += 1;
        }

        Ok(ilm_id)
    }

    /// Inserts a new index row, deleting a stale row that still owns the
    /// path and retrying exactly once on a path-uniqueness conflict.
    fn create_with_conflict_retry(
        &self,
        repo: &SqliteIlmRepository<'_>,
        ilm: &Ilm,
    ) -> ServiceResult<()> {
        match repo.create(ilm) {
            Ok(()) => Ok(()),
            Err(RepoError::PathConflict { path }) => {
                warn!(
                    "event=index_conflict module=indexer status=retry ilm={} path={path}",
                    ilm.ilm_id
                );
                repo.delete_by_path(&path)?;
                repo.create(ilm).map_err(ServiceError::from)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Fills missing or null scheduling keys with generated defaults and
/// reorders them to canonical position, keeping user values and every
/// non-scheduling key untouched.
fn normalize_metadata(note: &mut NoteFile, defaults: &GeneratedDefaults) {
    for key in CANONICAL_KEYS {
        if matches!(note.metadata.get(key), Some(value) if !value.is_null()) {
            continue;
        }
        let value = match key {
            "ilm" => Value::String(defaults.ilm_id.clone()),
            "review" => Value::String(
                defaults
                    .review
                    .format(crate::note::DATE_FORMAT)
                    .to_string(),
            ),
            "reviewed" => Value::Bool(false),
            "score" => Value::Number(defaults.score.into()),
            "multiplier" => Value::Number(defaults.multiplier.into()),
            "created" => Value::String(
                defaults
                    .created
                    .format(crate::note::DATETIME_FORMAT)
                    .to_string(),
            ),
            _ => unreachable!("unknown canonical key"),
        };
        note.metadata.insert(Value::String(key.to_string()), value);
    }
    reorder_metadata(note);
}

/// Moves the scheduling keys to canonical order ahead of every other key,
/// preserving the relative order of the rest.
fn reorder_metadata(note: &mut NoteFile) {
    let mut normalized = Mapping::new();
    for key in CANONICAL_KEYS {
        if let Some(value) = note.metadata.get(key) {
            normalized.insert(Value::String(key.to_string()), value.clone());
        }
    }
    for (key, value) in &note.metadata {
        if matches!(key.as_str(), Some(k) if CANONICAL_KEYS.contains(&k)) {
            continue;
        }
        normalized.insert(key.clone(), value.clone());
    }
    note.metadata = normalized;
}

/// Replaces unparsable or out-of-range values in a freshly tracked note
/// with the generated defaults, so the first index row is always valid.
fn coerce_new_note(note: &mut NoteFile, defaults: &GeneratedDefaults, path: &Path) {
    if note.get_str("ilm").map_or(true, |id| id.trim().is_empty()) {
        warn!(
            "event=index_coerce module=indexer status=ok path={} field=ilm",
            path.display()
        );
        note.set_str("ilm", defaults.ilm_id.clone());
    }
    if note.get_date("review").is_none() {
        note.set_date("review", defaults.review);
    }
    if note.get_bool("reviewed").is_none() {
        note.set_bool("reviewed", false);
    }
    if !note.get_f64("score").is_some_and(valid_score) {
        note.set_f64("score", defaults.score);
    }
    if !note.get_f64("multiplier").is_some_and(valid_multiplier) {
        note.set_f64("multiplier", defaults.multiplier);
    }
    if note.get_datetime("created").is_none() {
        note.set_datetime("created", defaults.created);
    }
}

/// Builds the index row for a normalized, coerced new note.
fn ilm_from_note(ilm_id: &str, path: &str, note: &NoteFile) -> Ilm {
    Ilm {
        ilm_id: note.get_str("ilm").unwrap_or(ilm_id).to_string(),
        zot_key: note.get_str("zotero").map(str::to_string),
        path: path.to_string(),
        created_date: note.get_datetime("created").unwrap_or_default(),
        review_date: note.get_date("review").unwrap_or_default(),
        score: note.get_f64("score").unwrap_or(DEFAULT_SCORE),
        multiplier: note.get_f64("multiplier").unwrap_or(DEFAULT_MULTIPLIER),
    }
}
