//! Notes tree traversal.
//!
//! # Responsibility
//! - Find every tracked markdown note under the notes root.
//! - Keep per-file failures local: log and skip, never abort the scan.

use super::NoteFile;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory name reserved for soft-deleted notes; never scanned.
const TRASH_DIR: &str = ".trash";

/// Collects every tracked note under `root`.
///
/// A note is tracked when its frontmatter carries the `ilm` key. Files in
/// any `.trash` subtree are ignored. Unreadable or malformed files are
/// logged and skipped.
pub fn tracked_notes(root: &Path) -> Vec<(PathBuf, NoteFile)> {
    let mut notes = Vec::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != TRASH_DIR);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("event=note_scan module=note status=skip error={err}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }

        match NoteFile::read(entry.path()) {
            Ok(note) if note.is_tracked() => {
                notes.push((entry.path().to_path_buf(), note));
            }
            Ok(_) => {}
            Err(err) => {
                warn!(
                    "event=note_read module=note status=skip path={} error={err}",
                    entry.path().display()
                );
            }
        }
    }

    notes
}
