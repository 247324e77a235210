use chrono::{NaiveDate, NaiveDateTime};
use ilm_core::{run_pipeline, Config, NoteFile};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::Path;

#[test]
fn full_run_indexes_processes_and_allocates_in_order() {
    let (dir, config) = test_config();
    let today = date(2024, 3, 5);
    let now = today.and_hms_opt(12, 0, 0).unwrap();

    // Due today and not reviewed: should end up as the only note in
    // today's queue.
    let due_path = dir.path().join("notes/due.md");
    write_note(&due_path, "duenote1", today, false);

    // Due today but already reviewed: the processor must reschedule it
    // before the allocator runs, so it gets no priority.
    let reviewed_path = dir.path().join("notes/reviewed.md");
    write_note(&reviewed_path, "revnote1", today, true);

    let mut rng = StdRng::seed_from_u64(3);
    let report = run_pipeline(&config, now, &mut rng).unwrap();

    assert_eq!(report.sync.created, 2);
    assert_eq!(report.process.processed, 1);
    assert_eq!(report.allocation.allocated, 1);

    let due = NoteFile::read(&due_path).unwrap();
    assert_eq!(due.get_f64("priority"), Some(100.0));
    assert_eq!(due.get_date("review"), Some(today));

    // Baseline = created (yesterday), elapsed 1 day, multiplier 2.
    let reviewed = NoteFile::read(&reviewed_path).unwrap();
    assert!(!reviewed.metadata.contains_key("priority"));
    assert_eq!(reviewed.get_date("review"), Some(date(2024, 3, 6)));
    assert_eq!(reviewed.get_bool("reviewed"), Some(false));
    assert_eq!(reviewed.get_f64("score"), Some(2.0));
}

fn test_config() -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes");
    fs::create_dir_all(&notes).unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    let config = Config {
        notes_dir: notes.clone(),
        zotero_notes_dir: notes,
        data_dir: data,
        timezone: chrono_tz::UTC,
        zotero_user_id: None,
        zotero_api_key: None,
    };
    (dir, config)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn created() -> NaiveDateTime {
    date(2024, 3, 4).and_hms_opt(9, 0, 0).unwrap()
}

fn write_note(path: &Path, ilm_id: &str, review: NaiveDate, reviewed: bool) {
    let mut note = NoteFile::new("body\n");
    note.set_str("ilm", ilm_id);
    note.set_date("review", review);
    note.set_bool("reviewed", reviewed);
    note.set_f64("score", 1.0);
    note.set_f64("multiplier", 2.0);
    note.set_datetime("created", created());
    note.write(path).unwrap();
}
