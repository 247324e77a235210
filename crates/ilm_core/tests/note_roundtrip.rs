use chrono::NaiveDate;
use ilm_core::NoteFile;

#[test]
fn write_then_read_preserves_metadata_and_body() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.md");

    let mut note = NoteFile::new("# Heading\n\nBody with trailing spaces   \nand a last line");
    note.set_str("ilm", "ab12cd34");
    note.set_date("review", NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    note.set_bool("reviewed", false);
    note.set_f64("score", 1.0);
    note.set_f64("multiplier", 2.0);
    note.set_str("custom", "kept as-is");

    note.write(&path).unwrap();
    let loaded = NoteFile::read(&path).unwrap();

    assert_eq!(loaded.metadata, note.metadata);
    assert_eq!(loaded.body, note.body);
}

#[test]
fn rewriting_an_untouched_note_is_byte_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.md");
    let original = "---\nilm: ab12cd34\nscore: 1.0\n---\nbody line\n";
    std::fs::write(&path, original).unwrap();

    let note = NoteFile::read(&path).unwrap();
    note.write(&path).unwrap();
    let rewritten = std::fs::read_to_string(&path).unwrap();

    let reparsed = NoteFile::read(&path).unwrap();
    assert_eq!(reparsed.metadata, note.metadata);
    assert!(rewritten.ends_with("---\nbody line\n"));
}
