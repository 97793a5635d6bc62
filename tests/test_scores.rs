use std::path::PathBuf;

use irq_shooter::error::StoreError;
use irq_shooter::scores::*;

fn scratch_file(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("irq_shooter_{}_{}", tag, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn entry(name: &str, points: u32) -> ScoreEntry {
    ScoreEntry {
        name: name.to_string(),
        points,
    }
}

#[test]
fn memory_store_ranks_highest_first() {
    let mut store = MemoryScores::new();
    for (name, points) in [("AAA", 10), ("BBB", 40), ("CCC", 20), ("DDD", 40)] {
        store.append(entry(name, points)).unwrap();
    }
    let top = store.top(3).unwrap();
    assert_eq!(top, vec![entry("BBB", 40), entry("DDD", 40), entry("CCC", 20)]);
}

#[test]
fn missing_file_reads_as_empty() {
    let store = FileScores::new(scratch_file("missing"));
    assert!(store.top(5).unwrap().is_empty());
}

#[test]
fn file_store_round_trips_entries() {
    let path = scratch_file("roundtrip");
    let mut store = FileScores::new(&path);
    store.append(entry("ACE", 31)).unwrap();
    store.append(ScoreEntry::new("", 7)).unwrap();
    store.append(entry("MAX", 120)).unwrap();

    let top = store.top(2).unwrap();
    assert_eq!(top, vec![entry("MAX", 120), entry("ACE", 31)]);

    let all = FileScores::new(&path).top(10).unwrap();
    assert_eq!(all.last(), Some(&entry("???", 7)));
    let _ = std::fs::remove_file(path);
}

#[test]
fn blank_and_spaced_names_are_normalised() {
    assert_eq!(ScoreEntry::new("", 3), entry(ANONYMOUS, 3));
    assert_eq!(ScoreEntry::new(" \t", 3), entry("???", 3));
    assert_eq!(ScoreEntry::new("A CE", 3), entry("ACE", 3));
    assert_eq!(ScoreEntry::new("ABCDEFGHIJ", 3).name, "ABCDEFGH");
}

#[test]
fn memory_and_file_stores_list_the_same_entry() {
    let path = scratch_file("same");
    let mut file = FileScores::new(&path);
    let mut memory = MemoryScores::new();
    file.append(ScoreEntry::new(" ", 9)).unwrap();
    memory.append(ScoreEntry::new(" ", 9)).unwrap();
    assert_eq!(file.top(1).unwrap(), memory.top(1).unwrap());
    let _ = std::fs::remove_file(path);
}

#[test]
fn file_store_refuses_names_it_cannot_read_back() {
    let path = scratch_file("badname");
    let mut store = FileScores::new(&path);
    assert!(matches!(store.append(entry("A B", 1)), Err(StoreError::BadName(_))));
    assert!(matches!(store.append(entry("", 1)), Err(StoreError::BadName(_))));
    assert!(store.top(5).unwrap().is_empty());
}

#[test]
fn corrupt_line_is_reported() {
    let path = scratch_file("corrupt");
    std::fs::write(&path, "ACE 10\nnonsense\n").unwrap();
    let err = FileScores::new(&path).top(5).unwrap_err();
    assert!(matches!(err, StoreError::Parse { line: 2, .. }));
    let _ = std::fs::remove_file(path);
}
