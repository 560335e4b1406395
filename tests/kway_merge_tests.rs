// K-way merger tests
// Merging sorted chunk streams with last-write-wins on folded-key ties.

use tempfile::tempdir;
use wikidict::iterator::merge::KWayMerger;
use wikidict::iterator::{collect, from_records, RecordStream};
use wikidict::sort::ChunkSorter;
use wikidict::types::fold_key;
use wikidict::{Error, Record};

fn stream(pairs: &[(&str, &str)]) -> Box<dyn RecordStream> {
    Box::new(from_records(
        pairs.iter().map(|(k, v)| Record::new(*k, *v)).collect(),
    ))
}

// =============================================================================
// Test 1: Three interleaved chunks → one sorted stream
// =============================================================================
#[test]
fn merges_interleaved_chunks() {
    let mut merger = KWayMerger::new(vec![
        (0, stream(&[("a", "1"), ("d", "4"), ("g", "7")])),
        (1, stream(&[("b", "2"), ("e", "5")])),
        (2, stream(&[("c", "3"), ("f", "6"), ("h", "8")])),
    ])
    .unwrap();

    let keys: Vec<String> = collect(&mut merger).unwrap().into_iter().map(|r| r.key).collect();
    assert_eq!(keys, vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
    assert_eq!(merger.stats().emitted, 8);
    assert_eq!(merger.stats().duplicates_dropped, 0);
    assert_eq!(merger.open_sources(), 0);
}

// =============================================================================
// Test 2: seq 0 ("Apple","x"), seq 1 ("apple","y") → one record, value "y"
// =============================================================================
#[test]
fn case_fold_tie_higher_seq_wins() {
    let mut merger = KWayMerger::new(vec![
        (0, stream(&[("Apple", "x")])),
        (1, stream(&[("apple", "y")])),
    ])
    .unwrap();

    let out = collect(&mut merger).unwrap();
    assert_eq!(out, vec![Record::new("apple", "y")]);
    assert_eq!(merger.stats().duplicates_dropped, 1);
}

// =============================================================================
// Test 3: Tie resolved by seq, not by position in the source list
// =============================================================================
#[test]
fn tie_uses_seq_not_slot_order() {
    let mut merger = KWayMerger::new(vec![
        (5, stream(&[("KEY", "newest")])),
        (1, stream(&[("key", "oldest")])),
        (3, stream(&[("Key", "middle")])),
    ])
    .unwrap();

    let out = collect(&mut merger).unwrap();
    assert_eq!(out, vec![Record::new("KEY", "newest")]);
    assert_eq!(merger.stats().duplicates_dropped, 2);
}

// =============================================================================
// Test 4: Zero chunks → empty output
// =============================================================================
#[test]
fn zero_chunks_is_empty() {
    let mut merger = KWayMerger::new(vec![]).unwrap();
    assert_eq!(merger.next_record().unwrap(), None);
    assert_eq!(merger.next_record().unwrap(), None);
}

// =============================================================================
// Test 5: One chunk → pass-through, in-chunk duplicates collapse to the later
// =============================================================================
#[test]
fn single_chunk_passes_through_deduplicated() {
    let mut merger = KWayMerger::new(vec![(
        0,
        stream(&[("a", "1"), ("B", "old"), ("b", "new"), ("c", "3")]),
    )])
    .unwrap();

    let out = collect(&mut merger).unwrap();
    assert_eq!(
        out,
        vec![Record::new("a", "1"), Record::new("b", "new"), Record::new("c", "3")]
    );
}

// =============================================================================
// Test 6: Duplicate seq ids rejected
// =============================================================================
#[test]
fn duplicate_seq_rejected() {
    let result = KWayMerger::new(vec![(0, stream(&[("a", "1")])), (0, stream(&[("b", "2")]))]);
    assert!(matches!(result, Err(Error::Integrity(_))));
}

// =============================================================================
// Test 7: Chunk sort + merge over files, last write in input order wins
// =============================================================================
#[test]
fn sort_then_merge_is_last_write_wins() {
    let dir = tempdir().unwrap();
    let mut input = Vec::new();
    for round in 0..3 {
        for i in (0..50).rev() {
            input.push(Record::new(format!("Word{i:03}"), format!("round{round}")));
        }
    }

    let mut sorter = ChunkSorter::new(dir.path(), 17).unwrap();
    let chunks = sorter.sort(&mut from_records(input)).unwrap();
    let mut merger = KWayMerger::from_chunks(&chunks).unwrap();
    let out = collect(&mut merger).unwrap();

    assert_eq!(out.len(), 50);
    for pair in out.windows(2) {
        assert!(fold_key(&pair[0].key) < fold_key(&pair[1].key));
    }
    assert!(out.iter().all(|r| r.value == "round2"));
    assert_eq!(merger.stats().duplicates_dropped, 100);
}
