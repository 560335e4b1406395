// Chunk sorter tests
// Splitting an unordered stream into bounded, individually sorted chunks.

use tempfile::tempdir;
use wikidict::iterator::{collect, from_records};
use wikidict::sort::ChunkSorter;
use wikidict::table::TableReader;
use wikidict::types::fold_key;
use wikidict::{Error, Record};

fn records(pairs: &[(&str, &str)]) -> Vec<Record> {
    pairs.iter().map(|(k, v)| Record::new(*k, *v)).collect()
}

// =============================================================================
// Test 1: 10 records, chunk_size 3 → 4 chunks of 3,3,3,1 with seq 0..4
// =============================================================================
#[test]
fn splits_into_bounded_chunks() {
    let dir = tempdir().unwrap();
    let input: Vec<Record> = (0..10)
        .rev()
        .map(|i| Record::new(format!("key_{i:02}"), format!("v{i}")))
        .collect();

    let mut sorter = ChunkSorter::new(dir.path(), 3).unwrap();
    let chunks = sorter.sort(&mut from_records(input)).unwrap();

    let sizes: Vec<u64> = chunks.iter().map(|c| c.records).collect();
    assert_eq!(sizes, vec![3, 3, 3, 1]);
    let seqs: Vec<u64> = chunks.iter().map(|c| c.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
    for chunk in &chunks {
        assert!(chunk.path.exists(), "missing {}", chunk.path.display());
    }
}

// =============================================================================
// Test 2: Every chunk is sorted by folded key
// =============================================================================
#[test]
fn each_chunk_sorted_case_insensitively() {
    let dir = tempdir().unwrap();
    let input = records(&[
        ("pear", "1"),
        ("Apple", "2"),
        ("banana", "3"),
        ("Zebra", "4"),
        ("cherry", "5"),
        ("apricot", "6"),
    ]);

    let mut sorter = ChunkSorter::new(dir.path(), 4).unwrap();
    let chunks = sorter.sort(&mut from_records(input)).unwrap();
    assert_eq!(chunks.len(), 2);

    let first = collect(&mut TableReader::open(&chunks[0].path).unwrap()).unwrap();
    let keys: Vec<&str> = first.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["Apple", "banana", "pear", "Zebra"]);

    for chunk in &chunks {
        let rows = collect(&mut TableReader::open(&chunk.path).unwrap()).unwrap();
        for pair in rows.windows(2) {
            assert!(fold_key(&pair[0].key) <= fold_key(&pair[1].key));
        }
    }
}

// =============================================================================
// Test 3: Duplicates inside one chunk keep arrival order
// =============================================================================
#[test]
fn duplicates_keep_arrival_order() {
    let dir = tempdir().unwrap();
    let input = records(&[("b", "1"), ("KEY", "first"), ("a", "2"), ("key", "second")]);

    let mut sorter = ChunkSorter::new(dir.path(), 100).unwrap();
    let chunks = sorter.sort(&mut from_records(input)).unwrap();
    let rows = collect(&mut TableReader::open(&chunks[0].path).unwrap()).unwrap();

    assert_eq!(
        rows,
        records(&[("a", "2"), ("b", "1"), ("KEY", "first"), ("key", "second")])
    );
}

// =============================================================================
// Test 4: Empty input → no chunks
// =============================================================================
#[test]
fn empty_input_yields_no_chunks() {
    let dir = tempdir().unwrap();
    let mut sorter = ChunkSorter::new(dir.path(), 10).unwrap();
    let chunks = sorter.sort(&mut from_records(vec![])).unwrap();
    assert!(chunks.is_empty());
}

// =============================================================================
// Test 5: chunk_size 0 → configuration error
// =============================================================================
#[test]
fn zero_chunk_size_is_config_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(ChunkSorter::new(dir.path(), 0), Err(Error::Config(_))));
}

// =============================================================================
// Test 6: Huge chunk_size with a tiny input → one chunk, no up-front buffer
// =============================================================================
#[test]
fn huge_chunk_size_small_input() {
    let dir = tempdir().unwrap();
    let input = records(&[("b", "2"), ("a", "1"), ("c", "3")]);

    let mut sorter = ChunkSorter::new(dir.path(), usize::MAX / 2).unwrap();
    let chunks = sorter.sort(&mut from_records(input)).unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].records, 3);
    let rows = collect(&mut TableReader::open(&chunks[0].path).unwrap()).unwrap();
    assert_eq!(rows, records(&[("a", "1"), ("b", "2"), ("c", "3")]));
}
