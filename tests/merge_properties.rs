// Property tests for the build and refresh merges.

use std::collections::BTreeMap;

use proptest::prelude::*;
use tempfile::tempdir;
use wikidict::build::full_build;
use wikidict::iterator::{collect, from_records};
use wikidict::refresh::MergeUpdater;
use wikidict::table::TableReader;
use wikidict::types::fold_key;
use wikidict::{Options, Record};

/// Short keys over a small alphabet in mixed case, so folded collisions
/// are common.
fn key() -> impl Strategy<Value = String> {
    "[a-dA-D]{1,3}"
}

fn record() -> impl Strategy<Value = Record> {
    (key(), "[a-z0-9]{0,8}").prop_map(|(k, v)| Record::new(k, v))
}

/// Expected table: last write per folded key, ordered by folded key.
fn last_write_wins(input: &[Record]) -> Vec<Record> {
    let mut latest: BTreeMap<String, Record> = BTreeMap::new();
    for r in input {
        latest.insert(fold_key(&r.key), r.clone());
    }
    latest.into_values().collect()
}

/// A sorted, duplicate-free table with distinct values.
fn sorted_table(keys: Vec<String>, tag: &str) -> Vec<Record> {
    let mut folded: Vec<String> = keys.iter().map(|k| fold_key(k)).collect();
    folded.sort();
    folded.dedup();
    folded
        .into_iter()
        .map(|k| Record::new(k.clone(), format!("{tag}:{k}")))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn full_build_sorted_and_last_write_wins(
        input in prop::collection::vec(record(), 0..120),
        chunk_size in 1usize..20,
    ) {
        let dir = tempdir().unwrap();
        let options = Options { chunk_size, ..Options::default() };
        let (output, stats) = full_build(&mut from_records(input.clone()), dir.path(), &options).unwrap();

        let rows = collect(&mut TableReader::open(&output.table.path).unwrap()).unwrap();
        for pair in rows.windows(2) {
            prop_assert!(fold_key(&pair[0].key) < fold_key(&pair[1].key));
        }

        let expected = last_write_wins(&input);
        prop_assert_eq!(&rows, &expected);
        prop_assert_eq!(stats.emitted, expected.len() as u64);
        prop_assert_eq!(stats.duplicates_dropped, (input.len() - expected.len()) as u64);
        prop_assert!(!dir.path().join("chunks").exists());
    }

    #[test]
    fn merge_update_matches_map_overlay(
        base_keys in prop::collection::vec(key(), 0..40),
        delta_keys in prop::collection::vec(key(), 0..40),
    ) {
        let base = sorted_table(base_keys, "base");
        let delta = sorted_table(delta_keys, "delta");

        let mut expected: BTreeMap<String, Record> = BTreeMap::new();
        for r in base.iter().chain(delta.iter()) {
            expected.insert(fold_key(&r.key), r.clone());
        }
        let expected: Vec<Record> = expected.into_values().collect();

        let mut updater = MergeUpdater::new(from_records(base.clone()), from_records(delta.clone())).unwrap();
        let out = collect(&mut updater).unwrap();
        prop_assert_eq!(&out, &expected);

        let stats = updater.stats();
        prop_assert_eq!(stats.total(), out.len() as u64);
        prop_assert_eq!(stats.updated + stats.base_only, base.len() as u64);
        prop_assert_eq!(stats.updated + stats.inserted, delta.len() as u64);
    }

    #[test]
    fn merging_table_with_itself_is_identity(keys in prop::collection::vec(key(), 0..40)) {
        let table = sorted_table(keys, "v");
        let mut updater = MergeUpdater::new(from_records(table.clone()), from_records(table.clone())).unwrap();
        prop_assert_eq!(collect(&mut updater).unwrap(), table.clone());
        prop_assert_eq!(updater.stats().updated, table.len() as u64);
    }
}
