//! Durability and recovery behavior of the checkpoint store.

use regscout_checkpoint::CheckpointStore;
use regscout_core::{PathsConfig, SearchConfig};
use std::fs;
use tempfile::TempDir;

fn open_store(tmp: &TempDir) -> CheckpointStore {
    CheckpointStore::open(
        "harvest",
        &PathsConfig::rooted_at(tmp.path()),
        &SearchConfig::default(),
    )
    .expect("open store")
}

#[test]
fn test_discovered_set_is_monotonic_across_runs() {
    let tmp = TempDir::new().expect("create temp dir");

    // Run 1 discovers two IDs
    {
        let mut store = open_store(&tmp);
        store.record_discovery("MED0000000001");
        store.record_discovery("MED0000000002");
        assert!(store.save());
    }

    // Run 2 loads them, re-observes one, adds a third
    {
        let mut store = open_store(&tmp);
        store.load().expect("load");
        assert_eq!(store.discovered_count(), 2);
        assert!(!store.record_discovery("MED0000000001"));
        assert!(store.record_discovery("MED0000000003"));
        assert!(store.save());
    }

    // Run 3 sees all three; nothing was lost
    let mut store = open_store(&tmp);
    store.load().expect("load");
    assert_eq!(store.discovered_count(), 3);
    for id in ["MED0000000001", "MED0000000002", "MED0000000003"] {
        assert!(store.is_discovered(id), "lost {id}");
    }
}

#[test]
fn test_journal_recovers_ids_missing_from_snapshot() {
    let tmp = TempDir::new().expect("create temp dir");

    // Snapshot holds N ids
    {
        let mut store = open_store(&tmp);
        store.record_discovery("MED0000000001");
        store.record_discovery("MED0000000002");
        assert!(store.save());
    }

    // Simulate a crash after one more journal append but before the next
    // snapshot: the journal has an ID the JSON file does not.
    let journal_path = tmp.path().join("discovery/discovered_ids.raw.txt");
    let mut journal = fs::read_to_string(&journal_path).expect("read journal");
    journal.push_str("MED0000000003\n");
    fs::write(&journal_path, journal).expect("extend journal");

    // load() merges the unsynced ID and re-snapshots immediately
    let mut store = open_store(&tmp);
    assert!(store.load().expect("load"));
    assert_eq!(store.discovered_count(), 3);
    assert!(store.is_discovered("MED0000000003"));

    let ids_file: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("discovery/discovered_ids.json"))
            .expect("read ids file"),
    )
    .expect("parse ids file");
    assert_eq!(ids_file["total_count"], 3);
    assert!(ids_file["reg_ids"]
        .as_array()
        .expect("reg_ids array")
        .iter()
        .any(|v| v == "MED0000000003"));
}

#[test]
fn test_journal_recovery_preserves_completed_sets() {
    let tmp = TempDir::new().expect("create temp dir");

    {
        let mut store = open_store(&tmp);
        store.record_discovery("MED0000000001");
        store.mark_prefix_completed("A");
        store.mark_prefix_completed("B");
        assert!(store.save());
    }

    // Unsynced journal entry forces a reconciliation save during load;
    // completed units loaded from the snapshot must survive it.
    let journal_path = tmp.path().join("discovery/discovered_ids.raw.txt");
    let mut journal = fs::read_to_string(&journal_path).expect("read journal");
    journal.push_str("MED0000000009\n");
    fs::write(&journal_path, journal).expect("extend journal");

    let mut store = open_store(&tmp);
    store.load().expect("load");
    assert!(store.is_prefix_completed("A"));
    assert!(store.is_prefix_completed("B"));
    assert_eq!(store.discovered_count(), 2);

    // And the reconciled state is what a fresh process sees
    let mut verify = open_store(&tmp);
    verify.load().expect("load");
    assert!(verify.is_prefix_completed("A"));
    assert_eq!(verify.discovered_count(), 2);
}

#[test]
fn test_interrupted_save_leaves_snapshot_untouched() {
    let tmp = TempDir::new().expect("create temp dir");

    {
        let mut store = open_store(&tmp);
        store.record_discovery("MED0000000001");
        store.mark_prefix_completed("A");
        assert!(store.save());
    }

    let snapshot_path = tmp.path().join("checkpoints/harvest_checkpoint.json");
    let before = fs::read(&snapshot_path).expect("read snapshot");

    // Simulate a process killed after writing the temp file but before the
    // rename: the temp file exists, the real snapshot is untouched.
    let tmp_path = snapshot_path.with_extension("tmp");
    fs::write(&tmp_path, b"{\"truncated").expect("write torn temp file");

    let after = fs::read(&snapshot_path).expect("read snapshot again");
    assert_eq!(before, after, "snapshot changed without a rename");

    // And the store loads cleanly past the leftover temp file
    let mut store = open_store(&tmp);
    assert!(store.load().expect("load"));
    assert!(store.is_prefix_completed("A"));
}

#[test]
fn test_idempotent_resumption_state() {
    let tmp = TempDir::new().expect("create temp dir");

    // A completed run: every seeded unit finished, IDs recorded
    {
        let mut store = open_store(&tmp);
        for prefix in ["A", "B", "C"] {
            store.mark_prefix_completed(prefix);
        }
        store.record_discovery("MED0000000001");
        assert!(store.save());
    }

    // Resuming changes nothing: same sets, same counts, and a second
    // save/load cycle is byte-stable in content terms
    let mut store = open_store(&tmp);
    store.load().expect("load");
    let discovered_before = store.discovered_count();
    let completed_before = store.completed_prefixes().len();

    assert!(store.save());
    let mut again = open_store(&tmp);
    again.load().expect("load");
    assert_eq!(again.discovered_count(), discovered_before);
    assert_eq!(again.completed_prefixes().len(), completed_before);
}
