//! The checkpoint store: snapshot files plus in-memory progress sets.

use crate::error::{CheckpointError, Result};
use crate::journal::Journal;
use regscout_core::{PathsConfig, SearchConfig, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Run statistics carried inside the checkpoint snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStats {
    /// IDs discovered so far (kept equal to the discovered-set size).
    pub total_discovered: u64,
    /// IDs successfully extracted so far.
    pub total_extracted: u64,
    /// Errors observed across all runs against this checkpoint.
    pub errors: u64,
    /// First session start, RFC3339.
    pub start_time: Option<String>,
    /// Last successful save, RFC3339.
    pub last_save_time: Option<String>,
}

/// The checkpoint snapshot file. Field names are the on-disk format and
/// must round-trip exactly for resumability.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SnapshotFile {
    completed_prefixes: Vec<String>,
    completed_combinations: Vec<String>,
    extracted_reg_ids: Vec<String>,
    failed_reg_ids: Vec<String>,
    abandoned_units: Vec<String>,
    current_prefix: Option<String>,
    current_page: u32,
    current_combination: Option<String>,
    stats: RunStats,
}

/// The discovered-IDs file, persisted separately from the snapshot so the
/// potentially very large ID list can be written independently.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DiscoveredIdsFile {
    started_at: Option<String>,
    last_updated: Option<String>,
    total_count: u64,
    reg_ids: Vec<String>,
}

/// Point-in-time progress summary for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    /// Completed prefix-mode units.
    pub prefixes_completed: usize,
    /// Completed combination-mode units.
    pub combinations_completed: usize,
    /// Unique IDs discovered.
    pub total_discovered: usize,
    /// IDs extracted.
    pub total_extracted: usize,
    /// IDs discovered but not yet extracted.
    pub pending_extraction: usize,
    /// IDs whose extraction failed and awaits retry.
    pub failed_extraction: usize,
    /// Units abandoned after exhausting retries.
    pub abandoned_units: usize,
    /// Cumulative error count.
    pub errors: u64,
    /// In-progress prefix unit, if any.
    pub current_prefix: Option<String>,
    /// Page within the in-progress prefix.
    pub current_page: u32,
    /// In-progress combination unit, if any.
    pub current_combination: Option<String>,
    /// When discovery first started, RFC3339.
    pub discovery_started_at: Option<String>,
    /// Last discovery update, RFC3339.
    pub discovery_last_updated: Option<String>,
}

/// Durable, crash-safe storage of harvesting progress.
///
/// Holds the discovered-ID set, the per-mode completed-unit sets,
/// extraction progress, failure/abandonment records and run statistics.
/// Snapshots are written atomically (temp file, then rename); newly
/// discovered IDs additionally hit the append-only [`Journal`] before
/// [`CheckpointStore::record_discovery`] returns.
///
/// One process instance owns a given checkpoint name at a time; there is
/// no cross-process locking.
#[derive(Debug)]
pub struct CheckpointStore {
    checkpoint_file: PathBuf,
    discovered_ids_file: PathBuf,
    legacy_ids_file: PathBuf,
    journal: Journal,

    discovered: BTreeSet<String>,
    completed_prefixes: HashSet<String>,
    completed_combinations: HashSet<String>,
    extracted: HashSet<String>,
    failed: HashSet<String>,
    abandoned: Vec<String>,

    current_prefix: Option<String>,
    current_page: u32,
    current_combination: Option<String>,

    discovery_started_at: Option<String>,
    discovery_last_updated: Option<String>,
    stats: RunStats,

    checkpoint_interval: u64,
    auto_save_interval: Duration,
    last_auto_save: Instant,
}

impl CheckpointStore {
    /// Open a store for the given checkpoint name, creating the data
    /// directories and the journal.
    pub fn open(name: &str, paths: &PathsConfig, search: &SearchConfig) -> Result<Self> {
        let checkpoint_dir = paths.checkpoint_dir()?;
        let discovery_dir = paths.discovery_dir()?;
        fs::create_dir_all(&checkpoint_dir).map_err(|e| CheckpointError::io(&checkpoint_dir, e))?;
        fs::create_dir_all(&discovery_dir).map_err(|e| CheckpointError::io(&discovery_dir, e))?;

        let discovered_ids_file = discovery_dir.join("discovered_ids.json");
        let journal = Journal::open(discovery_dir.join("discovered_ids.raw.txt"))?;

        Ok(Self {
            checkpoint_file: checkpoint_dir.join(format!("{name}_checkpoint.json")),
            discovered_ids_file,
            legacy_ids_file: discovery_dir.join("reg_ids.txt"),
            journal,
            discovered: BTreeSet::new(),
            completed_prefixes: HashSet::new(),
            completed_combinations: HashSet::new(),
            extracted: HashSet::new(),
            failed: HashSet::new(),
            abandoned: Vec::new(),
            current_prefix: None,
            current_page: 0,
            current_combination: None,
            discovery_started_at: None,
            discovery_last_updated: None,
            stats: RunStats::default(),
            checkpoint_interval: search.checkpoint_interval,
            auto_save_interval: Duration::from_secs(search.auto_save_interval_secs),
            last_auto_save: Instant::now(),
        })
    }

    /// Load persisted state.
    ///
    /// Reads the discovered-ID file (migrating the legacy flat list if only
    /// that exists), replays the journal and merges any IDs the snapshot
    /// missed, then reads the checkpoint record. If the journal recovered
    /// anything, an immediate save reconciles the snapshot before normal
    /// operation resumes.
    ///
    /// Returns whether any prior state existed.
    pub fn load(&mut self) -> Result<bool> {
        if self.discovered_ids_file.exists() {
            self.load_discovered_ids()?;
            tracing::info!(
                count = self.discovered.len(),
                file = %self.discovered_ids_file.display(),
                "loaded discovered IDs"
            );
        } else if self.legacy_ids_file.exists() {
            self.migrate_legacy_ids()?;
        }

        let recovered = self.recover_from_journal()?;

        let had_checkpoint = self.checkpoint_file.exists();
        if had_checkpoint {
            let contents = fs::read_to_string(&self.checkpoint_file)
                .map_err(|e| CheckpointError::io(&self.checkpoint_file, e))?;
            let snapshot: SnapshotFile =
                serde_json::from_str(&contents).map_err(|e| CheckpointError::Corrupt {
                    path: self.checkpoint_file.clone(),
                    source: e,
                })?;

            self.completed_prefixes = snapshot.completed_prefixes.into_iter().collect();
            self.completed_combinations = snapshot.completed_combinations.into_iter().collect();
            self.extracted = snapshot.extracted_reg_ids.into_iter().collect();
            self.failed = snapshot.failed_reg_ids.into_iter().collect();
            self.abandoned = snapshot.abandoned_units;
            self.current_prefix = snapshot.current_prefix;
            self.current_page = snapshot.current_page;
            self.current_combination = snapshot.current_combination;
            self.stats = snapshot.stats;

            tracing::info!(
                prefixes = self.completed_prefixes.len(),
                combinations = self.completed_combinations.len(),
                discovered = self.discovered.len(),
                extracted = self.extracted.len(),
                "checkpoint loaded"
            );
        } else {
            tracing::info!(
                file = %self.checkpoint_file.display(),
                "no checkpoint file found"
            );
        }

        self.stats.total_discovered = self.discovered.len() as u64;

        if recovered > 0 {
            tracing::info!(recovered, "recovered IDs from journal, reconciling snapshot");
            self.save();
        }

        Ok(had_checkpoint || !self.discovered.is_empty())
    }

    fn load_discovered_ids(&mut self) -> Result<()> {
        let contents = fs::read_to_string(&self.discovered_ids_file)
            .map_err(|e| CheckpointError::io(&self.discovered_ids_file, e))?;
        let file: DiscoveredIdsFile =
            serde_json::from_str(&contents).map_err(|e| CheckpointError::Corrupt {
                path: self.discovered_ids_file.clone(),
                source: e,
            })?;
        self.discovered = file.reg_ids.into_iter().collect();
        self.discovery_started_at = file.started_at;
        self.discovery_last_updated = file.last_updated;
        Ok(())
    }

    /// Migrate the legacy flat `reg_ids.txt` list into the JSON format.
    fn migrate_legacy_ids(&mut self) -> Result<()> {
        let contents = fs::read_to_string(&self.legacy_ids_file)
            .map_err(|e| CheckpointError::io(&self.legacy_ids_file, e))?;
        self.discovered = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect();

        let now = Timestamp::now().to_rfc3339();
        self.discovery_started_at = Some(now.clone());
        self.discovery_last_updated = Some(now);
        self.write_discovered_ids()?;

        tracing::info!(
            count = self.discovered.len(),
            "migrated legacy flat ID list to JSON format"
        );
        Ok(())
    }

    /// Merge journal entries the snapshot missed. Returns how many IDs were
    /// recovered.
    fn recover_from_journal(&mut self) -> Result<usize> {
        if !self.journal.path().exists() {
            return Ok(0);
        }
        let mut recovered = 0;
        for id in self.journal.replay()? {
            if self.discovered.insert(id) {
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    /// Save the checkpoint record and the discovered-ID file.
    ///
    /// Both are written to a temporary file and renamed over the target,
    /// so an interrupted save can never corrupt an existing snapshot.
    /// A failed save logs the error, leaves in-memory state untouched, and
    /// returns `false`; the next scheduled save simply tries again.
    pub fn save(&mut self) -> bool {
        match self.try_save() {
            Ok(()) => {
                self.last_auto_save = Instant::now();
                tracing::debug!(file = %self.checkpoint_file.display(), "checkpoint saved");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save checkpoint");
                false
            }
        }
    }

    fn try_save(&mut self) -> Result<()> {
        self.stats.last_save_time = Some(Timestamp::now().to_rfc3339());
        self.stats.total_discovered = self.discovered.len() as u64;

        let snapshot = SnapshotFile {
            completed_prefixes: self.completed_prefixes.iter().cloned().collect(),
            completed_combinations: self.completed_combinations.iter().cloned().collect(),
            extracted_reg_ids: self.extracted.iter().cloned().collect(),
            failed_reg_ids: self.failed.iter().cloned().collect(),
            abandoned_units: self.abandoned.clone(),
            current_prefix: self.current_prefix.clone(),
            current_page: self.current_page,
            current_combination: self.current_combination.clone(),
            stats: self.stats.clone(),
        };
        let contents = serde_json::to_vec_pretty(&snapshot)?;
        write_atomic(&self.checkpoint_file, &contents)?;

        self.write_discovered_ids()
    }

    fn write_discovered_ids(&mut self) -> Result<()> {
        self.discovery_last_updated = Some(Timestamp::now().to_rfc3339());
        if self.discovery_started_at.is_none() {
            self.discovery_started_at = Some(Timestamp::now().to_rfc3339());
        }

        let file = DiscoveredIdsFile {
            started_at: self.discovery_started_at.clone(),
            last_updated: self.discovery_last_updated.clone(),
            total_count: self.discovered.len() as u64,
            reg_ids: self.discovered.iter().cloned().collect(),
        };
        let contents = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.discovered_ids_file, &contents)
    }

    /// Record one discovered ID. Returns `true` if it was new.
    ///
    /// A new ID is appended and flushed to the journal *before* this
    /// returns; the next snapshot may be arbitrarily far away, but the ID
    /// is already durable.
    pub fn record_discovery(&mut self, id: &str) -> bool {
        if self.discovered.contains(id) {
            tracing::debug!(id, "duplicate ID skipped");
            return false;
        }

        self.discovered.insert(id.to_string());
        self.stats.total_discovered += 1;

        if let Err(e) = self.journal.append(id) {
            // The ID is in memory and will reach the next snapshot; losing
            // the journal entry only narrows the crash window.
            tracing::error!(id, error = %e, "failed to append to journal");
        }
        true
    }

    /// Whether an ID has already been discovered.
    #[must_use]
    pub fn is_discovered(&self, id: &str) -> bool {
        self.discovered.contains(id)
    }

    /// Number of unique discovered IDs.
    #[must_use]
    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    /// Whether a prefix-mode unit key is complete.
    #[must_use]
    pub fn is_prefix_completed(&self, key: &str) -> bool {
        self.completed_prefixes.contains(key)
    }

    /// Mark a prefix-mode unit complete and clear the current position.
    pub fn mark_prefix_completed(&mut self, key: &str) {
        self.completed_prefixes.insert(key.to_string());
        self.current_prefix = None;
        self.current_page = 0;
        tracing::debug!(prefix = key, "marked prefix completed");
    }

    /// Whether a combination-mode unit key is complete.
    #[must_use]
    pub fn is_combination_completed(&self, key: &str) -> bool {
        self.completed_combinations.contains(key)
    }

    /// Mark a combination-mode unit complete and clear the current position.
    pub fn mark_combination_completed(&mut self, key: &str) {
        self.completed_combinations.insert(key.to_string());
        self.current_combination = None;
        tracing::debug!(combination = key, "marked combination completed");
    }

    /// Completed prefix-mode unit keys.
    #[must_use]
    pub fn completed_prefixes(&self) -> &HashSet<String> {
        &self.completed_prefixes
    }

    /// Completed combination-mode unit keys.
    #[must_use]
    pub fn completed_combinations(&self) -> &HashSet<String> {
        &self.completed_combinations
    }

    /// Record the in-progress prefix position for resumption.
    pub fn set_current_prefix(&mut self, prefix: &str, page: u32) {
        self.current_prefix = Some(prefix.to_string());
        self.current_page = page;
    }

    /// Record the in-progress combination for resumption.
    pub fn set_current_combination(&mut self, key: &str) {
        self.current_combination = Some(key.to_string());
    }

    /// The in-progress prefix unit, if any.
    #[must_use]
    pub fn current_prefix(&self) -> Option<&str> {
        self.current_prefix.as_deref()
    }

    /// The in-progress combination unit, if any.
    #[must_use]
    pub fn current_combination(&self) -> Option<&str> {
        self.current_combination.as_deref()
    }

    /// Record a unit abandoned after exhausting its retries.
    ///
    /// Abandonment is a deliberate coverage-loss escape valve, tracked
    /// separately from genuine completion so it can never be mistaken for
    /// full coverage in reported statistics.
    pub fn record_abandoned(&mut self, key: &str) {
        self.abandoned.push(key.to_string());
        tracing::warn!(unit = key, "unit abandoned after exhausting retries");
    }

    /// Keys of abandoned units.
    #[must_use]
    pub fn abandoned_units(&self) -> &[String] {
        &self.abandoned
    }

    /// Whether an ID has been extracted.
    #[must_use]
    pub fn is_extracted(&self, id: &str) -> bool {
        self.extracted.contains(id)
    }

    /// Mark an ID as successfully extracted.
    pub fn mark_extracted(&mut self, id: &str) {
        if self.extracted.insert(id.to_string()) {
            self.stats.total_extracted += 1;
        }
        self.failed.remove(id);
    }

    /// Record a failed extraction; the ID stays pending for future runs.
    pub fn mark_failed(&mut self, id: &str) {
        self.failed.insert(id.to_string());
    }

    /// IDs whose extraction has failed, sorted.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.failed.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Take the failed set for a retry run, clearing it.
    pub fn take_failed_ids(&mut self) -> Vec<String> {
        let mut ids: Vec<String> = self.failed.drain().collect();
        ids.sort();
        ids
    }

    /// IDs discovered but not yet extracted, sorted. This is the hand-off
    /// contract to the extraction stage.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<String> {
        self.discovered
            .iter()
            .filter(|id| !self.extracted.contains(*id))
            .cloned()
            .collect()
    }

    /// Bump the global error counter.
    pub fn increment_errors(&mut self) {
        self.stats.errors += 1;
    }

    /// Record the session start time if this is the first session.
    pub fn start_session(&mut self) {
        if self.stats.start_time.is_none() {
            self.stats.start_time = Some(Timestamp::now().to_rfc3339());
        }
    }

    /// Run statistics.
    #[must_use]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Whether a count-based save is due (every `checkpoint_interval`
    /// items).
    #[must_use]
    pub fn should_save(&self, count: u64) -> bool {
        self.checkpoint_interval > 0 && count > 0 && count % self.checkpoint_interval == 0
    }

    /// Save if the auto-save interval has elapsed. Returns whether a save
    /// ran.
    pub fn auto_save_if_needed(&mut self) -> bool {
        if self.last_auto_save.elapsed() >= self.auto_save_interval {
            return self.save();
        }
        false
    }

    /// Point-in-time progress summary.
    #[must_use]
    pub fn progress_summary(&self) -> ProgressSummary {
        let pending = self.pending_ids().len();
        ProgressSummary {
            prefixes_completed: self.completed_prefixes.len(),
            combinations_completed: self.completed_combinations.len(),
            total_discovered: self.discovered.len(),
            total_extracted: self.extracted.len(),
            pending_extraction: pending,
            failed_extraction: self.failed.len(),
            abandoned_units: self.abandoned.len(),
            errors: self.stats.errors,
            current_prefix: self.current_prefix.clone(),
            current_page: self.current_page,
            current_combination: self.current_combination.clone(),
            discovery_started_at: self.discovery_started_at.clone(),
            discovery_last_updated: self.discovery_last_updated.clone(),
        }
    }

    /// Export the discovered IDs to a plain-text file, one per line, sorted.
    pub fn export_reg_ids(&self, output: &Path) -> Result<()> {
        let mut contents = String::new();
        for id in &self.discovered {
            contents.push_str(id);
            contents.push('\n');
        }
        fs::write(output, contents).map_err(|e| CheckpointError::io(output, e))?;
        tracing::info!(
            count = self.discovered.len(),
            file = %output.display(),
            "exported discovered IDs"
        );
        Ok(())
    }

    /// Destroy all progress: clear in-memory state and delete the persisted
    /// files. Operator-initiated only.
    pub fn reset(&mut self) -> Result<()> {
        self.discovered.clear();
        self.completed_prefixes.clear();
        self.completed_combinations.clear();
        self.extracted.clear();
        self.failed.clear();
        self.abandoned.clear();
        self.current_prefix = None;
        self.current_page = 0;
        self.current_combination = None;
        self.discovery_started_at = None;
        self.discovery_last_updated = None;
        self.stats = RunStats::default();

        for path in [
            &self.checkpoint_file,
            &self.discovered_ids_file,
            &self.legacy_ids_file,
        ] {
            if path.exists() {
                fs::remove_file(path).map_err(|e| CheckpointError::io(path, e))?;
                tracing::info!(file = %path.display(), "deleted");
            }
        }
        if self.journal.path().exists() {
            self.journal.reset()?;
        }

        tracing::info!("checkpoint data reset");
        Ok(())
    }
}

/// Write `contents` to a temporary sibling of `path`, then rename it over
/// `path`. The rename is atomic on the same filesystem, so readers observe
/// either the old file or the new one, never a truncated write.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).map_err(|e| CheckpointError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| CheckpointError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regscout_core::PathsConfig;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> CheckpointStore {
        CheckpointStore::open(
            "test",
            &PathsConfig::rooted_at(tmp.path()),
            &SearchConfig::default(),
        )
        .expect("open store")
    }

    #[test]
    fn test_record_discovery_dedups() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store(&tmp);

        assert!(store.record_discovery("MED0000000001"));
        assert!(!store.record_discovery("MED0000000001"));
        assert_eq!(store.discovered_count(), 1);
        assert_eq!(store.stats().total_discovered, 1);
    }

    #[test]
    fn test_discovery_hits_journal_before_snapshot() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store(&tmp);

        store.record_discovery("MED0000000001");

        // No snapshot has been saved, but the journal already has the ID
        let journal_path = tmp.path().join("discovery/discovered_ids.raw.txt");
        let contents = fs::read_to_string(journal_path).expect("read journal");
        assert_eq!(contents.trim(), "MED0000000001");
        assert!(!tmp.path().join("discovery/discovered_ids.json").exists());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let tmp = TempDir::new().expect("create temp dir");
        {
            let mut store = store(&tmp);
            store.record_discovery("MED0000000001");
            store.record_discovery("NMW0000000002");
            store.mark_prefix_completed("A");
            store.mark_combination_completed("Nurse|Victoria|A");
            store.mark_extracted("MED0000000001");
            store.mark_failed("NMW0000000002");
            store.increment_errors();
            assert!(store.save());
        }

        let mut reloaded = store(&tmp);
        assert!(reloaded.load().expect("load"));
        assert_eq!(reloaded.discovered_count(), 2);
        assert!(reloaded.is_prefix_completed("A"));
        assert!(reloaded.is_combination_completed("Nurse|Victoria|A"));
        assert!(reloaded.is_extracted("MED0000000001"));
        assert_eq!(reloaded.failed_ids(), vec!["NMW0000000002"]);
        assert_eq!(reloaded.stats().errors, 1);
        assert_eq!(reloaded.pending_ids(), vec!["NMW0000000002"]);
    }

    #[test]
    fn test_load_empty_store_reports_no_state() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store(&tmp);
        assert!(!store.load().expect("load"));
    }

    #[test]
    fn test_snapshot_format_exact_keys() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store(&tmp);
        store.record_discovery("MED0000000001");
        store.mark_prefix_completed("A");
        assert!(store.save());

        let snapshot: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(tmp.path().join("checkpoints/test_checkpoint.json"))
                .expect("read snapshot"),
        )
        .expect("parse snapshot");
        for key in [
            "completed_prefixes",
            "completed_combinations",
            "extracted_reg_ids",
            "failed_reg_ids",
            "current_prefix",
            "current_page",
            "current_combination",
            "stats",
        ] {
            assert!(snapshot.get(key).is_some(), "missing key {key}");
        }
        let stats = &snapshot["stats"];
        for key in [
            "total_discovered",
            "total_extracted",
            "errors",
            "start_time",
            "last_save_time",
        ] {
            assert!(stats.get(key).is_some(), "missing stats key {key}");
        }

        let ids: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(tmp.path().join("discovery/discovered_ids.json"))
                .expect("read ids file"),
        )
        .expect("parse ids file");
        for key in ["started_at", "last_updated", "total_count", "reg_ids"] {
            assert!(ids.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(ids["total_count"], 1);
    }

    #[test]
    fn test_legacy_flat_file_migration() {
        let tmp = TempDir::new().expect("create temp dir");
        let discovery_dir = tmp.path().join("discovery");
        fs::create_dir_all(&discovery_dir).expect("create dir");
        fs::write(
            discovery_dir.join("reg_ids.txt"),
            "MED0000000001\nMED0000000002\n\n",
        )
        .expect("write legacy file");

        let mut store = store(&tmp);
        assert!(store.load().expect("load"));
        assert_eq!(store.discovered_count(), 2);
        // Migration wrote the structured file
        assert!(discovery_dir.join("discovered_ids.json").exists());
    }

    #[test]
    fn test_mark_extracted_clears_failed() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store(&tmp);
        store.record_discovery("MED0000000001");
        store.mark_failed("MED0000000001");
        store.mark_extracted("MED0000000001");
        assert!(store.failed_ids().is_empty());
        assert!(store.is_extracted("MED0000000001"));
    }

    #[test]
    fn test_should_save_interval() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = store(&tmp);
        assert!(!store.should_save(0));
        assert!(!store.should_save(49));
        assert!(store.should_save(50));
        assert!(store.should_save(100));
    }

    #[test]
    fn test_reset_deletes_files() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut initial = store(&tmp);
        initial.record_discovery("MED0000000001");
        initial.mark_prefix_completed("A");
        assert!(initial.save());

        initial.reset().expect("reset");
        assert_eq!(initial.discovered_count(), 0);
        assert!(!tmp.path().join("checkpoints/test_checkpoint.json").exists());
        assert!(!tmp.path().join("discovery/discovered_ids.json").exists());

        // A fresh load finds nothing
        let mut reloaded = store(&tmp);
        assert!(!reloaded.load().expect("load"));
    }

    #[test]
    fn test_progress_summary() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut store = store(&tmp);
        store.record_discovery("MED0000000001");
        store.record_discovery("MED0000000002");
        store.mark_extracted("MED0000000001");
        store.mark_prefix_completed("A");
        store.record_abandoned("B");

        let summary = store.progress_summary();
        assert_eq!(summary.total_discovered, 2);
        assert_eq!(summary.total_extracted, 1);
        assert_eq!(summary.pending_extraction, 1);
        assert_eq!(summary.prefixes_completed, 1);
        assert_eq!(summary.abandoned_units, 1);
    }
}
