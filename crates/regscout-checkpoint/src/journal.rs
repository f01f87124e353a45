//! The append-only write-ahead journal of discovered IDs.

use crate::error::{CheckpointError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// An append-only, newline-delimited log of discovered IDs.
///
/// Every append is flushed before it returns, so an ID that
/// [`Journal::append`] has acknowledged survives a crash even if the next
/// snapshot never happens. The file is never rewritten in place; recovery
/// replays it line by line.
///
/// The handle is held for the duration of a run and closed on drop.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Open (creating if absent) the journal at `path` for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CheckpointError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| CheckpointError::io(&path, e))?;
        Ok(Self { path, file })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one ID and flush it to disk before returning.
    pub fn append(&mut self, id: &str) -> Result<()> {
        writeln!(self.file, "{id}").map_err(|e| CheckpointError::io(&self.path, e))?;
        self.file
            .flush()
            .map_err(|e| CheckpointError::io(&self.path, e))?;
        Ok(())
    }

    /// Read every ID currently in the journal, in write order.
    ///
    /// Blank lines are skipped; a trailing partial line (torn final write)
    /// is returned as-is and left for the caller's dedup to reject.
    pub fn replay(&self) -> Result<Vec<String>> {
        let file = File::open(&self.path).map_err(|e| CheckpointError::io(&self.path, e))?;
        let reader = BufReader::new(file);
        let mut ids = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| CheckpointError::io(&self.path, e))?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                ids.push(trimmed.to_string());
            }
        }
        Ok(ids)
    }

    /// Delete the journal contents (operator reset): removes the file and
    /// reopens it empty.
    pub fn reset(&mut self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| CheckpointError::io(&self.path, e))?;
        self.file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| CheckpointError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_replay() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("discovered_ids.raw.txt");

        let mut journal = Journal::open(&path).expect("open journal");
        journal.append("MED0000000001").expect("append");
        journal.append("MED0000000002").expect("append");

        let ids = journal.replay().expect("replay");
        assert_eq!(ids, vec!["MED0000000001", "MED0000000002"]);
    }

    #[test]
    fn test_reopen_appends_not_truncates() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("journal.txt");

        {
            let mut journal = Journal::open(&path).expect("open journal");
            journal.append("NMW0000000001").expect("append");
        }

        let mut journal = Journal::open(&path).expect("reopen journal");
        journal.append("NMW0000000002").expect("append");

        let ids = journal.replay().expect("replay");
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_replay_skips_blank_lines() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("journal.txt");
        fs::write(&path, "MED0000000001\n\n  \nMED0000000002\n").expect("write");

        let journal = Journal::open(&path).expect("open journal");
        let ids = journal.replay().expect("replay");
        assert_eq!(ids, vec!["MED0000000001", "MED0000000002"]);
    }

    #[test]
    fn test_reset_empties_journal() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("journal.txt");

        let mut journal = Journal::open(&path).expect("open journal");
        journal.append("MED0000000001").expect("append");
        journal.reset().expect("reset");

        assert!(journal.replay().expect("replay").is_empty());

        // Still usable after reset
        journal.append("MED0000000002").expect("append");
        assert_eq!(journal.replay().expect("replay").len(), 1);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("nested/dir/journal.txt");
        let journal = Journal::open(&path).expect("open journal");
        assert!(journal.path().exists());
    }
}
