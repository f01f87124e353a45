//! Extraction output sinks: dated CSV and append-only JSONL backup.
//!
//! The JSONL backup is written first and flushed per record (it is the
//! durable copy); the CSV is the human-facing export. Both sinks scan
//! whatever already exists on open so a resumed run never writes a record
//! twice.

use crate::error::{EngineError, Result};
use chrono::{Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use regscout_client::PractitionerRecord;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

static REG_ID_IN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{3}\d{10}").expect("valid regex"));

/// Append-only JSONL backup of extracted records, one JSON object per line,
/// flushed per record, with a sidecar metadata file.
#[derive(Debug)]
pub struct JsonlBackup {
    path: PathBuf,
    meta_path: PathBuf,
    file: File,
    known_ids: HashSet<String>,
    started_at: Option<String>,
}

impl JsonlBackup {
    /// Open (creating if absent) the backup under `backup_dir`, scanning
    /// existing lines for already-backed-up IDs.
    pub fn open(backup_dir: &Path) -> Result<Self> {
        fs::create_dir_all(backup_dir).map_err(|e| EngineError::io(backup_dir, e))?;
        let path = backup_dir.join("extracted_backup.jsonl");
        let meta_path = backup_dir.join("extracted_backup.meta.json");

        let mut known_ids = HashSet::new();
        if path.exists() {
            let reader =
                BufReader::new(File::open(&path).map_err(|e| EngineError::io(&path, e))?);
            for line in reader.lines() {
                let line = line.map_err(|e| EngineError::io(&path, e))?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                // Torn trailing lines are possible after a crash; skip them
                let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
                    continue;
                };
                if let Some(reg_id) = value.get("reg_id").and_then(Value::as_str) {
                    known_ids.insert(reg_id.to_string());
                }
            }
            if !known_ids.is_empty() {
                tracing::info!(count = known_ids.len(), "loaded IDs from existing backup");
            }
        }

        let started_at = if meta_path.exists() {
            fs::read_to_string(&meta_path)
                .ok()
                .and_then(|contents| serde_json::from_str::<Value>(&contents).ok())
                .and_then(|meta| {
                    meta.get("started_at")
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                })
        } else {
            None
        };

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| EngineError::io(&path, e))?;

        Ok(Self {
            path,
            meta_path,
            file,
            known_ids,
            started_at,
        })
    }

    /// Whether an ID is already in the backup.
    #[must_use]
    pub fn contains(&self, reg_id: &str) -> bool {
        self.known_ids.contains(reg_id)
    }

    /// IDs currently in the backup.
    #[must_use]
    pub fn known_ids(&self) -> &HashSet<String> {
        &self.known_ids
    }

    /// Append one record, stamped with `extracted_at`, and flush it.
    pub fn append(&mut self, record: &PractitionerRecord) -> Result<()> {
        let mut value = serde_json::to_value(record)?;
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "extracted_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }

        let line = serde_json::to_string(&value)?;
        writeln!(self.file, "{line}").map_err(|e| EngineError::io(&self.path, e))?;
        self.file.flush().map_err(|e| EngineError::io(&self.path, e))?;

        if let Some(reg_id) = &record.reg_id {
            self.known_ids.insert(reg_id.clone());
        }
        Ok(())
    }

    /// Write the sidecar metadata file atomically.
    pub fn save_metadata(&mut self) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        if self.started_at.is_none() {
            self.started_at = Some(now.clone());
        }

        let meta = json!({
            "started_at": self.started_at,
            "last_updated": now,
            "total_extracted": self.known_ids.len(),
        });
        let contents = serde_json::to_vec_pretty(&meta)?;

        let tmp = self.meta_path.with_extension("tmp");
        fs::write(&tmp, contents).map_err(|e| EngineError::io(&tmp, e))?;
        fs::rename(&tmp, &self.meta_path).map_err(|e| EngineError::io(&self.meta_path, e))?;
        Ok(())
    }

    /// Path of the JSONL file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Dated CSV export of extracted records.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    file: File,
    known_ids: HashSet<String>,
}

impl CsvSink {
    /// Open (creating if absent) today's CSV under `extracted_dir`.
    ///
    /// An existing file is scanned for registration IDs so resumed runs
    /// append without duplicating rows; a new file gets the header.
    pub fn open(extracted_dir: &Path) -> Result<Self> {
        fs::create_dir_all(extracted_dir).map_err(|e| EngineError::io(extracted_dir, e))?;
        let date = Local::now().format("%Y-%m-%d");
        let path = extracted_dir.join(format!("practitioners_{date}.csv"));

        let existed = path.exists();
        let mut known_ids = HashSet::new();
        if existed {
            let reader =
                BufReader::new(File::open(&path).map_err(|e| EngineError::io(&path, e))?);
            for line in reader.lines() {
                let line = line.map_err(|e| EngineError::io(&path, e))?;
                if let Some(m) = REG_ID_IN_LINE.find(&line) {
                    known_ids.insert(m.as_str().to_string());
                }
            }
            if !known_ids.is_empty() {
                tracing::info!(count = known_ids.len(), "loaded IDs from existing CSV");
            }
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| EngineError::io(&path, e))?;

        if !existed {
            let header = PractitionerRecord::FIELD_NAMES.join(",");
            writeln!(file, "{header}").map_err(|e| EngineError::io(&path, e))?;
        }

        Ok(Self {
            path,
            file,
            known_ids,
        })
    }

    /// Append one record row (skipping IDs already present) and flush it.
    pub fn write(&mut self, record: &PractitionerRecord) -> Result<()> {
        if let Some(reg_id) = &record.reg_id {
            if self.known_ids.contains(reg_id) {
                tracing::debug!(reg_id = %reg_id, "skipping CSV write, row already exists");
                return Ok(());
            }
        }

        let row = record
            .field_values()
            .iter()
            .map(|v| csv_escape(v.unwrap_or("")))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.file, "{row}").map_err(|e| EngineError::io(&self.path, e))?;
        self.file.flush().map_err(|e| EngineError::io(&self.path, e))?;

        if let Some(reg_id) = &record.reg_id {
            self.known_ids.insert(reg_id.clone());
        }
        Ok(())
    }

    /// Path of the CSV file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
