//! The extraction stage: fetch and parse detail pages for discovered IDs.

use crate::error::Result;
use crate::export::{CsvSink, JsonlBackup};
use regscout_checkpoint::CheckpointStore;
use regscout_client::{ClientError, DetailFetcher, PractitionerRecord, RecordParser};
use regscout_core::{RegId, SearchConfig};
use regscout_throttle::ThrottleController;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What an extraction run produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionOutcome {
    /// Records extracted and exported this run.
    pub extracted: u64,
    /// IDs whose extraction failed this run (left pending for retry).
    pub failed: u64,
    /// IDs skipped because they were already extracted or backed up.
    pub skipped: u64,
}

impl ExtractionOutcome {
    /// Whether the run finished with no outstanding failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Drives an extraction run over the pending (discovered minus extracted)
/// IDs: one throttled detail fetch at a time, each successful record
/// written to the JSONL backup first and the CSV second, each soft failure
/// kept pending for a future run.
pub struct ExtractionEngine<'a, F: DetailFetcher, P: RecordParser> {
    fetcher: F,
    parser: P,
    throttle: ThrottleController,
    config: SearchConfig,
    checkpoint: &'a mut CheckpointStore,
    backup: JsonlBackup,
    csv: CsvSink,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a, F: DetailFetcher, P: RecordParser> ExtractionEngine<'a, F, P> {
    /// Create an extraction engine writing to the given sinks.
    pub fn new(
        fetcher: F,
        parser: P,
        throttle: ThrottleController,
        config: SearchConfig,
        checkpoint: &'a mut CheckpointStore,
        backup: JsonlBackup,
        csv: CsvSink,
    ) -> Self {
        Self {
            fetcher,
            parser,
            throttle,
            config,
            checkpoint,
            backup,
            csv,
            interrupt: None,
        }
    }

    /// Attach an interrupt flag; when it goes high the run stops at the
    /// next ID boundary and saves.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Run extraction over the pending set (or the failed set when
    /// `retry_failed`), optionally limited to the first `limit` IDs.
    pub async fn run(
        &mut self,
        resume: bool,
        limit: Option<usize>,
        retry_failed: bool,
    ) -> Result<ExtractionOutcome> {
        if resume {
            self.checkpoint.load()?;
        }
        self.checkpoint.start_session();
        self.reconcile_backup();

        let mut pending = if retry_failed {
            let failed = self.checkpoint.take_failed_ids();
            if failed.is_empty() {
                tracing::warn!("no failed IDs to retry");
                return Ok(ExtractionOutcome::default());
            }
            tracing::info!(count = failed.len(), "retrying previously failed IDs");
            failed
        } else {
            self.checkpoint.pending_ids()
        };

        if pending.is_empty() {
            tracing::warn!("no pending IDs to extract; run discovery first");
            return Ok(ExtractionOutcome::default());
        }
        if let Some(limit) = limit {
            if pending.len() > limit {
                pending.truncate(limit);
                tracing::info!(limit, "limited extraction batch");
            }
        }
        tracing::info!(pending = pending.len(), "starting extraction");

        let mut outcome = ExtractionOutcome::default();
        let total = pending.len();

        for (index, id) in pending.iter().enumerate() {
            if self.interrupted() {
                tracing::warn!("interrupt requested, stopping extraction");
                break;
            }
            if self.checkpoint.is_extracted(id) || self.backup.contains(id) {
                outcome.skipped += 1;
                continue;
            }

            tracing::info!(reg_id = %id, position = index + 1, total, "extracting");

            self.throttle.before_request().await;
            match self.extract_one(id).await {
                Ok(Some(record)) => {
                    self.throttle.report(true);

                    // Backup first: the JSONL line is the durable copy
                    self.backup.append(&record)?;
                    self.csv.write(&record)?;
                    self.checkpoint.mark_extracted(id);
                    outcome.extracted += 1;

                    if self.checkpoint.should_save(outcome.extracted) {
                        self.checkpoint.save();
                        self.backup.save_metadata()?;
                    }
                }
                Ok(None) => {
                    // Soft failure: not blocked, just nothing usable. The
                    // ID stays pending and will be retried on a later run.
                    self.record_failure(id, &mut outcome);
                    self.serve_cooldown().await;
                }
                Err(e) => {
                    tracing::error!(reg_id = %id, error = %e, "extraction failed");
                    self.record_failure(id, &mut outcome);
                    self.serve_cooldown().await;
                }
            }

            self.checkpoint.auto_save_if_needed();
        }

        self.checkpoint.save();
        self.backup.save_metadata()?;
        tracing::info!(
            extracted = outcome.extracted,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "extraction run finished"
        );
        Ok(outcome)
    }

    fn record_failure(&mut self, id: &str, outcome: &mut ExtractionOutcome) {
        self.checkpoint.mark_failed(id);
        self.checkpoint.increment_errors();
        outcome.failed += 1;
    }

    async fn serve_cooldown(&mut self) {
        if let Some(cooldown) = self.throttle.report(false) {
            self.checkpoint.save();
            if cooldown.requires_session_refresh() {
                if let Err(e) = self.fetcher.refresh_session().await {
                    tracing::error!(error = %e, "session refresh failed");
                }
            }
            tracing::warn!(secs = cooldown.duration().as_secs(), "serving cooldown");
            tokio::time::sleep(cooldown.duration()).await;
        }
    }

    /// Fetch and parse one ID. `Ok(None)` is a soft failure: no detail
    /// page, or a record with too few populated fields to count as parsed.
    async fn extract_one(
        &mut self,
        id: &str,
    ) -> std::result::Result<Option<PractitionerRecord>, ClientError> {
        let Ok(reg_id) = RegId::new(id) else {
            tracing::warn!(reg_id = id, "malformed ID in pending set");
            return Ok(None);
        };

        let Some(html) = self.fetch_with_transient_retry(&reg_id).await? else {
            tracing::warn!(reg_id = %reg_id, "no detail page for ID");
            return Ok(None);
        };

        let mut record = self.parser.parse(&html);
        if record.reg_id.is_none() {
            record.reg_id = Some(reg_id.as_str().to_string());
        }

        let populated = record.populated_fields();
        if populated >= self.config.min_populated_fields {
            Ok(Some(record))
        } else {
            tracing::warn!(
                reg_id = %reg_id,
                populated,
                required = self.config.min_populated_fields,
                "incomplete record"
            );
            Ok(None)
        }
    }

    async fn fetch_with_transient_retry(
        &mut self,
        reg_id: &RegId,
    ) -> std::result::Result<Option<String>, ClientError> {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(reg_id).await {
                Ok(html) => return Ok(html),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        reg_id = %reg_id,
                        attempt,
                        error = %e,
                        "transient error, retrying in place"
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Reconcile IDs present in the JSONL backup but missing from the
    /// checkpoint's extracted set (the process died between the backup
    /// flush and the snapshot).
    fn reconcile_backup(&mut self) {
        let missing: Vec<String> = self
            .backup
            .known_ids()
            .iter()
            .filter(|id| !self.checkpoint.is_extracted(id))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }
        for id in &missing {
            self.checkpoint.mark_extracted(id);
        }
        tracing::info!(
            recovered = missing.len(),
            "reconciled backup IDs into checkpoint"
        );
        self.checkpoint.save();
    }

    /// Path of the CSV output file.
    #[must_use]
    pub fn csv_path(&self) -> &std::path::Path {
        self.csv.path()
    }
}
