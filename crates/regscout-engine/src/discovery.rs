//! The discovery stage: drain the search frontier, record discovered IDs.

use crate::error::Result;
use regscout_checkpoint::CheckpointStore;
use regscout_client::{ClientError, QueryDriver};
use regscout_core::SearchConfig;
use regscout_frontier::{Frontier, SearchMode, SearchStrategy, SearchUnit};
use regscout_throttle::ThrottleController;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a discovery run produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOutcome {
    /// IDs discovered for the first time this run.
    pub new_discoveries: u64,
    /// Units completed this run (including abandoned ones).
    pub units_completed: u64,
    /// Units abandoned after exhausting retries this run.
    pub units_abandoned: u64,
    /// Errors observed this run.
    pub errors: u64,
}

impl DiscoveryOutcome {
    /// Whether the run finished without giving up on any unit.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.units_abandoned == 0
    }
}

/// Drives a discovery run: dequeues search units, invokes the driver,
/// feeds results back into the strategy, and records discoveries in the
/// checkpoint, consulting the throttle controller around every network
/// operation.
///
/// Per-unit state machine: a dequeued unit either completes (search
/// succeeded and the strategy spawned nothing), expands (children pushed to
/// the frontier head, the parent subsumed), is re-enqueued at the tail for
/// retry, or — after `max_retries` failures — is abandoned: force-marked
/// complete to keep the frontier live, with the loss recorded separately.
pub struct DiscoveryEngine<'a, D: QueryDriver> {
    driver: D,
    strategy: SearchStrategy,
    throttle: ThrottleController,
    config: SearchConfig,
    checkpoint: &'a mut CheckpointStore,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'a, D: QueryDriver> DiscoveryEngine<'a, D> {
    /// Create a discovery engine.
    pub fn new(
        driver: D,
        strategy: SearchStrategy,
        throttle: ThrottleController,
        config: SearchConfig,
        checkpoint: &'a mut CheckpointStore,
    ) -> Self {
        Self {
            driver,
            strategy,
            throttle,
            config,
            checkpoint,
            interrupt: None,
        }
    }

    /// Attach an interrupt flag; when it goes high the run stops at the
    /// next unit boundary and saves.
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

    fn is_unit_completed(&self, unit: &SearchUnit) -> bool {
        match unit.mode() {
            SearchMode::Prefix => self.checkpoint.is_prefix_completed(&unit.key()),
            SearchMode::Combination => self.checkpoint.is_combination_completed(&unit.key()),
        }
    }

    fn mark_unit_completed(&mut self, unit: &SearchUnit) {
        match unit.mode() {
            SearchMode::Prefix => self.checkpoint.mark_prefix_completed(&unit.key()),
            SearchMode::Combination => self.checkpoint.mark_combination_completed(&unit.key()),
        }
    }

    fn set_current_unit(&mut self, unit: &SearchUnit) {
        match unit.mode() {
            SearchMode::Prefix => self.checkpoint.set_current_prefix(unit.prefix_str(), 0),
            SearchMode::Combination => self.checkpoint.set_current_combination(&unit.key()),
        }
    }

    /// Run discovery to frontier exhaustion (or interrupt).
    pub async fn run(&mut self, resume: bool) -> Result<DiscoveryOutcome> {
        if resume {
            self.checkpoint.load()?;
        }
        self.checkpoint.start_session();

        let mode = self.strategy.mode();
        let completed = match mode {
            SearchMode::Prefix => self.checkpoint.completed_prefixes().clone(),
            SearchMode::Combination => self.checkpoint.completed_combinations().clone(),
        };
        let resume_key = if resume {
            match mode {
                SearchMode::Prefix => self.checkpoint.current_prefix().map(ToString::to_string),
                SearchMode::Combination => {
                    self.checkpoint.current_combination().map(ToString::to_string)
                }
            }
        } else {
            None
        };

        let mut frontier = Frontier::build(&self.strategy, &completed, resume_key.as_deref());

        let discovered_before = self.checkpoint.discovered_count() as u64;
        let errors_before = self.checkpoint.stats().errors;
        let mut outcome = DiscoveryOutcome::default();
        let mut retry_counts: HashMap<String, u32> = HashMap::new();
        let mut collected_since_save: u64 = 0;

        while let Some(unit) = frontier.pop() {
            if self.interrupted() {
                tracing::warn!("interrupt requested, stopping discovery");
                break;
            }

            let key = unit.key();
            // Stale queue entries can linger after expansion or reload
            if self.is_unit_completed(&unit) {
                continue;
            }

            tracing::info!(unit = %key, queued = frontier.len(), "searching unit");
            self.set_current_unit(&unit);

            match self.search_unit(&unit, &mut collected_since_save).await {
                Ok(result_count) => {
                    self.throttle.report(true);

                    let completed_now = match mode {
                        SearchMode::Prefix => self.checkpoint.completed_prefixes(),
                        SearchMode::Combination => self.checkpoint.completed_combinations(),
                    };
                    let children = self.strategy.on_result(&unit, result_count, completed_now);

                    if children.is_empty() {
                        self.mark_unit_completed(&unit);
                        outcome.units_completed += 1;
                    } else {
                        // The parent's coverage is subsumed by its children
                        frontier.push_children(children);
                    }

                    // Combination units are expensive to redo; snapshot
                    // after every one. Prefix units tolerate a coarser
                    // count/time cadence.
                    match mode {
                        SearchMode::Combination => {
                            self.checkpoint.save();
                        }
                        SearchMode::Prefix => {
                            self.checkpoint.auto_save_if_needed();
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(unit = %key, error = %e, "unit search failed");
                    self.checkpoint.increment_errors();
                    self.handle_failure_cooldown(e).await;

                    let attempts = retry_counts.entry(key.clone()).or_insert(0);
                    *attempts += 1;
                    if *attempts < self.config.max_retries {
                        tracing::info!(
                            unit = %key,
                            attempt = *attempts + 1,
                            max = self.config.max_retries,
                            "re-enqueueing unit for retry"
                        );
                        frontier.push_retry(unit);
                    } else {
                        // Liveness over completeness: give the frontier its
                        // slot back, but account for the loss visibly.
                        self.checkpoint.record_abandoned(&key);
                        self.mark_unit_completed(&unit);
                        outcome.units_completed += 1;
                        outcome.units_abandoned += 1;
                        self.checkpoint.save();
                    }
                }
            }
        }

        self.checkpoint.save();

        outcome.new_discoveries =
            self.checkpoint.discovered_count() as u64 - discovered_before;
        outcome.errors = self.checkpoint.stats().errors - errors_before;
        tracing::info!(
            new = outcome.new_discoveries,
            completed = outcome.units_completed,
            abandoned = outcome.units_abandoned,
            "discovery run finished"
        );
        Ok(outcome)
    }

    /// Search one unit and record every ID on every result page.
    ///
    /// Returns the first-page result count (what the strategy's expansion
    /// decision keys on). Transient network errors are retried in place a
    /// fixed number of times with a fixed delay; they touch neither the
    /// frontier nor the checkpoint.
    async fn search_unit(
        &mut self,
        unit: &SearchUnit,
        collected_since_save: &mut u64,
    ) -> std::result::Result<usize, ClientError> {
        let result_count = self.search_with_transient_retry(unit).await?;

        let mut page: u32 = 1;
        loop {
            let ids = self.driver.page_ids().await?;
            let mut new_on_page: u64 = 0;
            for id in &ids {
                if self.checkpoint.record_discovery(id.as_str()) {
                    new_on_page += 1;
                }
            }
            tracing::debug!(unit = %unit, page, collected = new_on_page, "page collected");

            *collected_since_save += new_on_page;
            if *collected_since_save >= self.config.checkpoint_interval {
                self.checkpoint.save();
                *collected_since_save = 0;
            }

            if page >= self.config.pagination_limit || ids.is_empty() {
                break;
            }
            if !self.driver.has_next_page().await? {
                break;
            }

            self.throttle.before_request().await;
            if !self.driver.advance_page().await? {
                break;
            }
            page += 1;
            if unit.mode() == SearchMode::Prefix {
                self.checkpoint.set_current_prefix(unit.prefix_str(), page);
            }
        }

        Ok(result_count)
    }

    async fn search_with_transient_retry(
        &mut self,
        unit: &SearchUnit,
    ) -> std::result::Result<usize, ClientError> {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;
        loop {
            self.throttle.before_request().await;
            match self.driver.search(unit).await {
                Ok(count) => return Ok(count),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        unit = %unit,
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

    /// Report a failed unit to the throttle and serve whatever cooldown it
    /// fires: checkpoint first, refresh the session for the long tier, then
    /// sleep it out.
    async fn handle_failure_cooldown(&mut self, error: ClientError) {
        if error.is_blocked() {
            tracing::warn!(error = %error, "defensive block observed");
        }
        if let Some(cooldown) = self.throttle.report(false) {
            self.checkpoint.save();
            if cooldown.requires_session_refresh() {
                if let Err(e) = self.driver.refresh_session().await {
                    tracing::error!(error = %e, "session refresh failed");
                }
            }
            tracing::warn!(
                secs = cooldown.duration().as_secs(),
                "serving cooldown"
            );
            tokio::time::sleep(cooldown.duration()).await;
        }
    }
}
