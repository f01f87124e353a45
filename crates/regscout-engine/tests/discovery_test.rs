//! Discovery orchestration against a mock query driver.

use regscout_checkpoint::CheckpointStore;
use regscout_client::{ClientError, QueryDriver, Result as ClientResult};
use regscout_core::{PathsConfig, RegId, SearchConfig, ThrottleProfile};
use regscout_engine::DiscoveryEngine;
use regscout_frontier::{AdaptiveStrategy, SearchStrategy, SearchUnit};
use regscout_throttle::ThrottleController;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Mock driver: per-key canned IDs, per-key failure budgets.
#[derive(Default)]
struct MockDriver {
    ids_by_key: HashMap<String, Vec<&'static str>>,
    failures_by_key: HashMap<String, u32>,
    searches: Arc<Mutex<Vec<String>>>,
    session_refreshes: Arc<Mutex<u32>>,
    current: Vec<RegId>,
}

impl MockDriver {
    fn with_ids(mut self, key: &str, ids: &[&'static str]) -> Self {
        self.ids_by_key.insert(key.to_string(), ids.to_vec());
        self
    }

    fn failing(mut self, key: &str, times: u32) -> Self {
        self.failures_by_key.insert(key.to_string(), times);
        self
    }
}

#[async_trait::async_trait]
impl QueryDriver for MockDriver {
    async fn search(&mut self, unit: &SearchUnit) -> ClientResult<usize> {
        let key = unit.key();
        self.searches.lock().expect("lock").push(key.clone());

        if let Some(remaining) = self.failures_by_key.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ClientError::InvalidResponse("mock failure".to_string()));
            }
        }

        let ids = self.ids_by_key.get(&key).cloned().unwrap_or_default();
        self.current = ids
            .into_iter()
            .map(|id| RegId::new(id).expect("valid mock ID"))
            .collect();
        Ok(self.current.len())
    }

    async fn page_ids(&mut self) -> ClientResult<Vec<RegId>> {
        Ok(self.current.clone())
    }

    async fn has_next_page(&mut self) -> ClientResult<bool> {
        Ok(false)
    }

    async fn advance_page(&mut self) -> ClientResult<bool> {
        Ok(false)
    }

    async fn refresh_session(&mut self) -> ClientResult<()> {
        *self.session_refreshes.lock().expect("lock") += 1;
        Ok(())
    }
}

fn instant_throttle() -> ThrottleController {
    ThrottleController::new(ThrottleProfile {
        base_delay_secs: 0.0,
        failure_increment_secs: 0.0,
        jitter_secs: 0.0,
        floor_secs: 0.0,
        short_cooldown_threshold: 3,
        short_cooldown_secs: 0,
        long_cooldown_threshold: 3,
        long_cooldown_secs: 0,
    })
}

fn test_config() -> SearchConfig {
    SearchConfig {
        max_retries: 2,
        retry_delay_secs: 0,
        ..SearchConfig::default()
    }
}

fn open_store(tmp: &TempDir) -> CheckpointStore {
    CheckpointStore::open("test", &PathsConfig::rooted_at(tmp.path()), &test_config())
        .expect("open store")
}

/// Adaptive strategy over a tiny space: expand when results reach 2.
fn tiny_adaptive() -> SearchStrategy {
    SearchStrategy::Adaptive(AdaptiveStrategy::new(2, 2).with_high_volume(&[]))
}

#[tokio::test]
async fn test_discovery_records_ids_and_completes_units() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut store = open_store(&tmp);

    let driver = MockDriver::default().with_ids("C", &["MED0000000001"]);
    let mut engine = DiscoveryEngine::new(
        driver,
        tiny_adaptive(),
        instant_throttle(),
        test_config(),
        &mut store,
    );

    let outcome = engine.run(false).await.expect("run discovery");
    assert_eq!(outcome.new_discoveries, 1);
    assert_eq!(outcome.units_abandoned, 0);
    assert!(outcome.is_clean());

    // Every single-letter unit finished (none hit the expansion threshold)
    assert_eq!(store.completed_prefixes().len(), 26);
    assert!(store.is_discovered("MED0000000001"));
}

#[tokio::test]
async fn test_adaptive_expansion_resolves_children_depth_first() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut store = open_store(&tmp);

    // "A" fills its page (2 results at limit 2) and must expand
    let driver = MockDriver::default()
        .with_ids("A", &["MED0000000001", "MED0000000002"])
        .with_ids("AB", &["MED0000000003"]);
    let searches = Arc::clone(&driver.searches);

    let mut engine = DiscoveryEngine::new(
        driver,
        tiny_adaptive(),
        instant_throttle(),
        test_config(),
        &mut store,
    );
    let outcome = engine.run(false).await.expect("run discovery");
    assert_eq!(outcome.new_discoveries, 3);

    // Children were searched before the sibling "B" (depth-first order)
    let order = searches.lock().expect("lock").clone();
    let pos = |key: &str| order.iter().position(|k| k == key).expect("searched");
    assert!(pos("AA") < pos("B"));
    assert!(pos("AZ") < pos("B"));

    // Children completed; the parent's coverage is subsumed, so it is not
    // separately marked
    assert!(store.is_prefix_completed("AA"));
    assert!(store.is_prefix_completed("AZ"));
    assert!(!store.is_prefix_completed("A"));
}

#[tokio::test]
async fn test_resumed_run_makes_no_new_progress() {
    let tmp = TempDir::new().expect("create temp dir");

    {
        let mut store = open_store(&tmp);
        let driver = MockDriver::default().with_ids("D", &["MED0000000004"]);
        let mut engine = DiscoveryEngine::new(
            driver,
            tiny_adaptive(),
            instant_throttle(),
            test_config(),
            &mut store,
        );
        engine.run(false).await.expect("first run");
    }

    // Second run resumes against the same checkpoint: nothing new
    let mut store = open_store(&tmp);
    let driver = MockDriver::default().with_ids("D", &["MED0000000004"]);
    let searches = Arc::clone(&driver.searches);
    let mut engine = DiscoveryEngine::new(
        driver,
        tiny_adaptive(),
        instant_throttle(),
        test_config(),
        &mut store,
    );
    let outcome = engine.run(true).await.expect("resumed run");

    assert_eq!(outcome.new_discoveries, 0);
    assert_eq!(outcome.units_completed, 0);
    assert!(searches.lock().expect("lock").is_empty(), "no unit re-searched");
}

#[tokio::test]
async fn test_failing_unit_is_retried_then_abandoned() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut store = open_store(&tmp);

    // "B" fails on every attempt; max_retries is 2
    let driver = MockDriver::default().failing("B", u32::MAX);
    let searches = Arc::clone(&driver.searches);

    let mut engine = DiscoveryEngine::new(
        driver,
        tiny_adaptive(),
        instant_throttle(),
        test_config(),
        &mut store,
    );
    let outcome = engine.run(false).await.expect("run discovery");

    // Searched exactly max_retries times, then given up
    let attempts = searches
        .lock()
        .expect("lock")
        .iter()
        .filter(|k| k.as_str() == "B")
        .count();
    assert_eq!(attempts, 2);

    // Abandonment accounting: the unit unblocks the frontier via the
    // completed set, the loss is visible, and the error counter holds
    // exactly one error per failed attempt
    assert!(store.is_prefix_completed("B"));
    assert_eq!(store.abandoned_units(), &["B".to_string()]);
    assert_eq!(outcome.units_abandoned, 1);
    assert!(!outcome.is_clean());
    assert_eq!(store.stats().errors, 2);
}

#[tokio::test]
async fn test_transient_failure_recovers_without_abandonment() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut store = open_store(&tmp);

    // "E" fails once, is re-enqueued at the tail, then succeeds
    let driver = MockDriver::default()
        .failing("E", 1)
        .with_ids("E", &["MED0000000005"]);
    let mut engine = DiscoveryEngine::new(
        driver,
        tiny_adaptive(),
        instant_throttle(),
        test_config(),
        &mut store,
    );
    let outcome = engine.run(false).await.expect("run discovery");

    assert_eq!(outcome.units_abandoned, 0);
    assert!(store.is_prefix_completed("E"));
    assert!(store.is_discovered("MED0000000005"));
    assert_eq!(store.stats().errors, 1);
}

#[tokio::test]
async fn test_long_cooldown_triggers_session_refresh() {
    let tmp = TempDir::new().expect("create temp dir");
    let mut store = open_store(&tmp);

    // Three consecutive unit failures hit the long-cooldown threshold (3);
    // the engine must ask the driver for a fresh session
    let driver = MockDriver::default()
        .failing("A", u32::MAX)
        .failing("B", u32::MAX)
        .failing("C", u32::MAX);
    let refreshes = Arc::clone(&driver.session_refreshes);

    let mut engine = DiscoveryEngine::new(
        driver,
        tiny_adaptive(),
        instant_throttle(),
        test_config(),
        &mut store,
    );
    engine.run(false).await.expect("run discovery");

    assert!(
        *refreshes.lock().expect("lock") >= 1,
        "long cooldown should refresh the session"
    );
}
