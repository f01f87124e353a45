//! Orchestration engines for regscout.
//!
//! Composes the frontier, checkpoint store and throttle controller into the
//! two stages of a harvest:
//!
//! - [`discovery::DiscoveryEngine`] drains the search frontier, feeding
//!   results back into the strategy and recording IDs as they surface;
//! - [`extraction::ExtractionEngine`] fetches and parses detail pages for
//!   the discovered IDs, exporting records to CSV and a JSONL backup.
//!
//! Both stages are strictly sequential — one outbound request in flight at
//! any time — because the throttle controller reasons about a global
//! request rate.

pub mod discovery;
pub mod error;
pub mod export;
pub mod extraction;

pub use discovery::{DiscoveryEngine, DiscoveryOutcome};
pub use error::{EngineError, Result};
pub use export::{CsvSink, JsonlBackup};
pub use extraction::{ExtractionEngine, ExtractionOutcome};
