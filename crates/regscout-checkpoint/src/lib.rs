//! Durable, crash-safe progress storage for regscout.
//!
//! Discovery is expensive and never re-run once a search unit is marked
//! complete, so losing a discovered ID loses a record permanently. This
//! crate persists progress with two tiers:
//!
//! - a **journal** ([`journal::Journal`]): an append-only file of
//!   discovered IDs, flushed the instant each ID is found, before any
//!   batched write;
//! - a **snapshot** ([`store::CheckpointStore`]): periodic JSON files
//!   (the checkpoint record and the discovered-ID file) written via a
//!   temp-file-and-rename so a torn write can never be observed.
//!
//! On startup the journal is replayed against the snapshot and any IDs the
//! snapshot missed are merged and re-persisted, making crash recovery
//! lossless regardless of when the last snapshot happened.

pub mod error;
pub mod journal;
pub mod store;

pub use error::{CheckpointError, Result};
pub use journal::Journal;
pub use store::{CheckpointStore, ProgressSummary, RunStats};
