//! Registry access for regscout: driver traits and their HTTP
//! implementations.
//!
//! The orchestration crates talk to the registry exclusively through the
//! seams in [`traits`] — [`traits::QueryDriver`] for the discovery stage,
//! [`traits::DetailFetcher`] + [`traits::RecordParser`] for extraction —
//! so any transport (plain HTTP, browser automation) can slot in and tests
//! can run against mocks.
//!
//! This crate ships the HTTP implementations: a session-aware
//! [`HttpRegistryClient`] with browser-like request fingerprinting, a
//! form-POST [`HttpQueryDriver`], and the CSS-selector
//! [`DetailPageParser`].

pub mod driver;
pub mod error;
pub mod http;
pub mod parse;
pub mod record;
pub mod traits;

pub use driver::{extract_row_ids, HttpQueryDriver};
pub use error::{BlockKind, ClientError, Result};
pub use http::{detect_block, HttpRegistryClient};
pub use parse::DetailPageParser;
pub use record::PractitionerRecord;
pub use traits::{DetailFetcher, QueryDriver, RecordParser};
