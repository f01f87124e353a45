//! The seams between orchestration and registry access.

use crate::error::Result;
use crate::record::PractitionerRecord;
use regscout_core::RegId;
use regscout_frontier::SearchUnit;

/// Executes search units against the registry and walks their result pages.
///
/// One driver instance is used for a whole discovery run; `search`
/// establishes a result set, `page_ids`/`has_next_page`/`advance_page`
/// walk it. Implementations may be plain HTTP or full browser automation.
#[async_trait::async_trait]
pub trait QueryDriver: Send {
    /// Execute a search for the unit. Returns the result count on the
    /// current (first) page; zero is a legitimate outcome.
    async fn search(&mut self, unit: &SearchUnit) -> Result<usize>;

    /// Registration IDs on the current result page, in page order.
    async fn page_ids(&mut self) -> Result<Vec<RegId>>;

    /// Whether another result page is available.
    async fn has_next_page(&mut self) -> Result<bool>;

    /// Advance to the next result page. Returns `false` when there was
    /// nothing to advance to.
    async fn advance_page(&mut self) -> Result<bool>;

    /// Discard and rebuild session state (cookies, fingerprint). Called
    /// after a long cooldown.
    async fn refresh_session(&mut self) -> Result<()>;
}

/// Fetches the detail page for one discovered ID.
#[async_trait::async_trait]
pub trait DetailFetcher: Send {
    /// Fetch the detail content for a registration ID. `None` means the
    /// registry has no detail page for the ID.
    async fn fetch(&mut self, reg_id: &RegId) -> Result<Option<String>>;

    /// Discard and rebuild session state. Called after a long cooldown.
    async fn refresh_session(&mut self) -> Result<()>;
}

/// Parses detail content into a structured record.
///
/// Parsing is lenient: missing fields stay `None`, and the caller decides
/// whether the populated count clears its completeness threshold.
pub trait RecordParser: Send {
    /// Extract record fields from a detail page.
    fn parse(&self, html: &str) -> PractitionerRecord;
}
