//! HTTP implementation of the discovery-stage query driver.

use crate::error::Result;
use crate::http::HttpRegistryClient;
use crate::traits::QueryDriver;
use once_cell::sync::Lazy;
use regscout_core::RegId;
use regscout_frontier::SearchUnit;
use scraper::{Html, Selector};

static RESULT_ROW: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".search-results-table-row[data-practitioner-row-id]")
        .expect("valid selector")
});

static NO_RESULTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".no-results-message").expect("valid selector"));

/// Query driver that submits the registry search form over plain HTTP and
/// reads result rows out of the returned markup.
///
/// Each form POST returns one page of results; the registry's "load more"
/// pagination is a browser behaviour, so `has_next_page` is always false
/// here and deeper coverage comes from prefix expansion. A browser-driven
/// [`QueryDriver`] can replace this one without touching the engines.
pub struct HttpQueryDriver {
    client: HttpRegistryClient,
    current_ids: Vec<RegId>,
}

impl HttpQueryDriver {
    /// Wrap a registry client.
    #[must_use]
    pub fn new(client: HttpRegistryClient) -> Self {
        Self {
            client,
            current_ids: Vec::new(),
        }
    }
}

/// Pull registration IDs out of a results page, in row order.
///
/// IDs ride on the rows' `data-practitioner-row-id` attribute; rows whose
/// attribute doesn't parse as a registration ID are skipped.
#[must_use]
pub fn extract_row_ids(html: &str) -> Vec<RegId> {
    let document = Html::parse_document(html);

    if document.select(&NO_RESULTS).next().is_some() {
        return Vec::new();
    }

    document
        .select(&RESULT_ROW)
        .filter_map(|row| row.value().attr("data-practitioner-row-id"))
        .filter_map(|raw| match RegId::new(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::debug!(raw, "skipping malformed row ID");
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl QueryDriver for HttpQueryDriver {
    async fn search(&mut self, unit: &SearchUnit) -> Result<usize> {
        let html = self.client.search_form(unit).await?;
        self.current_ids = extract_row_ids(&html);
        tracing::debug!(unit = %unit, results = self.current_ids.len(), "search complete");
        Ok(self.current_ids.len())
    }

    async fn page_ids(&mut self) -> Result<Vec<RegId>> {
        Ok(self.current_ids.clone())
    }

    async fn has_next_page(&mut self) -> Result<bool> {
        Ok(false)
    }

    async fn advance_page(&mut self) -> Result<bool> {
        Ok(false)
    }

    async fn refresh_session(&mut self) -> Result<()> {
        self.client.refresh_session().await
    }
}
