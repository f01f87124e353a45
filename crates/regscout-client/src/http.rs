//! Session-aware HTTP client for the registry.
//!
//! The registry's WAF profiles requests, so the client behaves like a
//! browser: it initialises cookies with a GET to the search page before the
//! first POST, carries the Sec-Fetch header family (upgrading
//! `Sec-Fetch-Site` from `none` to `same-origin` once the session exists),
//! rotates its user agent periodically, and surfaces responses matching
//! known block signatures as [`ClientError::Blocked`].

use crate::error::{BlockKind, ClientError, Result};
use crate::traits::DetailFetcher;
use rand::Rng;
use regscout_core::directory::state_abbreviation;
use regscout_core::{ClientConfig, RegId};
use regscout_frontier::SearchUnit;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use std::time::Duration;

/// Detail pages shorter than this are block pages, not records.
const MIN_DETAIL_BODY_BYTES: usize = 500;

/// HTTP client holding one registry session.
pub struct HttpRegistryClient {
    http: reqwest::Client,
    config: ClientConfig,
    request_count: u32,
    ua_index: usize,
    session_ready: bool,
}

impl HttpRegistryClient {
    /// Build a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-AU,en;q=0.9,en-US;q=0.8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
        headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
        headers.insert(
            "Upgrade-Insecure-Requests",
            HeaderValue::from_static("1"),
        );

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            config,
            request_count: 0,
            ua_index: 0,
            session_ready: false,
        })
    }

    /// Initialise session cookies by visiting the search page, like a
    /// browser landing there before submitting the form.
    async fn ensure_session(&mut self) -> Result<()> {
        if self.session_ready {
            return Ok(());
        }

        tracing::debug!(url = %self.config.search_url, "initializing session cookies");
        let response = self
            .http
            .get(&self.config.search_url)
            .header("User-Agent", self.user_agent())
            .header("Sec-Fetch-Site", "none")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
            });
        }

        self.session_ready = true;
        tracing::debug!("session initialized");
        Ok(())
    }

    /// Discard the session marker so the next request re-initialises
    /// cookies. Called after a long cooldown.
    pub async fn refresh_session(&mut self) -> Result<()> {
        self.session_ready = false;
        self.ensure_session().await
    }

    /// Current user agent, rotated every `ua_rotation_interval` requests.
    fn user_agent(&mut self) -> String {
        self.request_count += 1;
        let interval = self.config.ua_rotation_interval;
        if interval > 0 && self.request_count % interval == 0 && self.config.user_agents.len() > 1 {
            self.ua_index = rand::thread_rng().gen_range(0..self.config.user_agents.len());
            tracing::debug!(index = self.ua_index, "rotated user agent");
        }
        self.config
            .user_agents
            .get(self.ua_index)
            .cloned()
            .unwrap_or_default()
    }

    /// POST the registry search form and return the response body.
    async fn post_form(&mut self, form: &[(&str, &str)]) -> Result<String> {
        self.ensure_session().await?;

        let response = self
            .http
            .post(&self.config.search_url)
            .header("User-Agent", self.user_agent())
            .header("Origin", self.config.base_url.as_str())
            .header("Referer", self.config.search_url.as_str())
            .header("Sec-Fetch-Site", "same-origin")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        if let Some(kind) = detect_block(&html) {
            tracing::warn!(%kind, "response matched block signature");
            return Err(ClientError::Blocked { kind });
        }
        Ok(html)
    }

    /// Submit a search for the unit's prefix and filters. Returns the
    /// results page HTML.
    pub async fn search_form(&mut self, unit: &SearchUnit) -> Result<String> {
        let (profession, state, suburb, prefix) = match unit {
            SearchUnit::Prefix { prefix } => ("", "", "", prefix.as_str()),
            SearchUnit::Combination {
                profession,
                state,
                suburb,
                prefix,
            } => (
                profession.as_str(),
                state_abbreviation(state),
                suburb.as_deref().unwrap_or(""),
                prefix.as_str(),
            ),
        };

        self.post_form(&[
            ("health-profession", profession),
            ("state", state),
            ("suburb", suburb),
            ("postcode", ""),
            ("name-reg", prefix),
            ("practitioner-row-id", ""),
        ])
        .await
    }

    /// Fetch the detail page for a registration ID. `Ok(None)` means the
    /// registry has no page for the ID.
    pub async fn fetch_detail_html(&mut self, reg_id: &str) -> Result<Option<String>> {
        let result = self
            .post_form(&[
                ("health-profession", ""),
                ("state", ""),
                ("suburb", ""),
                ("postcode", ""),
                ("name-reg", ""),
                ("practitioner-row-id", reg_id),
            ])
            .await;

        match result {
            Ok(html) => {
                if html.len() < MIN_DETAIL_BODY_BYTES {
                    tracing::warn!(reg_id, bytes = html.len(), "detail body implausibly short");
                    return Err(ClientError::Blocked {
                        kind: BlockKind::Rejected,
                    });
                }
                tracing::debug!(reg_id, bytes = html.len(), "fetched detail page");
                Ok(Some(html))
            }
            Err(ClientError::HttpStatus { status: 404 }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Match a response body against known defensive-block signatures.
#[must_use]
pub fn detect_block(html: &str) -> Option<BlockKind> {
    let lower = html.to_lowercase();
    if lower.contains("captcha") || lower.contains("recaptcha") {
        return Some(BlockKind::Captcha);
    }
    if lower.contains("too many requests") || lower.contains("rate limit") {
        return Some(BlockKind::RateLimit);
    }
    if lower.contains("access denied") {
        return Some(BlockKind::AccessDenied);
    }
    if lower.contains("request rejected") {
        return Some(BlockKind::Rejected);
    }
    None
}

#[async_trait::async_trait]
impl DetailFetcher for HttpRegistryClient {
    async fn fetch(&mut self, reg_id: &RegId) -> Result<Option<String>> {
        self.fetch_detail_html(reg_id.as_str()).await
    }

    async fn refresh_session(&mut self) -> Result<()> {
        HttpRegistryClient::refresh_session(self).await
    }
}
