use crate::config::ScraperConfig;
use crate::parser::{ParseError, parse_chapter_links, parse_contact};
use crate::types::ContactRecord;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Giving up on {url} after {attempts} attempts (last status {status})")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },
}

/// Progress notifications emitted while walking the chapter pages.
#[derive(Debug)]
pub enum CollectEvent<'a> {
    Started {
        index: usize,
        total: usize,
        url: &'a str,
    },
    Failed {
        url: &'a str,
        error: &'a ScraperError,
    },
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    config: ScraperConfig,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub async fn fetch_chapter_links(&self) -> Result<Vec<String>, ScraperError> {
        let url = self.config.index_url();
        log::info!("Fetching chapter index: {}", url);
        let html = self.get_html(&url).await?;
        let links =
            parse_chapter_links(&html, &self.config.base_url, &self.config.chapter_prefix)?;
        log::info!("Found {} chapter links", links.len());
        Ok(links)
    }

    pub async fn fetch_contact(&self, url: &str) -> Result<ContactRecord, ScraperError> {
        log::info!("Fetching chapter page: {}", url);
        let html = self.get_html(url).await?;
        Ok(parse_contact(&html, url))
    }

    /// Visits every link in order, one at a time, pausing `request_delay`
    /// between pages. A page that fails becomes an error record, so the
    /// output always has exactly one record per link.
    pub async fn collect_contacts<F>(
        &self,
        links: &[String],
        mut on_event: F,
    ) -> Vec<ContactRecord>
    where
        F: FnMut(CollectEvent<'_>),
    {
        let total = links.len();
        let mut records = Vec::with_capacity(total);

        for (i, url) in links.iter().enumerate() {
            on_event(CollectEvent::Started {
                index: i + 1,
                total,
                url: url.as_str(),
            });

            let record = match self.fetch_contact(url).await {
                Ok(record) => {
                    log::debug!("Collected {}", record);
                    record
                }
                Err(error) => {
                    log::warn!("Failed to collect {}: {}", url, error);
                    on_event(CollectEvent::Failed {
                        url: url.as_str(),
                        error: &error,
                    });
                    ContactRecord::failed(url.as_str(), &error)
                }
            };
            records.push(record);

            if i + 1 < total && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
        }

        records
    }

    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        let mut retry = 0;

        loop {
            let error = match self.client.get(url).send().await {
                Ok(response) if self.config.is_retryable(response.status().as_u16()) => {
                    let status = response.status();
                    if retry >= self.config.max_retries {
                        log::error!("Retries exhausted for {}: {}", url, status);
                        return Err(ScraperError::RetriesExhausted {
                            url: url.to_string(),
                            status: status.as_u16(),
                            attempts: retry + 1,
                        });
                    }
                    retry += 1;
                    let delay =
                        retry_after(status, response.headers(), self.config.backoff_max)
                            .unwrap_or_else(|| self.config.backoff_delay(retry));
                    log::warn!(
                        "{} returned {}, retry {}/{} in {:?}",
                        url,
                        status,
                        retry,
                        self.config.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Ok(response) => {
                    return Ok(response
                        .error_for_status()?
                        .text()
                        .await
                        .inspect_err(|e| log::error!("Decode error: {e:?}"))?);
                }
                Err(e) => e,
            };

            if !(error.is_timeout() || error.is_connect()) || retry >= self.config.max_retries {
                log::error!("HTTP error: {error:?}");
                return Err(error.into());
            }
            retry += 1;
            let delay = self.config.backoff_delay(retry);
            log::warn!(
                "{} failed ({}), retry {}/{} in {:?}",
                url,
                error,
                retry,
                self.config.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Server-requested wait, honoured only for 429 and 503 and only in the
/// delta-seconds form.
fn retry_after(status: StatusCode, headers: &HeaderMap, max: Duration) -> Option<Duration> {
    if !matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    ) {
        return None;
    }
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(max))
}
