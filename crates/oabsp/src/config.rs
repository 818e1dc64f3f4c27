use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; OAB-SP-scraper/1.0; +https://example.org)";

/// Everything the scraper needs to talk to the directory site.
///
/// Built once and handed to [`crate::WebScraper::with_config`]; tests point
/// `base_url` at a local mock server and shrink the delays to zero.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub index_path: String,
    pub chapter_prefix: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Retries after the first attempt, not total attempts.
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub backoff_max: Duration,
    pub retry_statuses: Vec<u16>,
    /// Pause between two chapter page fetches.
    pub request_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            index_path: "/subsecoes".to_string(),
            chapter_prefix: "/subsecao/".to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(25),
            max_retries: 5,
            backoff_factor: Duration::from_millis(600),
            backoff_max: Duration::from_secs(120),
            retry_statuses: vec![429, 500, 502, 503, 504],
            request_delay: Duration::from_millis(600),
        }
    }
}

impl ScraperConfig {
    pub fn index_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.index_path.trim_start_matches('/')
        )
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Sleep before retry number `retry` (1-based). The first retry goes out
    /// immediately, later ones wait `factor * 2^(retry - 1)`, never above
    /// `backoff_max`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let exp = (retry - 1).min(31);
        self.backoff_factor
            .checked_mul(1u32 << exp)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_index_url() {
        let config = ScraperConfig::default();
        assert_eq!(config.index_url(), "https://www.oabsp.org.br/subsecoes");
    }

    #[test]
    fn test_index_url_with_trailing_slash_base() {
        let config = ScraperConfig {
            base_url: "http://127.0.0.1:1234/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.index_url(), "http://127.0.0.1:1234/subsecoes");
    }

    #[test]
    fn test_first_retry_is_immediate() {
        let config = ScraperConfig::default();
        assert_eq!(config.backoff_delay(0), Duration::ZERO);
        assert_eq!(config.backoff_delay(1), Duration::ZERO);
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let config = ScraperConfig::default();
        assert_eq!(config.backoff_delay(2), Duration::from_millis(1200));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(2400));
        assert_eq!(config.backoff_delay(4), Duration::from_millis(4800));
        assert_eq!(config.backoff_delay(5), Duration::from_millis(9600));
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = ScraperConfig::default();
        assert_eq!(config.backoff_delay(20), Duration::from_secs(120));
        assert_eq!(config.backoff_delay(u32::MAX), Duration::from_secs(120));
    }

    #[test]
    fn test_retryable_statuses() {
        let config = ScraperConfig::default();
        for status in [429, 500, 502, 503, 504] {
            assert!(config.is_retryable(status), "{status} should be retried");
        }
        for status in [200, 301, 400, 403, 404, 501] {
            assert!(!config.is_retryable(status), "{status} should not be retried");
        }
    }
}
