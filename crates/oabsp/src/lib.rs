pub mod config;
pub mod export;
mod parser;
pub mod scraper;
pub mod types;
pub mod utils;

pub use config::ScraperConfig;
pub use parser::{ParseError, parse_chapter_links, parse_contact};
pub use scraper::{CollectEvent, ScraperError, WebScraper};
pub use types::ContactRecord;

pub(crate) const BASE_URL: &str = "https://www.oabsp.org.br";
