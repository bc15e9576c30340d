// Scraper module: one adapter per listing site, selected via the
// registry rather than inheritance. Adapters own their transient
// resources (HTTP client or browser) for the duration of one call.

pub mod browser;
pub mod glassdoor;
pub mod indeed;
pub mod linkedin;
pub mod naukri;
pub mod unstop;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::{ElementRef, Selector};

use crate::models::job::Source;

pub use glassdoor::GlassdoorScraper;
pub use indeed::IndeedScraper;
pub use linkedin::LinkedinScraper;
pub use naukri::NaukriScraper;
pub use unstop::UnstopScraper;

/// Characters that encodeURIComponent does NOT encode.
/// RFC 3986 unreserved: A-Z a-z 0-9 - _ . ! ~ * ' ( )
const ENCODE_URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Search parameters shared by every adapter.
#[derive(Debug, Clone)]
pub struct ScrapeParams {
    pub keywords: String,
    pub location: String,
    pub max_results: usize,
}

impl Default for ScrapeParams {
    fn default() -> Self {
        Self {
            keywords: "software engineer".to_string(),
            location: "India".to_string(),
            max_results: 50,
        }
    }
}

/// One extracted record, still carrying the site's loosely-typed field
/// text. Consumed once by the normalizer, never persisted.
#[derive(Debug, Clone, Default)]
pub struct RawJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub job_type_text: Option<String>,
    pub experience_text: Option<String>,
    pub salary_text: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub tech_stack: Vec<String>,
    pub application_url: String,
    pub company_logo: Option<String>,
    pub source_job_id: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub applicants: i32,
}

/// Adapter-local failure taxonomy. An `Err` never crosses the
/// orchestrator boundary; it becomes that source's RunSummary entry.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned {0}")]
    Status(reqwest::StatusCode),

    #[error("browser automation failed: {0}")]
    Browser(String),

    #[error("unexpected markup: {0}")]
    Markup(String),
}

/// Capability interface every listing-site adapter implements.
#[async_trait]
pub trait JobScraper: Send + Sync {
    fn source(&self) -> Source;

    /// Fetch and extract up to `max_results` raw records. Network,
    /// timeout and markup failures surface as `Err`; they are fatal
    /// only to this adapter's run.
    async fn scrape(&self, params: &ScrapeParams) -> Result<Vec<RawJob>, ScrapeError>;
}

/// All registered adapters, one per supported source.
pub fn registry() -> Vec<Arc<dyn JobScraper>> {
    vec![
        Arc::new(LinkedinScraper),
        Arc::new(GlassdoorScraper),
        Arc::new(NaukriScraper),
        Arc::new(UnstopScraper),
        Arc::new(IndeedScraper),
    ]
}

pub(crate) fn urlencoded(s: &str) -> String {
    utf8_percent_encode(s, ENCODE_URI_COMPONENT_SET).to_string()
}

pub(crate) fn http_client() -> Result<reqwest::Client, ScrapeError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ScrapeError::Http)
}

/// Selectors in this module are compile-time constants; failing to
/// parse one is a programmer error, not a runtime condition.
pub(crate) fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid CSS selector")
}

/// First non-empty text content among the candidate selectors.
pub(crate) fn first_text(card: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|c| {
        card.select(&css(c))
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// First non-empty attribute value among the candidate selectors.
pub(crate) fn first_attr(card: ElementRef<'_>, candidates: &[&str], attr: &str) -> Option<String> {
    candidates.iter().find_map(|c| {
        card.select(&css(c))
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// A record with no usable snippet still needs a non-empty description;
/// an empty one would be rejected downstream.
pub(crate) fn placeholder_description(title: &str, company: &str) -> String {
    format!(
        "{title} position at {company}. Visit the application link for complete job details, requirements, and benefits."
    )
}

/// Tolerant timestamp parsing for the formats the sites actually emit.
pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_matches_encode_uri_component() {
        assert_eq!(urlencoded("software engineer"), "software%20engineer");
        assert_eq!(urlencoded("c++ & rust"), "c%2B%2B%20%26%20rust");
        assert_eq!(urlencoded("plain-text_1.0!"), "plain-text_1.0!");
    }

    #[test]
    fn datetime_formats() {
        assert!(parse_datetime("2025-06-01T10:30:00Z").is_some());
        assert!(parse_datetime("2025-06-01T10:30:00.000+05:30").is_some());
        assert!(parse_datetime("2025-06-01 10:30:00").is_some());
        assert_eq!(
            parse_datetime("2025-06-01").map(|d| d.to_rfc3339()),
            Some("2025-06-01T00:00:00+00:00".to_string())
        );
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn registry_covers_every_source() {
        let sources: Vec<Source> = registry().iter().map(|s| s.source()).collect();
        for expected in [
            Source::Linkedin,
            Source::Glassdoor,
            Source::Naukri,
            Source::Unstop,
            Source::Indeed,
        ] {
            assert!(sources.contains(&expected));
        }
        assert_eq!(sources.len(), 5);
    }
}
