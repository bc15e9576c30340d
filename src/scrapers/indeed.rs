//! Indeed adapter. The results page is rendered client-side, so the
//! document goes through headless Chrome before extraction.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::models::job::Source;

use super::{JobScraper, RawJob, ScrapeError, ScrapeParams, browser, css, first_text, urlencoded};

const BASE_URL: &str = "https://in.indeed.com";

/// Ordered fallback selectors the rendered page is polled for; the
/// card markup changes between rollouts.
const WAIT_SELECTORS: &[&str] = &[".job_seen_beacon", ".jobsearch-ResultsList", ".slider_item"];

pub struct IndeedScraper;

#[async_trait]
impl JobScraper for IndeedScraper {
    fn source(&self) -> Source {
        Source::Indeed
    }

    async fn scrape(&self, params: &ScrapeParams) -> Result<Vec<RawJob>, ScrapeError> {
        let url = format!(
            "{BASE_URL}/jobs?q={}&l={}",
            urlencoded(&params.keywords),
            urlencoded(&params.location),
        );

        let html = browser::fetch_rendered(url, WAIT_SELECTORS).await?;
        let jobs = parse_search_page(&html, params.max_results);
        tracing::info!(count = jobs.len(), "indeed scrape finished");
        Ok(jobs)
    }
}

fn parse_search_page(html: &str, max_results: usize) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let card_selector = css(".job_seen_beacon, .slider_item, div[data-jk]");

    let mut jobs = Vec::new();
    let mut seen = 0usize;
    for card in document.select(&card_selector) {
        if jobs.len() >= max_results {
            break;
        }
        seen += 1;

        let Some(title) = first_text(
            card,
            &[".jobTitle", "h2.jobTitle a", "[data-testid=\"job-title\"]"],
        ) else {
            continue;
        };
        let Some(company) = first_text(
            card,
            &[".companyName", "[data-testid=\"company-name\"]"],
        ) else {
            continue;
        };

        let location = first_text(
            card,
            &[".companyLocation", "[data-testid=\"text-location\"]"],
        );
        let salary_text = first_text(
            card,
            &[
                ".salary-snippet",
                ".metadata.salary-snippet-container",
                "[data-testid=\"attribute_snippet_testid\"]",
            ],
        );

        let description = first_text(card, &[".job-snippet", "[data-testid=\"job-snippet\"]"])
            .unwrap_or_else(|| synthesize_description(&title, &company));

        let job_key = extract_job_key(card);
        let (application_url, source_job_id) = match &job_key {
            Some(key) => (
                format!("{BASE_URL}/viewjob?jk={key}"),
                Some(format!("indeed_{key}")),
            ),
            None => (String::new(), None),
        };

        jobs.push(RawJob {
            title,
            company,
            location,
            salary_text,
            description,
            application_url,
            source_job_id,
            posted_date: Some(chrono::Utc::now()),
            ..Default::default()
        });
    }

    tracing::debug!(cards = seen, extracted = jobs.len(), "indeed cards processed");
    jobs
}

/// The job key moves around: card attribute, nested attribute, anchor
/// id, or a `jk=` query param on the title link.
fn extract_job_key(card: ElementRef<'_>) -> Option<String> {
    if let Some(key) = card.value().attr("data-jk").filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }
    if let Some(el) = card.select(&css("[data-jk]")).next()
        && let Some(key) = el.value().attr("data-jk").filter(|k| !k.is_empty())
    {
        return Some(key.to_string());
    }
    if let Some(el) = card.select(&css("a[id^=\"job_\"]")).next()
        && let Some(id) = el.value().attr("id")
        && let Some(key) = id.strip_prefix("job_").filter(|k| !k.is_empty())
    {
        return Some(key.to_string());
    }
    card.select(&css("h2 a"))
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(job_key_from_href)
}

fn job_key_from_href(href: &str) -> Option<String> {
    let idx = href.find("jk=")?;
    let rest = &href[idx + 3..];
    let end = rest.find('&').unwrap_or(rest.len());
    let key = &rest[..end];
    (!key.is_empty()).then(|| key.to_string())
}

/// Placeholder carrying the seniority hint the title exposes.
fn synthesize_description(title: &str, company: &str) -> String {
    let level = if title.to_lowercase().contains("senior") {
        "senior"
    } else {
        "junior to mid"
    };
    format!(
        "{title} position at {company}. This is a {level} level role. Visit the application link for complete job details, requirements, and benefits."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_FIXTURE: &str = r#"
        <div id="results">
          <div class="job_seen_beacon" data-jk="abc123def">
            <h2 class="jobTitle"><a>Senior Platform Engineer</a></h2>
            <span class="companyName">Flipkart</span>
            <div class="companyLocation">Bengaluru, Karnataka</div>
            <div class="salary-snippet">₹30,00,000 - ₹45,00,000 a year</div>
            <div class="job-snippet">Own the build and deploy platform.</div>
          </div>
          <div class="slider_item">
            <h2 class="jobTitle"><a href="/rc/clk?jk=ffe998&from=serp">QA Analyst</a></h2>
            <span class="companyName">Swiggy</span>
          </div>
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a>Mystery Role</a></h2>
            <span class="companyName">Ghost Corp</span>
          </div>
        </div>
    "#;

    #[test]
    fn extracts_card_with_data_jk() {
        let jobs = parse_search_page(SEARCH_FIXTURE, 50);
        assert_eq!(jobs.len(), 3);

        let first = &jobs[0];
        assert_eq!(first.title, "Senior Platform Engineer");
        assert_eq!(first.company, "Flipkart");
        assert_eq!(first.source_job_id.as_deref(), Some("indeed_abc123def"));
        assert_eq!(
            first.application_url,
            "https://in.indeed.com/viewjob?jk=abc123def"
        );
        assert_eq!(first.description, "Own the build and deploy platform.");
        assert!(first.salary_text.as_deref().unwrap().contains("30,00,000"));
    }

    #[test]
    fn recovers_job_key_from_href() {
        let jobs = parse_search_page(SEARCH_FIXTURE, 50);
        let second = &jobs[1];
        assert_eq!(second.source_job_id.as_deref(), Some("indeed_ffe998"));
    }

    #[test]
    fn no_recoverable_key_means_no_dedup_id() {
        let jobs = parse_search_page(SEARCH_FIXTURE, 50);
        let third = &jobs[2];
        assert_eq!(third.source_job_id, None);
        assert!(third.application_url.is_empty());
    }

    #[test]
    fn synthesized_description_reflects_seniority() {
        assert!(synthesize_description("Senior Rust Engineer", "X").contains("senior level role"));
        assert!(synthesize_description("Rust Engineer", "X").contains("junior to mid level role"));
    }

    #[test]
    fn respects_max_results() {
        assert_eq!(parse_search_page(SEARCH_FIXTURE, 2).len(), 2);
    }
}
