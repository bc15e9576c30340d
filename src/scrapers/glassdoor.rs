//! Glassdoor adapter. Listings only appear after client-side rendering,
//! so the page goes through headless Chrome. Cards never expose a
//! snippet, so descriptions are always synthesized.

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use crate::models::job::Source;

use super::{JobScraper, RawJob, ScrapeError, ScrapeParams, browser, css, first_text, urlencoded};

const BASE_URL: &str = "https://www.glassdoor.co.in";

const WAIT_SELECTORS: &[&str] = &[
    "[data-test=\"jobListing\"]",
    ".react-job-listing",
    "li.jl",
    ".job-search-results",
    "article",
];

pub struct GlassdoorScraper;

#[async_trait]
impl JobScraper for GlassdoorScraper {
    fn source(&self) -> Source {
        Source::Glassdoor
    }

    async fn scrape(&self, params: &ScrapeParams) -> Result<Vec<RawJob>, ScrapeError> {
        let url = format!(
            "{BASE_URL}/Job/jobs.htm?sc.keyword={}&locT=N&locId=115&locKeyword={}",
            urlencoded(&params.keywords),
            urlencoded(&params.location),
        );

        let html = browser::fetch_rendered(url, WAIT_SELECTORS).await?;
        let jobs = parse_search_page(&html, params.max_results);
        tracing::info!(count = jobs.len(), "glassdoor scrape finished");
        Ok(jobs)
    }
}

fn parse_search_page(html: &str, max_results: usize) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let card_selector = css("[data-test=\"jobListing\"], .react-job-listing, li.jl, .JobCard");

    let mut jobs = Vec::new();
    for card in document.select(&card_selector) {
        if jobs.len() >= max_results {
            break;
        }

        let Some(title) = first_text(
            card,
            &["[data-test=\"job-title\"]", ".jobTitle", ".job-title", "h2 a"],
        ) else {
            continue;
        };
        let Some(company) = first_text(
            card,
            &[
                "[data-test=\"employer-name\"]",
                ".employerName",
                ".employer-name",
                ".company",
            ],
        ) else {
            continue;
        };

        let location = first_text(
            card,
            &["[data-test=\"emp-location\"]", ".location", ".jobLocation"],
        );
        let salary_text = first_text(
            card,
            &["[data-test=\"detailSalary\"]", ".salary", ".salaryText"],
        );

        let href = job_link(card);
        let job_id = href.as_deref().and_then(listing_id);

        let application_url = match &href {
            Some(h) if h.starts_with("http") => h.clone(),
            Some(h) => format!("{BASE_URL}{h}"),
            None => String::new(),
        };

        let description = format!(
            "{title} position at {company}. Visit the application link for complete job details and requirements."
        );

        jobs.push(RawJob {
            title,
            company,
            location,
            salary_text,
            description,
            application_url,
            source_job_id: job_id.map(|id| format!("glassdoor_{id}")),
            posted_date: Some(chrono::Utc::now()),
            ..Default::default()
        });
    }
    jobs
}

fn job_link(card: ElementRef<'_>) -> Option<String> {
    for candidate in ["[data-test=\"job-link\"]", "a.jobLink", "a.jobTitle", "h2 a"] {
        if let Some(el) = card.select(&css(candidate)).next()
            && let Some(href) = el.value().attr("href").filter(|h| !h.is_empty())
        {
            return Some(href.to_string());
        }
    }
    None
}

/// Listing id from the `jobListingId` query param, else the last path
/// segment of the link.
fn listing_id(href: &str) -> Option<String> {
    if let Some(idx) = href.find("jobListingId=") {
        let rest = &href[idx + "jobListingId=".len()..];
        let end = rest.find('&').unwrap_or(rest.len());
        if !rest[..end].is_empty() {
            return Some(rest[..end].to_string());
        }
    }

    let path = href.split('?').next().unwrap_or(href);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| !segment.contains("http"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_FIXTURE: &str = r#"
        <ul>
          <li data-test="jobListing">
            <a data-test="job-link" href="/partner/jobListing.htm?jobListingId=100876&pos=101">
              <span data-test="job-title">Site Reliability Engineer</span>
            </a>
            <span data-test="employer-name">Razorpay</span>
            <span data-test="emp-location">Bengaluru</span>
            <span data-test="detailSalary">₹20L - ₹35L</span>
          </li>
          <li class="jl">
            <h2><a href="https://www.glassdoor.co.in/job-listing/frontend-dev-JV_IC100876.htm">Frontend Developer</a></h2>
            <span class="employerName">Zerodha</span>
          </li>
        </ul>
    "#;

    #[test]
    fn extracts_listing_with_query_param_id() {
        let jobs = parse_search_page(SEARCH_FIXTURE, 50);
        assert_eq!(jobs.len(), 2);

        let first = &jobs[0];
        assert_eq!(first.title, "Site Reliability Engineer");
        assert_eq!(first.company, "Razorpay");
        assert_eq!(first.source_job_id.as_deref(), Some("glassdoor_100876"));
        assert_eq!(
            first.application_url,
            "https://www.glassdoor.co.in/partner/jobListing.htm?jobListingId=100876&pos=101"
        );
        assert!(first.description.contains("Site Reliability Engineer"));
    }

    #[test]
    fn falls_back_to_last_path_segment() {
        let jobs = parse_search_page(SEARCH_FIXTURE, 50);
        let second = &jobs[1];
        assert_eq!(
            second.source_job_id.as_deref(),
            Some("glassdoor_frontend-dev-JV_IC100876.htm")
        );
        assert!(second.application_url.starts_with("https://"));
    }

    #[test]
    fn listing_id_prefers_query_param() {
        assert_eq!(
            listing_id("/x.htm?jobListingId=42&pos=1").as_deref(),
            Some("42")
        );
        assert_eq!(listing_id("/job/senior-dev-123.htm").as_deref(), Some("senior-dev-123.htm"));
    }
}
