//! LinkedIn adapter. Uses the public guest job-search endpoint, which
//! serves server-rendered cards; a static fetch plus markup parsing is
//! enough, no browser required.

use async_trait::async_trait;
use scraper::Html;

use crate::models::job::Source;

use super::{
    JobScraper, RawJob, ScrapeError, ScrapeParams, css, first_attr, first_text, http_client,
    parse_datetime, placeholder_description, urlencoded,
};

const BASE_URL: &str = "https://www.linkedin.com";

pub struct LinkedinScraper;

#[async_trait]
impl JobScraper for LinkedinScraper {
    fn source(&self) -> Source {
        Source::Linkedin
    }

    async fn scrape(&self, params: &ScrapeParams) -> Result<Vec<RawJob>, ScrapeError> {
        let client = http_client()?;
        let url = format!(
            "{BASE_URL}/jobs-guest/jobs/api/seeMoreJobPostings/search?keywords={}&location={}&start=0",
            urlencoded(&params.keywords),
            urlencoded(&params.location),
        );

        let resp = client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(ScrapeError::Status(resp.status()));
        }
        let body = resp.text().await?;

        let jobs = parse_search_page(&body, params.max_results);
        tracing::info!(count = jobs.len(), "linkedin scrape finished");
        Ok(jobs)
    }
}

fn parse_search_page(html: &str, max_results: usize) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let card_selector = css(".job-search-card");

    let mut jobs = Vec::new();
    for card in document.select(&card_selector) {
        if jobs.len() >= max_results {
            break;
        }

        let Some(title) = first_text(card, &[".base-search-card__title"]) else {
            continue;
        };
        let Some(company) = first_text(card, &[".base-search-card__subtitle"]) else {
            continue;
        };
        let location = first_text(card, &[".job-search-card__location"]);

        // The card's entity URN ends in the numeric posting id.
        let job_id = card
            .value()
            .attr("data-entity-urn")
            .and_then(|urn| urn.rsplit(':').next())
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let description = first_text(card, &[".base-search-card__snippet"])
            .unwrap_or_else(|| placeholder_description(&title, &company));

        let posted_date = first_attr(card, &["time"], "datetime")
            .as_deref()
            .and_then(parse_datetime);

        let (application_url, source_job_id) = match &job_id {
            Some(id) => (
                format!("{BASE_URL}/jobs/view/{id}"),
                Some(format!("linkedin_{id}")),
            ),
            None => (String::new(), None),
        };

        jobs.push(RawJob {
            title,
            company,
            location,
            description,
            application_url,
            source_job_id,
            posted_date,
            ..Default::default()
        });
    }
    jobs
}
