//! Naukri adapter. Search pages are server-rendered; the search URL is
//! the hyphenated keyword/location path plus an experience band query.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::models::job::Source;

use super::{
    JobScraper, RawJob, ScrapeError, ScrapeParams, css, first_attr, first_text, http_client,
    placeholder_description,
};

const BASE_URL: &str = "https://www.naukri.com";

/// Experience band the site's search URL requires; broad on purpose.
const DEFAULT_EXPERIENCE: &str = "0-3";

static DAYS_AGO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("days regex"));

pub struct NaukriScraper;

#[async_trait]
impl JobScraper for NaukriScraper {
    fn source(&self) -> Source {
        Source::Naukri
    }

    async fn scrape(&self, params: &ScrapeParams) -> Result<Vec<RawJob>, ScrapeError> {
        let client = http_client()?;
        let url = search_url(&params.keywords, &params.location);

        let resp = client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(ScrapeError::Status(resp.status()));
        }
        let body = resp.text().await?;

        let jobs = parse_search_page(&body, params.max_results);
        tracing::info!(count = jobs.len(), "naukri scrape finished");
        Ok(jobs)
    }
}

fn search_url(keywords: &str, location: &str) -> String {
    let keyword_path = hyphenate(keywords);
    let location_path = hyphenate(location);
    if location_path.is_empty() {
        format!("{BASE_URL}/{keyword_path}-jobs?experience={DEFAULT_EXPERIENCE}")
    } else {
        format!("{BASE_URL}/{keyword_path}-jobs-in-{location_path}?experience={DEFAULT_EXPERIENCE}")
    }
}

fn hyphenate(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("-")
}

fn parse_search_page(html: &str, max_results: usize) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let card_selector = css(".srp-jobtuple-wrapper, .jobTuple, article.jobTuple");

    let mut jobs = Vec::new();
    for card in document.select(&card_selector) {
        if jobs.len() >= max_results {
            break;
        }

        let Some(title) = first_text(card, &[".title"]) else {
            continue;
        };
        let Some(company) = first_text(card, &[".companyInfo .subTitle", ".comp-name"]) else {
            continue;
        };

        let location = first_text(card, &[".location .ellipsis", ".locWdth"]);
        let experience_text = first_text(card, &[".experience .ellipsis", ".expwdth"]);
        let salary_text = first_text(card, &[".salary .ellipsis", ".sal-wrap span"]);

        let description = first_text(card, &[".job-description", ".job-desc"])
            .unwrap_or_else(|| placeholder_description(&title, &company));

        let job_id = card
            .value()
            .attr("data-job-id")
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let application_url = first_attr(card, &["a.title", ".title"], "href")
            .or_else(|| {
                job_id
                    .as_deref()
                    .map(|id| format!("{BASE_URL}/job-listings-{id}"))
            })
            .unwrap_or_default();

        let posted_date = first_text(card, &[".footerLeft .fleft.date", ".job-post-day"])
            .as_deref()
            .and_then(parse_relative_date);

        jobs.push(RawJob {
            title,
            company,
            location,
            experience_text,
            salary_text,
            description,
            tech_stack: extract_tags(card),
            application_url,
            source_job_id: job_id.map(|id| format!("naukri_{id}")),
            posted_date,
            ..Default::default()
        });
    }
    jobs
}

/// The card footer shows tags either as list items or a comma-joined
/// blob; take whichever is present.
fn extract_tags(card: ElementRef<'_>) -> Vec<String> {
    let from_items: Vec<String> = card
        .select(&css(".tags li, .tag-li"))
        .map(|li| li.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if !from_items.is_empty() {
        return from_items;
    }

    card.select(&css(".tags"))
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Naukri shows relative posting dates ("Today", "3 Days Ago"),
/// resolved against scrape time.
fn parse_relative_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.to_lowercase();
    let now = Utc::now();

    if text.contains("today") || text.contains("just now") || text.contains("few hours") {
        return Some(now);
    }
    if text.contains("yesterday") {
        return Some(now - Duration::days(1));
    }
    if text.contains("day") {
        let days: i64 = DAYS_AGO_RE.captures(&text)?.get(1)?.as_str().parse().ok()?;
        return Some(now - Duration::days(days));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_FIXTURE: &str = r#"
        <div>
          <article class="jobTuple" data-job-id="210620500042">
            <a class="title" href="https://www.naukri.com/job-listings-data-engineer-210620500042">Data Engineer</a>
            <div class="companyInfo"><span class="subTitle">Infosys</span></div>
            <span class="location"><span class="ellipsis">Bengaluru (Hybrid)</span></span>
            <span class="experience"><span class="ellipsis">2-5 Yrs</span></span>
            <span class="salary"><span class="ellipsis">8-12 Lacs PA</span></span>
            <div class="job-description">Design pipelines with Python and Spark.</div>
            <ul class="tags"><li>Python</li><li>Spark</li><li>SQL</li></ul>
            <div class="footerLeft"><span class="fleft date">3 Days Ago</span></div>
          </article>
          <article class="jobTuple">
            <a class="title">Support Engineer</a>
            <div class="companyInfo"><span class="subTitle">HCL</span></div>
          </article>
        </div>
    "#;

    #[test]
    fn parses_full_card() {
        let jobs = parse_search_page(SEARCH_FIXTURE, 50);
        assert_eq!(jobs.len(), 2);

        let first = &jobs[0];
        assert_eq!(first.title, "Data Engineer");
        assert_eq!(first.company, "Infosys");
        assert_eq!(first.experience_text.as_deref(), Some("2-5 Yrs"));
        assert_eq!(first.salary_text.as_deref(), Some("8-12 Lacs PA"));
        assert_eq!(first.source_job_id.as_deref(), Some("naukri_210620500042"));
        assert_eq!(first.tech_stack, vec!["Python", "Spark", "SQL"]);
        assert!(first.posted_date.is_some());
    }

    #[test]
    fn card_without_id_or_snippet_degrades() {
        let jobs = parse_search_page(SEARCH_FIXTURE, 50);
        let second = &jobs[1];
        assert_eq!(second.source_job_id, None);
        assert!(second.description.contains("Support Engineer"));
        assert!(second.description.contains("HCL"));
        assert!(second.application_url.is_empty());
    }

    #[test]
    fn search_url_shapes() {
        assert_eq!(
            search_url("software engineer", "India"),
            "https://www.naukri.com/software-engineer-jobs-in-India?experience=0-3"
        );
        assert_eq!(
            search_url("devops", ""),
            "https://www.naukri.com/devops-jobs?experience=0-3"
        );
    }

    #[test]
    fn relative_dates_resolve() {
        assert!(parse_relative_date("Today").is_some());
        assert!(parse_relative_date("Just Now").is_some());

        let three_days = parse_relative_date("3 Days Ago").unwrap();
        let delta = Utc::now() - three_days;
        assert_eq!(delta.num_days(), 3);

        assert_eq!(parse_relative_date("30+ Days Ago").map(|_| ()), Some(()));
        assert_eq!(parse_relative_date("recently"), None);
    }
}
