//! Unstop adapter. The site exposes a public JSON search API, so this
//! is field traversal over the response rather than markup parsing.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::job::Source;

use super::{JobScraper, RawJob, ScrapeError, ScrapeParams, http_client, parse_datetime};

const BASE_URL: &str = "https://unstop.com";

pub struct UnstopScraper;

#[async_trait]
impl JobScraper for UnstopScraper {
    fn source(&self) -> Source {
        Source::Unstop
    }

    async fn scrape(&self, params: &ScrapeParams) -> Result<Vec<RawJob>, ScrapeError> {
        let client = http_client()?;
        let url = format!("{BASE_URL}/api/public/opportunity/search-result?opportunity=job");

        let resp = client
            .get(&url)
            .header("Accept", "application/json")
            .header("Referer", "https://unstop.com/jobs")
            .header("Origin", "https://unstop.com")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ScrapeError::Status(resp.status()));
        }
        let data: Value = resp.json().await?;

        let jobs = parse_results(&data, params.max_results)?;
        tracing::info!(count = jobs.len(), "unstop scrape finished");
        Ok(jobs)
    }
}

/// The opportunity list nests one level deeper when paginated.
fn parse_results(data: &Value, max_results: usize) -> Result<Vec<RawJob>, ScrapeError> {
    let opportunities = data
        .pointer("/data/data")
        .and_then(Value::as_array)
        .or_else(|| data.get("data").and_then(Value::as_array))
        .ok_or_else(|| ScrapeError::Markup("missing opportunity list in response".to_string()))?;

    Ok(opportunities
        .iter()
        .take(max_results)
        .filter_map(parse_opportunity)
        .collect())
}

fn parse_opportunity(opp: &Value) -> Option<RawJob> {
    let title = opp
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Opportunity")
        .to_string();
    let company = opp
        .pointer("/organisation/name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let public_url = opp.get("public_url").and_then(Value::as_str)?;

    let location = opp
        .get("locations")
        .and_then(Value::as_array)
        .map(|locs| {
            locs.iter()
                .filter_map(|l| l.get("name").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| "Remote".to_string());

    let snippet = opp
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let description = if snippet.trim().is_empty() {
        format!(
            "{title} opportunity at {company}. Visit the application link for complete details."
        )
    } else {
        snippet.to_string()
    };

    let source_job_id = opp
        .get("id")
        .and_then(|id| match id {
            Value::Number(n) => n.as_i64().map(|n| n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .map(|id| format!("unstop_{id}"));

    let tech_stack = opp
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let applicants = opp
        .get("impressions")
        .and_then(Value::as_i64)
        .map(|n| n.clamp(0, i32::MAX as i64) as i32)
        .unwrap_or(0);

    Some(RawJob {
        title,
        company,
        location: Some(location),
        job_type_text: opp.get("type").and_then(Value::as_str).map(str::to_string),
        description,
        requirements: extract_requirements(opp),
        tech_stack,
        application_url: format!("{BASE_URL}/opportunity/{public_url}"),
        company_logo: opp
            .pointer("/organisation/logo")
            .and_then(Value::as_str)
            .map(str::to_string),
        source_job_id,
        posted_date: opp
            .get("start_date")
            .and_then(Value::as_str)
            .and_then(parse_datetime),
        expiry_date: opp
            .get("end_date")
            .and_then(Value::as_str)
            .and_then(parse_datetime),
        applicants,
        ..Default::default()
    })
}

/// Eligibility text plus every filter value, in listing order.
fn extract_requirements(opp: &Value) -> Vec<String> {
    let mut requirements = Vec::new();

    if let Some(eligibility) = opp.get("eligibility").and_then(Value::as_str)
        && !eligibility.is_empty()
    {
        requirements.push(eligibility.to_string());
    }

    if let Some(filters) = opp.get("filters").and_then(Value::as_array) {
        for filter in filters {
            if let Some(values) = filter.get("values").and_then(Value::as_array) {
                for value in values {
                    if let Some(name) = value.get("name").and_then(Value::as_str) {
                        requirements.push(name.to_string());
                    }
                }
            }
        }
    }

    requirements
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_fixture() -> Value {
        json!({
            "data": {
                "data": [
                    {
                        "id": 98765,
                        "title": "Product Intern",
                        "type": "internship",
                        "public_url": "product-intern-zeta-98765",
                        "description": "Work with the product team on roadmap research.",
                        "organisation": { "name": "Zeta", "logo": "https://cdn.unstop.com/zeta.png" },
                        "locations": [ { "name": "Mumbai" }, { "name": "Pune" } ],
                        "tags": [ { "name": "Figma" }, { "name": "SQL" } ],
                        "eligibility": "Open to final-year students",
                        "filters": [
                            { "values": [ { "name": "MBA" }, { "name": "B.Tech" } ] }
                        ],
                        "start_date": "2025-05-10T00:00:00.000Z",
                        "end_date": "2025-07-10T23:59:00.000Z",
                        "impressions": 1520
                    },
                    {
                        "id": 98766,
                        "title": "Campus Ambassador",
                        "public_url": "campus-ambassador-98766",
                        "organisation": { "name": "Orbit" },
                        "locations": []
                    },
                    {
                        "title": "No Link Opportunity"
                    }
                ]
            }
        })
    }

    #[test]
    fn parses_opportunity_fields() {
        let jobs = parse_results(&api_fixture(), 50).unwrap();
        assert_eq!(jobs.len(), 2);

        let first = &jobs[0];
        assert_eq!(first.title, "Product Intern");
        assert_eq!(first.company, "Zeta");
        assert_eq!(first.location.as_deref(), Some("Mumbai, Pune"));
        assert_eq!(first.job_type_text.as_deref(), Some("internship"));
        assert_eq!(first.source_job_id.as_deref(), Some("unstop_98765"));
        assert_eq!(
            first.application_url,
            "https://unstop.com/opportunity/product-intern-zeta-98765"
        );
        assert_eq!(first.tech_stack, vec!["Figma", "SQL"]);
        assert_eq!(
            first.requirements,
            vec!["Open to final-year students", "MBA", "B.Tech"]
        );
        assert_eq!(first.applicants, 1520);
        assert!(first.posted_date.is_some());
        assert!(first.expiry_date.is_some());
        assert_eq!(
            first.company_logo.as_deref(),
            Some("https://cdn.unstop.com/zeta.png")
        );
    }

    #[test]
    fn sparse_opportunity_gets_defaults() {
        let jobs = parse_results(&api_fixture(), 50).unwrap();
        let second = &jobs[1];
        assert_eq!(second.location.as_deref(), Some("Remote"));
        assert!(second.description.contains("Campus Ambassador"));
        assert!(second.description.contains("Orbit"));
        assert_eq!(second.applicants, 0);
    }

    #[test]
    fn opportunity_without_url_is_skipped() {
        let jobs = parse_results(&api_fixture(), 50).unwrap();
        assert!(jobs.iter().all(|j| j.title != "No Link Opportunity"));
    }

    #[test]
    fn flat_data_array_also_parses() {
        let flat = json!({ "data": [ { "id": 1, "title": "X", "public_url": "x-1",
            "organisation": { "name": "Y" } } ] });
        assert_eq!(parse_results(&flat, 50).unwrap().len(), 1);
    }

    #[test]
    fn missing_opportunity_list_is_a_markup_error() {
        let broken = json!({ "status": "ok" });
        assert!(matches!(
            parse_results(&broken, 50),
            Err(ScrapeError::Markup(_))
        ));
    }

    #[test]
    fn respects_max_results() {
        assert_eq!(parse_results(&api_fixture(), 1).unwrap().len(), 1);
    }
}
