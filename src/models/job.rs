use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;

/// The five supported listing sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Source {
    Linkedin,
    Glassdoor,
    Naukri,
    Unstop,
    Indeed,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Linkedin => "linkedin",
            Source::Glassdoor => "glassdoor",
            Source::Naukri => "naukri",
            Source::Unstop => "unstop",
            Source::Indeed => "indeed",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linkedin" => Ok(Source::Linkedin),
            "glassdoor" => Ok(Source::Glassdoor),
            "naukri" => Ok(Source::Naukri),
            "unstop" => Ok(Source::Unstop),
            "indeed" => Ok(Source::Indeed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Internship,
    Contract,
    Freelance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum WorkMode {
    Remote,
    Onsite,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Yearly,
    Monthly,
    Hourly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min: i32,
    pub max: i32,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
    pub currency: String,
    pub period: SalaryPeriod,
}

/// Canonical persisted posting, one row per `(source, source_job_id)`.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub work_mode: Option<WorkMode>,
    pub experience_min: Option<i32>,
    pub experience_max: Option<i32>,
    pub experience_unit: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<SalaryPeriod>,
    pub description: String,
    pub requirements: Vec<String>,
    pub tech_stack: Vec<String>,
    pub application_url: String,
    pub company_logo: Option<String>,
    pub source: Source,
    pub source_job_id: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub applicants: i32,
    pub is_active: bool,
    pub scraped_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Normalized record ready for persistence. Produced by the normalizer,
/// validated by the orchestrator before upsert.
#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub work_mode: Option<WorkMode>,
    pub experience: Option<ExperienceRange>,
    pub salary: Option<SalaryRange>,
    pub description: String,
    pub requirements: Vec<String>,
    pub tech_stack: Vec<String>,
    pub application_url: String,
    pub company_logo: Option<String>,
    pub source: Source,
    pub source_job_id: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub applicants: i32,
}

impl NewJob {
    /// Mandatory-field gate: title, company, description and application
    /// URL must be non-empty (source always is, it's an enum).
    pub fn has_mandatory_fields(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.company.trim().is_empty()
            && !self.description.trim().is_empty()
            && !self.application_url.trim().is_empty()
    }

    /// The dedup key is only usable when the source exposed an identifier.
    pub fn dedup_key(&self) -> Option<(Source, &str)> {
        self.source_job_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| (self.source, id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobFilters {
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub tech_stack: Option<String>,
    pub source: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SourceCount {
    pub source: Source,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct JobStats {
    pub total: i64,
    pub by_source: Vec<SourceCount>,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

const FILTER_CLAUSE: &str = "is_active
         AND ($1::text IS NULL OR to_tsvector('english', title || ' ' || company || ' ' || description) @@ plainto_tsquery('english', $1))
         AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%')
         AND ($3::text IS NULL OR job_type = $3)
         AND ($4::text[] IS NULL OR tech_stack && $4)
         AND ($5::text IS NULL OR source = $5)";

/// Map a client-supplied sort key onto a whitelisted ORDER BY clause.
fn order_clause(sort_by: Option<&str>) -> Result<&'static str, AppError> {
    match sort_by {
        None | Some("-posted_date") => Ok("posted_date DESC NULLS LAST"),
        Some("posted_date") => Ok("posted_date ASC NULLS LAST"),
        Some("-scraped_at") => Ok("scraped_at DESC"),
        Some("scraped_at") => Ok("scraped_at ASC"),
        Some(other) => Err(AppError::BadRequest(format!("Unknown sort key: {other}"))),
    }
}

fn tech_stack_list(filters: &JobFilters) -> Option<Vec<String>> {
    filters.tech_stack.as_deref().map(|raw| {
        raw.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    })
}

impl Job {
    pub async fn list(pool: &PgPool, filters: &JobFilters) -> Result<Vec<Job>, AppError> {
        let limit = filters.limit.unwrap_or(20).clamp(1, 100);
        let offset = (filters.page.unwrap_or(1) - 1).max(0) * limit;
        let order = order_clause(filters.sort_by.as_deref())?;

        let sql = format!(
            "SELECT * FROM jobs WHERE {FILTER_CLAUSE} ORDER BY {order} LIMIT $6 OFFSET $7"
        );

        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(&filters.search)
            .bind(&filters.location)
            .bind(&filters.job_type)
            .bind(tech_stack_list(filters))
            .bind(&filters.source)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(jobs)
    }

    pub async fn count(pool: &PgPool, filters: &JobFilters) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM jobs WHERE {FILTER_CLAUSE}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(&filters.search)
            .bind(&filters.location)
            .bind(&filters.job_type)
            .bind(tech_stack_list(filters))
            .bind(&filters.source)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn stats(pool: &PgPool) -> Result<JobStats, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE is_active")
            .fetch_one(pool)
            .await?;

        let by_source = sqlx::query_as::<_, SourceCount>(
            "SELECT source, COUNT(*) AS count FROM jobs WHERE is_active GROUP BY source ORDER BY count DESC",
        )
        .fetch_all(pool)
        .await?;

        let last_scraped_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(scraped_at) FROM jobs")
                .fetch_one(pool)
                .await?;

        Ok(JobStats {
            total,
            by_source,
            last_scraped_at,
        })
    }

    /// Insert-or-update keyed on `(source, source_job_id)`.
    ///
    /// The conflict path only touches volatile fields: `last_updated`
    /// always, `applicants` only when the incoming value is positive.
    /// First-seen descriptive content stays authoritative. Atomicity
    /// rests on the partial unique index, so concurrent upserts from
    /// racing scraper tasks need no external serialization.
    ///
    /// Records without a `source_job_id` are inserted best-effort and
    /// cannot be deduplicated on replay.
    pub async fn upsert(pool: &PgPool, input: &NewJob) -> Result<UpsertOutcome, AppError> {
        let insert_columns = "INSERT INTO jobs (title, company, location, job_type, work_mode,
                experience_min, experience_max, experience_unit,
                salary_min, salary_max, salary_currency, salary_period,
                description, requirements, tech_stack, application_url, company_logo,
                source, source_job_id, posted_date, expiry_date, applicants)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)";

        let sql = if input.dedup_key().is_some() {
            format!(
                "{insert_columns}
                 ON CONFLICT (source, source_job_id) WHERE source_job_id IS NOT NULL
                 DO UPDATE SET
                     last_updated = NOW(),
                     applicants = CASE WHEN EXCLUDED.applicants > 0 THEN EXCLUDED.applicants ELSE jobs.applicants END
                 RETURNING (xmax = 0)"
            )
        } else {
            format!("{insert_columns} RETURNING TRUE")
        };

        let source_job_id = input.source_job_id.as_deref().filter(|id| !id.is_empty());
        let was_inserted: bool = sqlx::query_scalar(&sql)
            .bind(&input.title)
            .bind(&input.company)
            .bind(&input.location)
            .bind(input.job_type)
            .bind(input.work_mode)
            .bind(input.experience.as_ref().map(|e| e.min))
            .bind(input.experience.as_ref().map(|e| e.max))
            .bind(input.experience.as_ref().map(|e| e.unit.as_str()))
            .bind(input.salary.as_ref().map(|s| s.min))
            .bind(input.salary.as_ref().map(|s| s.max))
            .bind(input.salary.as_ref().map(|s| s.currency.as_str()))
            .bind(input.salary.as_ref().map(|s| s.period))
            .bind(&input.description)
            .bind(&input.requirements)
            .bind(&input.tech_stack)
            .bind(&input.application_url)
            .bind(&input.company_logo)
            .bind(input.source)
            .bind(source_job_id)
            .bind(input.posted_date)
            .bind(input.expiry_date)
            .bind(input.applicants)
            .fetch_one(pool)
            .await?;

        Ok(if was_inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job(source_job_id: Option<&str>) -> NewJob {
        NewJob {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: Some("Bengaluru".to_string()),
            job_type: Some(JobType::FullTime),
            work_mode: None,
            experience: None,
            salary: None,
            description: "Build services".to_string(),
            requirements: vec![],
            tech_stack: vec![],
            application_url: "https://example.com/jobs/1".to_string(),
            company_logo: None,
            source: Source::Naukri,
            source_job_id: source_job_id.map(String::from),
            posted_date: None,
            expiry_date: None,
            applicants: 0,
        }
    }

    #[test]
    fn source_round_trips_through_str() {
        for s in [
            Source::Linkedin,
            Source::Glassdoor,
            Source::Naukri,
            Source::Unstop,
            Source::Indeed,
        ] {
            assert_eq!(s.as_str().parse::<Source>(), Ok(s));
        }
        assert!("monster".parse::<Source>().is_err());
    }

    #[test]
    fn mandatory_field_gate() {
        assert!(sample_job(Some("naukri_1")).has_mandatory_fields());

        let mut missing_description = sample_job(Some("naukri_1"));
        missing_description.description = "  ".to_string();
        assert!(!missing_description.has_mandatory_fields());

        let mut missing_url = sample_job(Some("naukri_1"));
        missing_url.application_url.clear();
        assert!(!missing_url.has_mandatory_fields());
    }

    #[test]
    fn dedup_key_requires_non_empty_id() {
        assert!(sample_job(Some("naukri_42")).dedup_key().is_some());
        assert!(sample_job(Some("")).dedup_key().is_none());
        assert!(sample_job(None).dedup_key().is_none());
    }

    #[test]
    fn sort_keys_are_whitelisted() {
        assert!(order_clause(None).is_ok());
        assert!(order_clause(Some("-posted_date")).is_ok());
        assert!(order_clause(Some("scraped_at")).is_ok());
        assert!(order_clause(Some("title; DROP TABLE jobs")).is_err());
    }
}
