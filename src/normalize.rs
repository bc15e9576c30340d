//! Pure field normalizers reconciling the sites' free-text vocabularies
//! into the canonical schema. Every function is deterministic and
//! side-effect free; unparseable input is omitted, never guessed at.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::job::{
    ExperienceRange, JobType, NewJob, SalaryPeriod, SalaryRange, Source, WorkMode,
};
use crate::scrapers::RawJob;

static EXPERIENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)").expect("experience regex"));

// Digit groups separated by `-` or `to`, with optional thousand groups
// concatenated ("1,200-1,800" parses as 1200-1800).
static SALARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:,(\d+))?(?:-|to)(\d+)(?:,(\d+))?").expect("salary regex"));

/// Known languages/frameworks/tools scanned for in description text.
/// Matches are case-insensitive substrings, reported in list order.
const TECH_KEYWORDS: &[&str] = &[
    "JavaScript",
    "TypeScript",
    "Python",
    "Java",
    "C++",
    "C#",
    "Go",
    "Rust",
    "Ruby",
    "PHP",
    "React",
    "Angular",
    "Vue",
    "Node.js",
    "Express",
    "Django",
    "Flask",
    "Spring",
    "Laravel",
    "MongoDB",
    "PostgreSQL",
    "MySQL",
    "Redis",
    "Docker",
    "Kubernetes",
    "AWS",
    "Azure",
    "GCP",
    "Git",
    "CI/CD",
    "REST",
    "GraphQL",
    "Microservices",
    "Machine Learning",
    "TensorFlow",
];

/// Map a site's job-type wording onto the canonical enum. Absent input
/// stays absent; anything non-empty but unrecognized defaults to
/// full-time.
pub fn job_type(raw: Option<&str>) -> Option<JobType> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    Some(match raw.trim().to_lowercase().as_str() {
        "full time" | "fulltime" | "full-time" => JobType::FullTime,
        "part time" | "parttime" | "part-time" => JobType::PartTime,
        "internship" => JobType::Internship,
        "contract" => JobType::Contract,
        "freelance" => JobType::Freelance,
        _ => JobType::FullTime,
    })
}

/// Derive the work mode from location text by substring match.
pub fn work_mode(location: Option<&str>) -> Option<WorkMode> {
    let loc = location?.to_lowercase();
    if loc.is_empty() {
        return None;
    }
    Some(if loc.contains("remote") {
        WorkMode::Remote
    } else if loc.contains("hybrid") {
        WorkMode::Hybrid
    } else {
        WorkMode::Onsite
    })
}

/// Parse an experience range like "2-5 years" out of free text.
pub fn experience(raw: &str) -> Option<ExperienceRange> {
    let caps = EXPERIENCE_RE.captures(raw)?;
    Some(ExperienceRange {
        min: caps[1].parse().ok()?,
        max: caps[2].parse().ok()?,
        unit: "years".to_string(),
    })
}

/// Parse a salary range out of free text. All five sources operate on the
/// Indian market, so the currency is fixed to INR and the period to
/// yearly. Non-range strings ("Not disclosed", a single figure) yield
/// `None`.
pub fn salary(raw: &str) -> Option<SalaryRange> {
    let caps = SALARY_RE.captures(raw)?;
    let min = concat_groups(&caps, 1, 2)?;
    let max = concat_groups(&caps, 3, 4)?;
    Some(SalaryRange {
        min,
        max,
        currency: "INR".to_string(),
        period: SalaryPeriod::Yearly,
    })
}

fn concat_groups(caps: &regex::Captures<'_>, whole: usize, thousands: usize) -> Option<i64> {
    let mut digits = caps.get(whole)?.as_str().to_string();
    if let Some(group) = caps.get(thousands) {
        digits.push_str(group.as_str());
    }
    digits.parse().ok()
}

/// Scan description text for known tech keywords.
pub fn tech_stack(description: &str) -> Vec<String> {
    let text = description.to_lowercase();
    TECH_KEYWORDS
        .iter()
        .filter(|kw| text.contains(&kw.to_lowercase()))
        .map(|kw| kw.to_string())
        .collect()
}

/// Assemble the canonical record from one raw extraction.
pub fn to_new_job(raw: RawJob, source: Source) -> NewJob {
    let work_mode = work_mode(raw.location.as_deref());
    let job_type = job_type(raw.job_type_text.as_deref());
    let experience = raw.experience_text.as_deref().and_then(experience);
    let salary = raw.salary_text.as_deref().and_then(salary);
    let tech_stack = if raw.tech_stack.is_empty() {
        tech_stack(&raw.description)
    } else {
        raw.tech_stack
    };

    NewJob {
        title: raw.title,
        company: raw.company,
        location: raw.location,
        job_type,
        work_mode,
        experience,
        salary,
        description: raw.description,
        requirements: raw.requirements,
        tech_stack,
        application_url: raw.application_url,
        company_logo: raw.company_logo,
        source,
        source_job_id: raw.source_job_id,
        posted_date: raw.posted_date,
        expiry_date: raw.expiry_date,
        applicants: raw.applicants,
    }
}
