// Job search prompt templates.

use crate::jobs::JobFilters;
use crate::profile::ResumeProfile;

pub const JOB_SEARCH_SYSTEM: &str = "\
You are a job search assistant. Search for relevant jobs based on the candidate's profile \
and return exactly 3 most relevant positions from the last 24 hours.";

/// Only the leading skills go into the query.
pub const MAX_QUERY_SKILLS: usize = 5;

pub fn search_prompt(profile: &ResumeProfile, filters: &JobFilters) -> String {
    let skills = profile
        .skills
        .iter()
        .take(MAX_QUERY_SKILLS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let location = filters.location.as_deref().unwrap_or("Any");
    let remote = if filters.remote { "Yes" } else { "No preference" };
    let min_salary = thousands(filters.min_salary.unwrap_or(0));

    let mut extra = String::new();
    if !filters.job_types.is_empty() {
        extra.push_str(&format!("Job Types: {}\n", filters.job_types.join(", ")));
    }
    if let Some(style) = filters.work_style.as_deref() {
        extra.push_str(&format!("Work Style: {style}\n"));
    }

    format!(
        r#"Find jobs matching this candidate profile:
Skills: {skills}
Recent Experience: {experience}
Location: {location}
Remote: {remote}
Minimum Salary: ${min_salary}
{extra}
Please format each job as:
Title: [job title]
Company: [company name]
Location: [location]
Salary: [salary range if available]
Description: [brief job description]
URL: [job posting URL]"#,
        experience = profile.experience_summary,
    )
}

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
