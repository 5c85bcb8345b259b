//! Job search: asks the generation service for postings that fit a resume
//! profile, parses the labelled listing text it returns, and orders the
//! listings by how many of the candidate's skills they mention.

pub mod handlers;
pub mod prompts;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::jobs::prompts::{search_prompt, JOB_SEARCH_SYSTEM};
use crate::llm_client::{GenerationProvider, LlmError};
use crate::profile::ResumeProfile;

/// Points per skill named in a listing's description.
const SKILL_MATCH_POINTS: f32 = 1.0;
/// Points when the description shares a keyword with the experience summary.
const EXPERIENCE_MATCH_POINTS: f32 = 0.5;
/// Shorter words ("a", "the", "at") match nearly every description.
const MIN_KEYWORD_LEN: usize = 4;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobFilters {
    pub location: Option<String>,
    pub remote: bool,
    pub min_salary: Option<u64>,
    pub job_types: Vec<String>,
    pub work_style: Option<String>,
}

/// One posting. Only the title is required for a block to count as a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub match_score: f32,
}

impl JobListing {
    fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            company: None,
            location: None,
            salary: None,
            description: None,
            url: None,
            match_score: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum JobSearchError {
    #[error("job search generation failed: {0}")]
    Generation(#[from] LlmError),
}

pub struct JobSearcher {
    llm: Arc<dyn GenerationProvider>,
}

impl JobSearcher {
    pub fn new(llm: Arc<dyn GenerationProvider>) -> Self {
        Self { llm }
    }

    /// One generation call; the reply is parsed and ranked, never retried.
    pub async fn search(
        &self,
        profile: &ResumeProfile,
        filters: &JobFilters,
    ) -> Result<Vec<JobListing>, JobSearchError> {
        let prompt = search_prompt(profile, filters);
        debug!("Searching jobs via {} ({} skills)", self.llm.model(), profile.skills.len());
        let reply = self.llm.complete(JOB_SEARCH_SYSTEM, &prompt).await?;

        let listings = parse_job_listings(&reply);
        info!("Parsed {} job listings", listings.len());
        Ok(rank_listings(listings, profile))
    }
}

/// Parses `Title:` / `Company:` / `Location:` / `Salary:` / `Description:` /
/// `URL:` lines. Every `Title:` line starts a new listing; lines before the
/// first title and unknown labels are ignored. Markdown bold and list markers
/// around labels are tolerated.
pub fn parse_job_listings(text: &str) -> Vec<JobListing> {
    let mut listings = Vec::new();
    let mut current: Option<JobListing> = None;

    for raw in text.lines() {
        let line = raw.trim().replace("**", "");
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let label = strip_list_marker(label.trim()).to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if label == "title" || label == "job title" {
            listings.extend(current.take());
            current = Some(JobListing::titled(value));
            continue;
        }
        let Some(listing) = current.as_mut() else {
            continue;
        };
        let slot = match label.as_str() {
            "company" | "company name" => &mut listing.company,
            "location" => &mut listing.location,
            "salary" => &mut listing.salary,
            "description" => &mut listing.description,
            "url" => {
                listing.url = Some(unwrap_markdown_link(value).to_string());
                continue;
            }
            _ => continue,
        };
        *slot = Some(value.to_string());
    }

    listings.extend(current);
    listings
}

fn strip_list_marker(label: &str) -> &str {
    let label = label.trim_start_matches(|c: char| matches!(c, '-' | '*' | '#') || c.is_whitespace());
    let after_digits = label.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_digits.len() != label.len() {
        if let Some(rest) = after_digits
            .strip_prefix('.')
            .or_else(|| after_digits.strip_prefix(')'))
        {
            return rest.trim_start();
        }
    }
    label
}

/// `[text](https://…)` → `https://…`; anything else is returned as is.
fn unwrap_markdown_link(value: &str) -> &str {
    if value.contains('[') {
        if let Some(open) = value.find("](") {
            let rest = &value[open + 2..];
            if let Some(close) = rest.find(')') {
                return rest[..close].trim();
            }
        }
    }
    value
}

/// Skill and experience overlap with the listing's description.
pub fn match_score(listing: &JobListing, profile: &ResumeProfile) -> f32 {
    let Some(description) = listing.description.as_deref() else {
        return 0.0;
    };
    let description = description.to_lowercase();

    let skills = profile
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && description.contains(s.as_str()))
        .count();
    let mut score = skills as f32 * SKILL_MATCH_POINTS;

    let shares_keyword = profile
        .experience_summary
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN)
        .any(|w| description.contains(&w.to_lowercase()));
    if shares_keyword {
        score += EXPERIENCE_MATCH_POINTS;
    }
    score
}

/// Scores every listing and sorts best first. Equal scores keep reply order.
pub fn rank_listings(mut listings: Vec<JobListing>, profile: &ResumeProfile) -> Vec<JobListing> {
    for listing in &mut listings {
        listing.match_score = match_score(listing, profile);
    }
    listings.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::{FailingLlm, FakeLlm};

    const REPLY: &str = "Here are the top matches:

1. **Title:** Senior Rust Engineer
   **Company:** Ferrous Systems
   **Location:** Berlin, Germany
   **Salary:** €90k-€110k
   **Description:** Build embedded tooling in Rust and C for safety-critical payment terminals.
   **URL:** [Apply here](https://jobs.example.com/rust-1)

2. **Title:** Backend Developer
   **Company:** Initech
   **Location:** Remote
   **Description:** Maintain Python services and SQL reports.
   **URL:** https://jobs.example.com/backend-2

Title: Platform Engineer
Company: Globex
Description: Kubernetes and Go operators.
URL: https://jobs.example.com/platform-3";

    fn profile() -> ResumeProfile {
        ResumeProfile {
            skills: vec!["Rust".into(), "Go".into(), "Kubernetes".into()],
            experience_summary: "Built payment systems at a fintech.".into(),
        }
    }

    #[test]
    fn test_parse_labelled_listings() {
        let listings = parse_job_listings(REPLY);
        assert_eq!(listings.len(), 3);

        let first = &listings[0];
        assert_eq!(first.title, "Senior Rust Engineer");
        assert_eq!(first.company.as_deref(), Some("Ferrous Systems"));
        assert_eq!(first.location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(first.salary.as_deref(), Some("€90k-€110k"));
        assert_eq!(first.url.as_deref(), Some("https://jobs.example.com/rust-1"));

        assert_eq!(listings[1].salary, None);
        assert_eq!(listings[1].url.as_deref(), Some("https://jobs.example.com/backend-2"));
        assert_eq!(listings[2].company.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_parse_splits_listings_without_blank_lines() {
        let text = "Title: A\nCompany: One\nTitle: B\nCompany: Two";
        let listings = parse_job_listings(text);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1].company.as_deref(), Some("Two"));
    }

    #[test]
    fn test_parse_ignores_text_without_titles() {
        assert!(parse_job_listings("No jobs found.\nCompany: Nobody").is_empty());
        assert!(parse_job_listings("").is_empty());
    }

    #[test]
    fn test_unwrap_markdown_link() {
        assert_eq!(unwrap_markdown_link("[Apply](https://x.io/1)"), "https://x.io/1");
        assert_eq!(unwrap_markdown_link("https://x.io/2"), "https://x.io/2");
        assert_eq!(unwrap_markdown_link("[broken link"), "[broken link");
    }

    #[test]
    fn test_match_score_counts_skills_and_experience() {
        let listings = parse_job_listings(REPLY);
        // Rust + "payment"
        assert_eq!(match_score(&listings[0], &profile()), 1.5);
        assert_eq!(match_score(&listings[1], &profile()), 0.0);
        // Kubernetes + Go
        assert_eq!(match_score(&listings[2], &profile()), 2.0);
    }

    #[test]
    fn test_listing_without_description_scores_zero() {
        assert_eq!(match_score(&JobListing::titled("Anything"), &profile()), 0.0);
    }

    #[test]
    fn test_rank_orders_best_first_and_keeps_ties_stable() {
        let ranked = rank_listings(parse_job_listings(REPLY), &profile());
        let titles: Vec<_> = ranked.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Platform Engineer", "Senior Rust Engineer", "Backend Developer"]
        );

        let tied = rank_listings(
            vec![JobListing::titled("first"), JobListing::titled("second")],
            &profile(),
        );
        assert_eq!(tied[0].title, "first");
    }

    #[tokio::test]
    async fn test_search_parses_and_ranks_generation_reply() {
        let llm = Arc::new(FakeLlm::answering(REPLY));
        let searcher = JobSearcher::new(llm.clone());
        let jobs = searcher
            .search(&profile(), &JobFilters::default())
            .await
            .unwrap();

        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].title, "Platform Engineer");
        let prompts = llm.prompts();
        assert_eq!(prompts[0].0, JOB_SEARCH_SYSTEM);
        assert!(prompts[0].1.contains("Skills: Rust, Go, Kubernetes"));
    }

    #[tokio::test]
    async fn test_search_surfaces_generation_failure() {
        let searcher = JobSearcher::new(Arc::new(FailingLlm));
        let err = searcher
            .search(&profile(), &JobFilters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, JobSearchError::Generation(LlmError::Api { status: 503, .. })));
    }
}
