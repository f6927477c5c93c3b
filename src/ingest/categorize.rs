// src/ingest/categorize.rs
//! Keyword categorizer.
//!
//! Rules are plain data checked in order; the first category with a matching
//! keyword wins, so precedence is Internship → Data Science → AI/ML →
//! Software Engineering, with `Other` as the fallback. Keywords match whole
//! words (or whole word sequences), case-insensitively, so "intern" does not
//! fire on "International" and "ai" does not fire on "Maintenance".
//!
//! The title decides. The description is only consulted when the title alone
//! resolves to `Other`.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::types::{CanonicalJob, Category};

pub const RULES: &[(Category, &[&str])] = &[
    (
        Category::Internship,
        &[
            "intern",
            "interns",
            "internship",
            "internships",
            "co-op",
            "apprentice",
        ],
    ),
    (
        Category::DataScience,
        &[
            "data",
            "analyst",
            "analytics",
            "statistician",
            "data scientist",
            "bi",
        ],
    ),
    (
        Category::AIML,
        &[
            "ai",
            "ml",
            "machine learning",
            "deep learning",
            "llm",
            "nlp",
            "computer vision",
            "mlops",
        ],
    ),
    (
        Category::SoftwareEngineering,
        &[
            "software",
            "engineer",
            "developer",
            "programmer",
            "backend",
            "frontend",
            "full stack",
            "fullstack",
            "devops",
            "sre",
            "swe",
            "web developer",
        ],
    ),
];

/// Lowercased Unicode word runs.
fn words(input: &str) -> Vec<String> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?u)\w+").expect("word regex"));
    re.find_iter(input)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn contains_phrase(haystack: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && haystack.windows(phrase.len()).any(|w| w == phrase)
}

/// Category for one piece of text, or `None` when no rule matches.
pub fn match_text(text: &str) -> Option<Category> {
    let tokens = words(text);
    if tokens.is_empty() {
        return None;
    }
    RULES.iter().find_map(|(cat, keywords)| {
        keywords
            .iter()
            .any(|kw| contains_phrase(&tokens, &words(kw)))
            .then_some(*cat)
    })
}

pub fn categorize(title: &str, description: Option<&str>) -> Category {
    match_text(title)
        .or_else(|| description.and_then(match_text))
        .unwrap_or(Category::Other)
}

pub fn categorize_all(jobs: &mut [CanonicalJob]) {
    for job in jobs.iter_mut() {
        job.category = categorize(&job.title, job.description.as_deref());
    }
}
