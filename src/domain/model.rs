use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job posting extracted from a careers page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub role: String,
    pub experience: String,
    pub skills: Vec<String>,
    pub description: String,
}

/// One row of the portfolio dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioRecord {
    /// 去重後、保留原始順序的技能
    pub skills: Vec<String>,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioLink {
    pub link: String,
}

impl PortfolioLink {
    pub fn new(link: impl Into<String>) -> Self {
        Self { link: link.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub job: JobPosting,
    pub portfolio: Vec<PortfolioLink>,
    pub body: String,
}

/// Everything a finished run hands to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub url: String,
    pub drafts: Vec<EmailDraft>,
    pub generated_at: DateTime<Utc>,
}

/// A single request to the text-generation backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub temperature: f32,
    pub prompt: String,
}
