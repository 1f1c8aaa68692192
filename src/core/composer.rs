use crate::config::{ComposerSettings, LlmSettings};
use crate::domain::model::{JobPosting, LlmRequest, PortfolioLink};
use crate::domain::ports::LlmBackend;
use crate::utils::error::{AgentError, LlmStage, Result};
use std::sync::Arc;

/// Drafts a cover email for one posting.
pub struct EmailComposer {
    backend: Arc<dyn LlmBackend>,
    model: String,
    temperature: f32,
    settings: ComposerSettings,
}

impl EmailComposer {
    pub fn new(backend: Arc<dyn LlmBackend>, llm: &LlmSettings, settings: ComposerSettings) -> Self {
        Self {
            backend,
            model: llm.model.clone(),
            temperature: llm.temperature,
            settings,
        }
    }

    pub fn build_prompt(&self, job: &JobPosting, portfolio_links: &[PortfolioLink]) -> String {
        let mut prompt = String::new();

        prompt.push_str("### JOB DESCRIPTION\n");
        prompt.push_str(&format!("Role: {}\n", job.role));
        if !job.experience.is_empty() {
            prompt.push_str(&format!("Experience: {}\n", job.experience));
        }
        if !job.skills.is_empty() {
            prompt.push_str(&format!("Skills: {}\n", job.skills.join(", ")));
        }
        if !job.description.is_empty() {
            prompt.push_str(&format!("Description: {}\n", job.description));
        }

        prompt.push_str("\n### INSTRUCTIONS\n");
        prompt.push_str(
            "- Write a professional, personalized and compelling cover email for the job above.\n",
        );
        prompt.push_str("- Highlight the skills and experience that match the role.\n");
        prompt.push_str("- Keep the tone confident and formal yet approachable, with a clear introduction, body and conclusion.\n");
        prompt.push_str("- Never claim a skill or experience that is not stated; when a required skill is missing, focus on related strengths.\n");

        if portfolio_links.is_empty() {
            prompt.push_str("- Do not mention or invent any portfolio projects.\n");
        } else {
            let limit = self.settings.max_portfolio_links.min(portfolio_links.len());
            prompt.push_str(&format!(
                "- If relevant, briefly reference at most {} of these portfolio projects:\n",
                limit
            ));
            for link in portfolio_links {
                prompt.push_str(&format!("  - {}\n", link.link));
            }
        }

        prompt.push_str(&format!(
            "- Include this portfolio website exactly once: {} (do not add any other links).\n",
            self.settings.contact_link
        ));
        prompt.push_str(
            "- End with a strong closing statement that reaffirms interest in the role, followed by the signature below.\n",
        );
        prompt.push_str(&format!("\nBest regards,\n{}\n", self.settings.sender_name));

        prompt
    }

    /// Returns the generated email text unmodified.
    pub async fn compose(&self, job: &JobPosting, portfolio_links: &[PortfolioLink]) -> Result<String> {
        let request = LlmRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            prompt: self.build_prompt(job, portfolio_links),
        };

        tracing::debug!(
            "Composing email for '{}' with {} portfolio link(s)",
            job.role,
            portfolio_links.len()
        );

        self.backend
            .generate(request)
            .await
            .map_err(|source| AgentError::GenerationError {
                stage: LlmStage::Composition,
                source,
            })
    }
}
