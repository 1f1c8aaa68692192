use crate::core::cleaner::clean_text;
use crate::core::composer::EmailComposer;
use crate::core::extraction::ExtractionStep;
use crate::core::portfolio::PortfolioIndex;
use crate::domain::model::{EmailDraft, RunReport};
use crate::domain::ports::PageLoader;
use crate::utils::error::{AgentError, Result};
use crate::utils::monitor::RunMonitor;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// Where a run currently is. Job indexes are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Fetching,
    Cleaning,
    Extracting,
    Matching { job: usize, of: usize },
    Composing { job: usize, of: usize },
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::Idle => write!(f, "Idle"),
            RunStage::Fetching => write!(f, "Fetching"),
            RunStage::Cleaning => write!(f, "Cleaning"),
            RunStage::Extracting => write!(f, "Extracting"),
            RunStage::Matching { job, of } => write!(f, "Matching job {}/{}", job + 1, of),
            RunStage::Composing { job, of } => write!(f, "Composing job {}/{}", job + 1, of),
            RunStage::Done => write!(f, "Done"),
            RunStage::Failed => write!(f, "Failed"),
        }
    }
}

/// Why a run stopped. Not resumable; start a new run instead.
#[derive(Debug)]
pub struct RunFailure {
    pub stage: RunStage,
    pub error: AgentError,
}

impl RunFailure {
    pub fn message(&self) -> String {
        self.error.user_friendly_message()
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Done(RunReport),
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, RunOutcome::Done(_))
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Done(report) => Some(report),
            RunOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        match self {
            RunOutcome::Done(_) => None,
            RunOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// fetch -> clean -> extract -> (match -> compose) per job.
pub struct CoverMailFlow {
    loader: Arc<dyn PageLoader>,
    extractor: ExtractionStep,
    composer: EmailComposer,
    portfolio: Arc<PortfolioIndex>,
    top_k: usize,
    monitoring: bool,
}

impl CoverMailFlow {
    pub fn new(
        loader: Arc<dyn PageLoader>,
        extractor: ExtractionStep,
        composer: EmailComposer,
        portfolio: Arc<PortfolioIndex>,
    ) -> Self {
        let top_k = portfolio.top_k();
        Self {
            loader,
            extractor,
            composer,
            portfolio,
            top_k,
            monitoring: false,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitoring = enabled;
        self
    }

    pub async fn run(&self, url: &str) -> RunOutcome {
        self.run_with_progress(url, |_| {}).await
    }

    /// Runs once, reporting every stage transition to `on_stage`.
    pub async fn run_with_progress<F>(&self, url: &str, mut on_stage: F) -> RunOutcome
    where
        F: FnMut(RunStage) + Send,
    {
        let mut monitor = RunMonitor::new(self.monitoring);
        let mut stage = RunStage::Idle;
        on_stage(stage);

        let result = self
            .drive(url, &mut monitor, &mut |next| {
                stage = next;
                on_stage(next);
            })
            .await;
        monitor.log_final_stats();

        match result {
            Ok(drafts) => {
                on_stage(RunStage::Done);
                tracing::info!("✅ Generated {} email draft(s) for {}", drafts.len(), url);
                RunOutcome::Done(RunReport {
                    url: url.to_string(),
                    drafts,
                    generated_at: Utc::now(),
                })
            }
            Err(error) => {
                tracing::error!(
                    "❌ Run failed during {}: {} (Category: {:?})",
                    stage,
                    error,
                    error.category()
                );
                on_stage(RunStage::Failed);
                RunOutcome::Failed(RunFailure { stage, error })
            }
        }
    }

    async fn drive(
        &self,
        url: &str,
        monitor: &mut RunMonitor,
        enter: &mut (dyn FnMut(RunStage) + Send),
    ) -> Result<Vec<EmailDraft>> {
        enter(RunStage::Fetching);
        tracing::debug!("🔍 Loading job description from {}", url);
        let raw_text = self.loader.load(url).await?;
        monitor.mark("Fetching");

        enter(RunStage::Cleaning);
        let cleaned = clean_text(&raw_text);
        tracing::debug!("Cleaned page text: {} -> {} chars", raw_text.len(), cleaned.len());
        monitor.mark("Cleaning");

        enter(RunStage::Extracting);
        tracing::debug!("📋 Analyzing job requirements");
        let jobs = self.extractor.extract(&cleaned).await?;
        monitor.mark("Extracting");

        let total = jobs.len();
        let mut drafts = Vec::with_capacity(total);
        for (index, job) in jobs.into_iter().enumerate() {
            enter(RunStage::Matching { job: index, of: total });
            tracing::debug!("🧩 Matching portfolio for '{}'", job.role);
            // 每個職缺各自查詢，不覆寫共用的 index
            let matches = self.portfolio.query(job.skills.as_slice(), self.top_k)?;
            monitor.mark("Matching");

            enter(RunStage::Composing { job: index, of: total });
            tracing::debug!("✍️ Drafting email for '{}'", job.role);
            let body = self.composer.compose(&job, &matches).await?;
            monitor.mark("Composing");

            drafts.push(EmailDraft {
                job,
                portfolio: matches,
                body,
            });
        }

        Ok(drafts)
    }
}
