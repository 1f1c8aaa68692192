use crate::domain::model::{EmailDraft, RunReport};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Writes finished runs to a zip archive through a `Storage`.
pub struct DraftArchive<S: Storage> {
    storage: S,
    archive_name: String,
}

impl<S: Storage> DraftArchive<S> {
    pub fn new(storage: S, archive_name: impl Into<String>) -> Self {
        Self {
            storage,
            archive_name: archive_name.into(),
        }
    }

    pub fn render_markdown(index: usize, draft: &EmailDraft) -> String {
        let mut markdown = format!("# Draft {}: {}\n\n", index + 1, draft.job.role);
        if !draft.job.experience.is_empty() {
            markdown.push_str(&format!("- Experience: {}\n", draft.job.experience));
        }
        if !draft.job.skills.is_empty() {
            markdown.push_str(&format!("- Skills: {}\n", draft.job.skills.join(", ")));
        }
        if !draft.portfolio.is_empty() {
            let links: Vec<&str> = draft.portfolio.iter().map(|p| p.link.as_str()).collect();
            markdown.push_str(&format!("- Portfolio: {}\n", links.join(", ")));
        }
        markdown.push_str("\n---\n\n");
        markdown.push_str(&draft.body);
        markdown.push('\n');
        markdown
    }

    /// Returns the archive name written to storage.
    pub async fn save(&self, report: &RunReport) -> Result<String> {
        tracing::debug!(
            "Creating ZIP archive with {} draft(s)",
            report.drafts.len()
        );

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("jobs.json", FileOptions::default())?;
            let json_data = serde_json::to_string_pretty(report)?;
            zip.write_all(json_data.as_bytes())?;

            for (index, draft) in report.drafts.iter().enumerate() {
                zip.start_file::<_, ()>(format!("draft_{:02}.md", index + 1), FileOptions::default())?;
                zip.write_all(Self::render_markdown(index, draft).as_bytes())?;
            }

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        self.storage.write_file(&self.archive_name, &zip_data).await?;
        tracing::info!("📁 Drafts saved to {} ({} bytes)", self.archive_name, zip_data.len());
        Ok(self.archive_name.clone())
    }
}
