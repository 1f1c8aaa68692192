use crate::config::PortfolioSettings;
use crate::domain::model::{PortfolioLink, PortfolioRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{AgentError, Result};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_TOP_K: usize = 2;

struct IndexedRecord {
    record: PortfolioRecord,
    vector: TermVector,
}

/// Term-frequency vector with its precomputed norm.
struct TermVector {
    terms: HashMap<String, f32>,
    norm: f32,
}

impl TermVector {
    fn from_skills<S: AsRef<str>>(skills: &[S]) -> Self {
        let mut terms: HashMap<String, f32> = HashMap::new();
        for skill in skills {
            for token in tokenize(skill.as_ref()) {
                *terms.entry(token).or_insert(0.0) += 1.0;
            }
        }
        let norm = terms.values().map(|w| w * w).sum::<f32>().sqrt();
        Self { terms, norm }
    }

    fn cosine(&self, other: &TermVector) -> f32 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        let dot: f32 = self
            .terms
            .iter()
            .filter_map(|(term, weight)| other.terms.get(term).map(|w| w * weight))
            .sum();
        dot / (self.norm * other.norm)
    }
}

/// 保留 c++、c#、node.js 這類技能名稱
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|token| token.trim_matches('.').to_lowercase())
        .filter(|token| !token.is_empty())
}

/// Skill -> project link records answering similarity queries.
///
/// Loaded once, read-only afterwards; share it behind an `Arc`.
pub struct PortfolioIndex {
    settings: PortfolioSettings,
    records: Vec<IndexedRecord>,
}

impl PortfolioIndex {
    pub fn new(settings: PortfolioSettings) -> Self {
        Self {
            settings,
            records: Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn top_k(&self) -> usize {
        self.settings.top_k
    }

    pub fn records(&self) -> impl Iterator<Item = &PortfolioRecord> {
        self.records.iter().map(|indexed| &indexed.record)
    }

    /// Reads the dataset unless records are already indexed.
    pub async fn load<S: Storage>(&mut self, storage: &S) -> Result<usize> {
        if self.is_loaded() {
            tracing::debug!("Portfolio already indexed ({} records)", self.records.len());
            return Ok(self.records.len());
        }

        let data = storage.read_file(&self.settings.dataset).await?;
        let records = self.parse_dataset(&data)?;

        self.records = records
            .into_iter()
            .map(|record| IndexedRecord {
                vector: TermVector::from_skills(record.skills.as_slice()),
                record,
            })
            .collect();

        if self.records.is_empty() {
            tracing::warn!("⚠️ Portfolio dataset {} has no usable rows", self.settings.dataset);
        } else {
            tracing::info!(
                "🗂️ Indexed {} portfolio records from {}",
                self.records.len(),
                self.settings.dataset
            );
        }
        Ok(self.records.len())
    }

    /// Drops the current records and reads the dataset again.
    pub async fn reload<S: Storage>(&mut self, storage: &S) -> Result<usize> {
        self.records.clear();
        self.load(storage).await
    }

    fn parse_dataset(&self, data: &[u8]) -> Result<Vec<PortfolioRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(name))
                .ok_or_else(|| AgentError::PortfolioDatasetError {
                    message: format!(
                        "column '{}' not found in {} (columns: {})",
                        name,
                        self.settings.dataset,
                        headers.iter().collect::<Vec<_>>().join(", ")
                    ),
                })
        };
        let skills_idx = column(self.settings.skills_column.as_str())?;
        let link_idx = column(self.settings.link_column.as_str())?;

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let row_data = result?;
            let link = row_data.get(link_idx).unwrap_or_default().trim();
            if link.is_empty() {
                tracing::warn!("Skipping portfolio row {} without a link", row + 1);
                continue;
            }

            let mut seen = HashSet::new();
            let skills = row_data
                .get(skills_idx)
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|skill| !skill.is_empty())
                .filter(|skill| seen.insert(skill.to_lowercase()))
                .map(str::to_string)
                .collect();

            records.push(PortfolioRecord {
                skills,
                link: link.to_string(),
            });
        }

        Ok(records)
    }

    /// Returns up to `top_k` links ranked by skill similarity. Ties keep dataset order.
    pub fn query<S: AsRef<str>>(&self, skills: &[S], top_k: usize) -> Result<Vec<PortfolioLink>> {
        if !self.is_loaded() {
            return Err(AgentError::IndexNotLoadedError);
        }

        let query = TermVector::from_skills(skills);
        let mut scored: Vec<(f32, &IndexedRecord)> = self
            .records
            .iter()
            .map(|indexed| (indexed.vector.cosine(&query), indexed))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let matches: Vec<PortfolioLink> = scored
            .into_iter()
            .take(top_k)
            .map(|(_, indexed)| PortfolioLink::new(indexed.record.link.clone()))
            .collect();

        tracing::debug!("Portfolio query matched {} link(s)", matches.len());
        Ok(matches)
    }
}
