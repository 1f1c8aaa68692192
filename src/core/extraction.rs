use crate::config::{ExtractionSettings, LlmSettings};
use crate::domain::model::{JobPosting, LlmRequest};
use crate::domain::ports::LlmBackend;
use crate::utils::error::{AgentError, LlmStage, Result};
use serde_json::Value;
use std::sync::Arc;

const EXTRACTION_PROMPT: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}
### INSTRUCTION:
The scraped text comes from the careers page of a website.
Extract every job posting it contains and return them as JSON with exactly these keys:
`role`, `experience`, `skills` and `description`.
`skills` must be a JSON array of strings.
Return a JSON array when there is more than one posting.
Only return the valid JSON.
### VALID JSON (NO PREAMBLE):"#;

/// Asks the LLM for structured job postings and validates the reply.
pub struct ExtractionStep {
    backend: Arc<dyn LlmBackend>,
    model: String,
    temperature: f32,
    max_input_chars: usize,
}

impl ExtractionStep {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        llm: &LlmSettings,
        settings: &ExtractionSettings,
    ) -> Self {
        Self {
            backend,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_input_chars: settings.max_input_chars,
        }
    }

    pub fn build_prompt(&self, cleaned_text: &str) -> String {
        let page_data = truncate_chars(cleaned_text, self.max_input_chars);
        if page_data.len() < cleaned_text.len() {
            tracing::warn!(
                "✂️ Page text truncated to {} characters before extraction",
                self.max_input_chars
            );
        }
        EXTRACTION_PROMPT.replace("{page_data}", page_data)
    }

    pub async fn extract(&self, cleaned_text: &str) -> Result<Vec<JobPosting>> {
        let request = LlmRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            prompt: self.build_prompt(cleaned_text),
        };

        tracing::debug!(
            "Sending extraction request to {} ({} prompt chars)",
            self.backend.name(),
            request.prompt.len()
        );

        let reply = self
            .backend
            .generate(request)
            .await
            .map_err(|source| AgentError::GenerationError {
                stage: LlmStage::Extraction,
                source,
            })?;

        let postings = parse_job_postings(&reply)?;
        tracing::info!("📋 Extracted {} job posting(s)", postings.len());
        Ok(postings)
    }
}

/// Parses a raw LLM reply into a non-empty list of postings.
pub fn parse_job_postings(reply: &str) -> Result<Vec<JobPosting>> {
    // 先當作純 JSON 解析，失敗才去掉 code fence
    let value: Value = match serde_json::from_str(reply.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(strip_code_fence(reply)).map_err(|e| {
            tracing::warn!("LLM reply is not valid JSON: {}", e);
            AgentError::extraction_parse(e.to_string())
        })?,
    };

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(AgentError::extraction_parse(format!(
                "expected a JSON object or array, got {}",
                json_type_name(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(AgentError::extraction_parse("reply contained no job postings"));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            posting_from_value(item)
                .map_err(|reason| AgentError::extraction_parse(format!("job #{}: {}", index + 1, reason)))
        })
        .collect()
}

fn posting_from_value(value: &Value) -> std::result::Result<JobPosting, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("expected an object, got {}", json_type_name(value)))?;

    // 有些模型會回傳 title 而不是 role
    let role = match object.get("role").or_else(|| object.get("title")) {
        Some(Value::String(role)) if !role.trim().is_empty() => role.trim().to_string(),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            return Err("missing `role`".to_string())
        }
        Some(other) => return Err(format!("`role` must be a string, got {}", json_type_name(other))),
    };

    let experience = match object.get("experience") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(years)) => years.to_string(),
        Some(other) => {
            return Err(format!(
                "`experience` must be a string, got {}",
                json_type_name(other)
            ))
        }
    };

    let skills = match object.get("skills") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(list)) => split_skill_list(list),
        Some(Value::Array(items)) => {
            let mut skills = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(skill) if !skill.trim().is_empty() => {
                        skills.push(skill.trim().to_string())
                    }
                    Value::String(_) => {}
                    other => {
                        return Err(format!(
                            "`skills` entries must be strings, got {}",
                            json_type_name(other)
                        ))
                    }
                }
            }
            skills
        }
        Some(other) => {
            return Err(format!(
                "`skills` must be an array of strings, got {}",
                json_type_name(other)
            ))
        }
    };

    let description = match object.get("description") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => {
            return Err(format!(
                "`description` must be a string, got {}",
                json_type_name(other)
            ))
        }
    };

    Ok(JobPosting {
        role,
        experience,
        skills,
        description,
    })
}

fn split_skill_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

/// 去掉 ```json ... ``` 包裝
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
