use crate::utils::error::{AgentError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// 整個代理程式的設定，所有欄位都有預設值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub llm: LlmSettings,
    pub fetch: FetchSettings,
    pub extraction: ExtractionSettings,
    pub portfolio: PortfolioSettings,
    pub composer: ComposerSettings,
    pub output: OutputSettings,
    pub monitoring: MonitoringSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Name of the environment variable holding the key, not the key itself.
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub default_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            default_url:
                "https://careers.kpmg.com.sg/job/ASPAC-Tax-Technology-and-Transformation-Manager/32443044/"
                    .to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub max_input_chars: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_input_chars: 12_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSettings {
    pub dataset: String,
    pub skills_column: String,
    pub link_column: String,
    pub top_k: usize,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            dataset: "my_portfolio.csv".to_string(),
            skills_column: "Techstack".to_string(),
            link_column: "Links".to_string(),
            top_k: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    pub contact_link: String,
    pub sender_name: String,
    pub max_portfolio_links: usize,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            contact_link: "https://personal-jnky.web.app/".to_string(),
            sender_name: "Joel".to_string(),
            max_portfolio_links: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub output_path: String,
    pub save_drafts: bool,
    pub archive_name: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            save_drafts: false,
            archive_name: "job_mail_drafts.zip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    pub enabled: bool,
    pub json_logs: bool,
}

impl AgentConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AgentError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AgentError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PORTFOLIO_CSV})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// Reads the key named by `llm.api_key_env`. A missing key is not an
    /// error here; the first LLM call reports it.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Validate for AgentConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("llm.base_url", &self.llm.base_url)?;
        validation::validate_non_empty_string("llm.model", &self.llm.model)?;
        validation::validate_non_empty_string("llm.api_key_env", &self.llm.api_key_env)?;
        validation::validate_range("llm.temperature", self.llm.temperature, 0.0, 2.0)?;
        validation::validate_positive_number("llm.timeout_seconds", self.llm.timeout_seconds as usize, 1)?;

        validation::validate_url("fetch.default_url", &self.fetch.default_url)?;
        validation::validate_positive_number("fetch.timeout_seconds", self.fetch.timeout_seconds as usize, 1)?;

        validation::validate_positive_number(
            "extraction.max_input_chars",
            self.extraction.max_input_chars,
            256,
        )?;

        validation::validate_path("portfolio.dataset", &self.portfolio.dataset)?;
        validation::validate_file_extension("portfolio.dataset", &self.portfolio.dataset, &["csv"])?;
        validation::validate_non_empty_string("portfolio.skills_column", &self.portfolio.skills_column)?;
        validation::validate_non_empty_string("portfolio.link_column", &self.portfolio.link_column)?;
        validation::validate_positive_number("portfolio.top_k", self.portfolio.top_k, 1)?;

        validation::validate_url("composer.contact_link", &self.composer.contact_link)?;
        validation::validate_non_empty_string("composer.sender_name", &self.composer.sender_name)?;

        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_file_extension("output.archive_name", &self.output.archive_name, &["zip"])?;

        Ok(())
    }
}
