use std::fmt;
use thiserror::Error;

/// 執行到哪個 LLM 階段時失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmStage {
    Extraction,
    Composition,
}

impl fmt::Display for LlmStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmStage::Extraction => write!(f, "job extraction"),
            LlmStage::Composition => write!(f, "email composition"),
        }
    }
}

/// LLM 後端傳輸層錯誤
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("API key missing: environment variable {var} is not set")]
    MissingApiKey { var: String },

    #[error("request to LLM backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM backend returned no content")]
    EmptyResponse,

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to fetch {url}: {message}")]
    FetchError { url: String, message: String },

    #[error("Context too big. Unable to parse jobs. ({detail})")]
    ExtractionParseError { detail: String },

    #[error("Portfolio index queried before any record was loaded")]
    IndexNotLoadedError,

    #[error("LLM call during {stage} failed: {source}")]
    GenerationError {
        stage: LlmStage,
        #[source]
        source: BackendError,
    },

    #[error("Portfolio dataset error: {message}")]
    PortfolioDatasetError { message: String },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Llm,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AgentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AgentError::FetchError { .. } | AgentError::HttpError(_) => ErrorCategory::Network,
            AgentError::ExtractionParseError { .. } | AgentError::GenerationError { .. } => {
                ErrorCategory::Llm
            }
            AgentError::IndexNotLoadedError
            | AgentError::PortfolioDatasetError { .. }
            | AgentError::CsvError(_)
            | AgentError::SerializationError(_) => ErrorCategory::Data,
            AgentError::ConfigError { .. }
            | AgentError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AgentError::ZipError(_) | AgentError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Llm => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的單行訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            AgentError::FetchError { url, message } => {
                format!("Could not load the job listing at {}: {}", url, message)
            }
            AgentError::ExtractionParseError { .. } => {
                "Context too big. Unable to parse jobs from this page.".to_string()
            }
            AgentError::IndexNotLoadedError => {
                "The portfolio has not been loaded yet, so no projects can be matched.".to_string()
            }
            AgentError::GenerationError { stage, source } => match source {
                BackendError::MissingApiKey { var } => {
                    format!("The language model cannot be reached: {} is not set.", var)
                }
                _ => format!("The language model failed during {}.", stage),
            },
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AgentError::FetchError { .. } | AgentError::HttpError(_) => {
                "Check the URL and your network connection, then try again."
            }
            AgentError::ExtractionParseError { .. } => {
                "Try a page that lists fewer jobs, or lower extraction.max_input_chars."
            }
            AgentError::IndexNotLoadedError | AgentError::PortfolioDatasetError { .. } => {
                "Make sure the portfolio CSV exists and contains at least one row."
            }
            AgentError::GenerationError {
                source: BackendError::MissingApiKey { .. },
                ..
            } => "Export the API key (or add it to .env) and restart.",
            AgentError::GenerationError { .. } => {
                "The LLM backend may be busy or rate limited; trigger the run again."
            }
            AgentError::ConfigError { .. }
            | AgentError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags."
            }
            AgentError::CsvError(_) | AgentError::SerializationError(_) => {
                "Inspect the input data for malformed rows."
            }
            AgentError::ZipError(_) | AgentError::IoError(_) => {
                "Check disk space and permissions of the output directory."
            }
        }
    }

    pub fn fetch(url: &str, message: impl Into<String>) -> Self {
        AgentError::FetchError {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn extraction_parse(detail: impl Into<String>) -> Self {
        AgentError::ExtractionParseError {
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_parse_message_mentions_context() {
        let err = AgentError::extraction_parse("expected value at line 1 column 1");
        assert!(err.to_string().starts_with("Context too big. Unable to parse jobs."));
        assert!(err.user_friendly_message().contains("Context too big"));
        assert_eq!(err.category(), ErrorCategory::Llm);
    }

    #[test]
    fn test_missing_api_key_is_reported_with_variable_name() {
        let err = AgentError::GenerationError {
            stage: LlmStage::Composition,
            source: BackendError::MissingApiKey {
                var: "GROQ_API_KEY".to_string(),
            },
        };
        assert!(err.user_friendly_message().contains("GROQ_API_KEY"));
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_config_errors_share_category_and_suggestion() {
        let errors = [
            AgentError::ConfigError {
                message: "TOML parsing error".to_string(),
            },
            AgentError::InvalidConfigValueError {
                field: "portfolio.top_k".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            },
        ];
        for err in errors {
            assert_eq!(err.category(), ErrorCategory::Configuration);
            assert_eq!(
                err.recovery_suggestion(),
                "Fix the configuration file or command-line flags."
            );
        }
    }

    #[test]
    fn test_index_not_loaded_is_data_error() {
        let err = AgentError::IndexNotLoadedError;
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
