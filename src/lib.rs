pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::{ChatCompletionsClient, HttpPageLoader, LocalStorage};
pub use config::AgentConfig;
pub use core::{
    archive::DraftArchive,
    cleaner::clean_text,
    composer::EmailComposer,
    extraction::ExtractionStep,
    flow::{CoverMailFlow, RunFailure, RunOutcome, RunStage},
    portfolio::PortfolioIndex,
};
pub use utils::error::{AgentError, Result};
