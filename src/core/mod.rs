pub mod archive;
pub mod cleaner;
pub mod composer;
pub mod extraction;
pub mod flow;
pub mod portfolio;

pub use crate::domain::model::{EmailDraft, JobPosting, PortfolioLink, PortfolioRecord, RunReport};
pub use crate::domain::ports::{LlmBackend, PageLoader, Storage};
pub use crate::utils::error::Result;
