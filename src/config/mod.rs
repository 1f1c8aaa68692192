pub mod toml_config;

pub use toml_config::{
    AgentConfig, ComposerSettings, ExtractionSettings, FetchSettings, LlmSettings,
    MonitoringSettings, OutputSettings, PortfolioSettings,
};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "job-mailer")]
#[command(about = "Turn a job listing URL into tailored application emails")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Process this URL once and exit instead of starting the interactive prompt
    #[arg(long)]
    pub url: Option<String>,

    /// Portfolio CSV, overrides portfolio.dataset
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Number of portfolio links matched per job
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Write every finished run to a zip archive in the output directory
    #[arg(long)]
    pub save: bool,

    /// Log stage timings and memory usage
    #[arg(long)]
    pub monitor: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliArgs {
    /// 命令列參數覆蓋設定檔
    pub fn apply_to(&self, config: &mut AgentConfig) {
        if let Some(portfolio) = &self.portfolio {
            config.portfolio.dataset = portfolio.clone();
        }
        if let Some(top_k) = self.top_k {
            config.portfolio.top_k = top_k;
        }
        if self.save {
            config.output.save_drafts = true;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = CliArgs::parse_from([
            "job-mailer",
            "--portfolio",
            "data/projects.csv",
            "--top-k",
            "4",
            "--save",
        ]);
        let mut config = AgentConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.portfolio.dataset, "data/projects.csv");
        assert_eq!(config.portfolio.top_k, 4);
        assert!(config.output.save_drafts);
        assert!(!config.monitoring.enabled);
    }

    #[test]
    fn test_no_flags_keep_file_values() {
        let args = CliArgs::parse_from(["job-mailer"]);
        let mut config = AgentConfig::default();
        config.portfolio.top_k = 5;
        args.apply_to(&mut config);

        assert_eq!(config.portfolio.top_k, 5);
        assert!(args.url.is_none());
    }
}
