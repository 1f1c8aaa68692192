use clap::Parser;
use job_mailer::core::LlmBackend;
use job_mailer::utils::error::ErrorSeverity;
use job_mailer::utils::{logger, validation::{self, Validate}};
use job_mailer::{
    AgentConfig, ChatCompletionsClient, CliArgs, CoverMailFlow, DraftArchive, EmailComposer,
    ExtractionStep, HttpPageLoader, LocalStorage, PortfolioIndex, RunOutcome, RunStage,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn show_progress(stage: RunStage) {
    let line = match stage {
        RunStage::Fetching => "🔍 Loading job description from URL...".to_string(),
        RunStage::Extracting => "📋 Analyzing job requirements...".to_string(),
        RunStage::Matching { job, of } => {
            format!("🧩 Querying portfolio for matches (job {}/{})...", job + 1, of)
        }
        RunStage::Composing { job, of } => {
            format!("✍️ Crafting personalized email (job {}/{})...", job + 1, of)
        }
        _ => return,
    };
    eprintln!("{}", line);
}

async fn present(outcome: &RunOutcome, archive: Option<&DraftArchive<LocalStorage>>) {
    match outcome {
        RunOutcome::Done(report) => {
            println!("\n📤 Personalized Application Email(s)\n");
            for (index, draft) in report.drafts.iter().enumerate() {
                println!("=== Email {} of {} ===", index + 1, report.drafts.len());
                println!("For: {}", draft.job.role);
                println!();
                println!("{}", draft.body);
                println!();
            }

            if let Some(archive) = archive {
                match archive.save(report).await {
                    Ok(name) => println!("📁 Drafts saved to: {}", name),
                    Err(e) => eprintln!("⚠️ Could not save drafts: {}", e.user_friendly_message()),
                }
            }
        }
        RunOutcome::Failed(failure) => {
            eprintln!("⚠️ An error occurred: {}", failure.message());
            eprintln!("💡 {}", failure.error.recovery_suggestion());
        }
    }
}

fn exit_code(outcome: &RunOutcome) -> i32 {
    match outcome.failure() {
        None => 0,
        Some(failure) => match failure.error.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => match AgentConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => AgentConfig::default(),
    };
    args.apply_to(&mut config);

    if config.monitoring.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let api_key = config.api_key();
    if api_key.is_none() {
        // 保留原本行為：啟動時不中止，第一次呼叫 LLM 才失敗
        tracing::warn!(
            "⚠️ {} is not set; LLM calls will fail until it is provided",
            config.llm.api_key_env
        );
    }

    let mut portfolio = PortfolioIndex::new(config.portfolio.clone());
    if let Err(e) = portfolio.load(&LocalStorage::new(".")).await {
        tracing::error!("❌ Failed to load portfolio: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let backend: Arc<dyn LlmBackend> = Arc::new(ChatCompletionsClient::new(&config.llm, api_key)?);
    let flow = CoverMailFlow::new(
        Arc::new(HttpPageLoader::new(&config.fetch)?),
        ExtractionStep::new(backend.clone(), &config.llm, &config.extraction),
        EmailComposer::new(backend, &config.llm, config.composer.clone()),
        Arc::new(portfolio),
    )
    .with_monitoring(config.monitoring.enabled);

    let archive = config.output.save_drafts.then(|| {
        DraftArchive::new(
            LocalStorage::new(&config.output.output_path),
            config.output.archive_name.clone(),
        )
    });

    if let Some(url) = &args.url {
        if let Err(e) = validation::validate_url("--url", url) {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        let outcome = flow.run_with_progress(url, show_progress).await;
        present(&outcome, archive.as_ref()).await;
        let code = exit_code(&outcome);
        if code > 0 {
            std::process::exit(code);
        }
        return Ok(());
    }

    println!("📧 Job Application Email Agent");
    println!("Paste a job listing URL to generate tailored application emails.");
    println!("Press Enter to use the default URL, type 'quit' to leave.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Job listing URL [{}]: ", config.fetch.default_url);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if matches!(input, "quit" | "exit") {
            break;
        }
        let url = if input.is_empty() {
            config.fetch.default_url.as_str()
        } else {
            input
        };

        if let Err(e) = validation::validate_url("url", url) {
            eprintln!("⚠️ {}", e);
            continue;
        }

        let outcome = flow.run_with_progress(url, show_progress).await;
        present(&outcome, archive.as_ref()).await;
        println!();
    }

    tracing::info!("👋 Bye");
    Ok(())
}
