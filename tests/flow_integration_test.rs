use httpmock::prelude::*;
use job_mailer::config::{ComposerSettings, ExtractionSettings, FetchSettings, LlmSettings, PortfolioSettings};
use job_mailer::core::LlmBackend;
use job_mailer::{
    AgentError, ChatCompletionsClient, CoverMailFlow, DraftArchive, EmailComposer, ExtractionStep,
    HttpPageLoader, LocalStorage, PortfolioIndex, RunStage,
};
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

const JOB_PAGE: &str = r#"<html>
<head><title>Careers</title><script>window.tracking = "abc";</script></head>
<body>
  <h1>Data Analyst</h1>
  <p>2+ years of experience with Python and SQL.</p>
  <p>Apply at https://careers.example.com/apply</p>
</body>
</html>"#;

const PORTFOLIO_CSV: &str = "Techstack,Links\n\
\"React, Node.js\",https://example.com/react-portfolio\n\
\"Python, SQL\",https://example.com/python-portfolio\n";

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}}
        ]
    })
}

async fn build_flow(server: &MockServer, temp_dir: &TempDir) -> CoverMailFlow {
    std::fs::write(temp_dir.path().join("my_portfolio.csv"), PORTFOLIO_CSV).unwrap();

    let llm_settings = LlmSettings {
        base_url: server.base_url(),
        ..LlmSettings::default()
    };
    let backend: Arc<dyn LlmBackend> = Arc::new(
        ChatCompletionsClient::new(&llm_settings, Some("test-key".to_string())).unwrap(),
    );

    let mut portfolio = PortfolioIndex::new(PortfolioSettings {
        top_k: 1,
        ..PortfolioSettings::default()
    });
    let storage = LocalStorage::new(temp_dir.path());
    assert_eq!(portfolio.load(&storage).await.unwrap(), 2);

    CoverMailFlow::new(
        Arc::new(HttpPageLoader::new(&FetchSettings::default()).unwrap()),
        ExtractionStep::new(backend.clone(), &llm_settings, &ExtractionSettings::default()),
        EmailComposer::new(backend, &llm_settings, ComposerSettings::default()),
        Arc::new(portfolio),
    )
}

#[tokio::test]
async fn test_single_job_page_produces_one_email() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/jobs/data-analyst");
        then.status(200)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(JOB_PAGE);
    });

    let extract_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer test-key")
            .body_contains("### SCRAPED TEXT");
        then.status(200).json_body(chat_reply(
            r#"[{"role":"Data Analyst","experience":"2+ years","skills":["Python","SQL"],"description":"Analyze data"}]"#,
        ));
    });

    let compose_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### JOB DESCRIPTION")
            .body_contains("https://example.com/python-portfolio");
        then.status(200)
            .json_body(chat_reply("Dear Hiring Manager, I am excited to apply..."));
    });

    let flow = build_flow(&server, &temp_dir).await;
    let mut stages = Vec::new();
    let outcome = flow
        .run_with_progress(&server.url("/jobs/data-analyst"), |stage| stages.push(stage))
        .await;

    page_mock.assert();
    extract_mock.assert();
    compose_mock.assert();

    let report = outcome.report().expect("run should finish");
    assert_eq!(report.drafts.len(), 1);
    assert_eq!(report.drafts[0].job.role, "Data Analyst");
    assert_eq!(report.drafts[0].job.skills, vec!["Python", "SQL"]);
    assert_eq!(
        report.drafts[0].portfolio[0].link,
        "https://example.com/python-portfolio"
    );
    assert_eq!(report.drafts[0].body, "Dear Hiring Manager, I am excited to apply...");
    assert_eq!(stages.last(), Some(&RunStage::Done));

    // 存檔後 zip 內應有 jobs.json 與一份草稿
    let archive = DraftArchive::new(LocalStorage::new(temp_dir.path()), "drafts.zip");
    archive.save(report).await.unwrap();
    let zip_data = std::fs::read(temp_dir.path().join("drafts.zip")).unwrap();
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(zip.len(), 2);
    let mut draft = String::new();
    zip.by_name("draft_01.md")
        .unwrap()
        .read_to_string(&mut draft)
        .unwrap();
    assert!(draft.contains("Dear Hiring Manager"));
}

#[tokio::test]
async fn test_invalid_extraction_reply_never_reaches_composer() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/jobs/broken");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(JOB_PAGE);
    });

    let extract_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### SCRAPED TEXT");
        then.status(200).json_body(chat_reply("{invalid"));
    });

    let compose_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### JOB DESCRIPTION");
        then.status(200).json_body(chat_reply("Dear Hiring Manager"));
    });

    let flow = build_flow(&server, &temp_dir).await;
    let outcome = flow.run(&server.url("/jobs/broken")).await;

    extract_mock.assert();
    compose_mock.assert_hits(0);

    let failure = outcome.failure().expect("run should fail");
    assert_eq!(failure.stage, RunStage::Extracting);
    assert!(matches!(failure.error, AgentError::ExtractionParseError { .. }));
    assert!(failure.message().contains("Context too big"));
}

#[tokio::test]
async fn test_unreachable_page_fails_at_fetching() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/jobs/missing");
        then.status(404).body("not found");
    });
    let llm_mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_reply("[]"));
    });

    let flow = build_flow(&server, &temp_dir).await;
    let outcome = flow.run(&server.url("/jobs/missing")).await;

    llm_mock.assert_hits(0);
    let failure = outcome.failure().expect("run should fail");
    assert_eq!(failure.stage, RunStage::Fetching);
    assert!(matches!(failure.error, AgentError::FetchError { .. }));
}

#[tokio::test]
async fn test_missing_api_key_fails_on_first_llm_call() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    std::fs::write(temp_dir.path().join("my_portfolio.csv"), PORTFOLIO_CSV).unwrap();

    server.mock(|when, then| {
        when.method(GET).path("/jobs/data-analyst");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(JOB_PAGE);
    });
    let llm_mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_reply("[]"));
    });

    let llm_settings = LlmSettings {
        base_url: server.base_url(),
        ..LlmSettings::default()
    };
    let backend: Arc<dyn LlmBackend> =
        Arc::new(ChatCompletionsClient::new(&llm_settings, None).unwrap());
    let mut portfolio = PortfolioIndex::new(PortfolioSettings::default());
    portfolio.load(&LocalStorage::new(temp_dir.path())).await.unwrap();

    let flow = CoverMailFlow::new(
        Arc::new(HttpPageLoader::new(&FetchSettings::default()).unwrap()),
        ExtractionStep::new(backend.clone(), &llm_settings, &ExtractionSettings::default()),
        EmailComposer::new(backend, &llm_settings, ComposerSettings::default()),
        Arc::new(portfolio),
    );
    let outcome = flow.run(&server.url("/jobs/data-analyst")).await;

    llm_mock.assert_hits(0);
    let failure = outcome.failure().expect("run should fail");
    assert_eq!(failure.stage, RunStage::Extracting);
    assert!(matches!(failure.error, AgentError::GenerationError { .. }));
}
