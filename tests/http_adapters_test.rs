use httpmock::prelude::*;
use job_mailer::config::{FetchSettings, LlmSettings};
use job_mailer::core::{LlmBackend, PageLoader};
use job_mailer::domain::model::LlmRequest;
use job_mailer::utils::error::BackendError;
use job_mailer::{AgentError, ChatCompletionsClient, HttpPageLoader};

fn request(prompt: &str) -> LlmRequest {
    LlmRequest {
        model: "llama-3.3-70b-versatile".to_string(),
        temperature: 0.0,
        prompt: prompt.to_string(),
    }
}

fn client(server: &MockServer, api_key: Option<&str>) -> ChatCompletionsClient {
    let settings = LlmSettings {
        base_url: format!("{}/", server.base_url()),
        ..LlmSettings::default()
    };
    ChatCompletionsClient::new(&settings, api_key.map(str::to_string)).unwrap()
}

#[tokio::test]
async fn test_page_loader_returns_visible_text_only() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/careers/1");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(
                "<html><head><style>h1{color:red}</style></head><body>\
                 <h1>Senior Engineer</h1><script>track()</script>\
                 <noscript>enable js</noscript><p>Rust &amp; Go</p></body></html>",
            );
    });

    let loader = HttpPageLoader::new(&FetchSettings::default()).unwrap();
    let text = loader.load(&server.url("/careers/1")).await.unwrap();

    mock.assert();
    assert!(text.contains("Senior Engineer"));
    assert!(text.contains("Rust & Go"));
    assert!(!text.contains("track()"));
    assert!(!text.contains("color:red"));
    assert!(!text.contains("enable js"));
}

#[tokio::test]
async fn test_page_loader_rejects_non_html_content() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/brochure.pdf");
        then.status(200)
            .header("Content-Type", "application/pdf")
            .body("%PDF-1.4");
    });

    let loader = HttpPageLoader::new(&FetchSettings::default()).unwrap();
    let result = loader.load(&server.url("/brochure.pdf")).await;

    assert!(matches!(result, Err(AgentError::FetchError { .. })));
}

#[tokio::test]
async fn test_page_loader_rejects_plain_text_types() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/export.csv");
        then.status(200)
            .header("Content-Type", "text/csv")
            .body("a,b\n1,2");
    });

    let loader = HttpPageLoader::new(&FetchSettings::default()).unwrap();
    let result = loader.load(&server.url("/export.csv")).await;

    mock.assert();
    match result {
        Err(AgentError::FetchError { message, .. }) => assert!(message.contains("text/csv")),
        other => panic!("expected FetchError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_page_loader_maps_error_status_to_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gone");
        then.status(404);
    });

    let loader = HttpPageLoader::new(&FetchSettings::default()).unwrap();
    match loader.load(&server.url("/gone")).await {
        Err(AgentError::FetchError { url, message }) => {
            assert!(url.ends_with("/gone"));
            assert!(message.contains("404"));
        }
        other => panic!("expected FetchError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_client_sends_bearer_token_and_prompt() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer gsk_test")
            .json_body(serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "temperature": 0.0,
                "messages": [{"role": "user", "content": "Say hi"}]
            }));
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hi"}}]
        }));
    });

    let reply = client(&server, Some("gsk_test"))
        .generate(request("Say hi"))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(reply, "hi");
}

#[tokio::test]
async fn test_chat_client_reports_error_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500).body("upstream overloaded");
    });

    let result = client(&server, Some("gsk_test")).generate(request("x")).await;

    match result {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream overloaded");
        }
        other => panic!("expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_client_rejects_blank_reply() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "   "}}]
        }));
    });

    let result = client(&server, Some("gsk_test")).generate(request("x")).await;

    assert!(matches!(result, Err(BackendError::EmptyResponse)));
}

#[tokio::test]
async fn test_chat_client_without_key_sends_nothing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200);
    });

    let result = client(&server, None).generate(request("x")).await;

    mock.assert_hits(0);
    match result {
        Err(BackendError::MissingApiKey { var }) => assert_eq!(var, "GROQ_API_KEY"),
        other => panic!("expected MissingApiKey, got {:?}", other),
    }
}
