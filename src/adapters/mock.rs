//! In-memory backends for tests and offline runs.

use crate::domain::model::LlmRequest;
use crate::domain::ports::{LlmBackend, PageLoader};
use crate::utils::error::{AgentError, BackendError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug)]
pub enum MockReply {
    Text(String),
    Error(BackendError),
    /// Answers with the prompt itself.
    Echo,
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        MockReply::Text(content.into())
    }

    pub fn error(error: BackendError) -> Self {
        MockReply::Error(error)
    }
}

/// LLM backend answering from a queue and recording every request.
#[derive(Default)]
pub struct MockLlm {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().map(|replies| replies.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmBackend for MockLlm {
    async fn generate(&self, request: LlmRequest) -> std::result::Result<String, BackendError> {
        let reply = self
            .replies
            .lock()
            .map_err(|_| BackendError::Other("mock reply queue poisoned".to_string()))?
            .pop_front();

        let prompt = request.prompt.clone();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(error)) => Err(error),
            Some(MockReply::Echo) => Ok(prompt),
            None => Err(BackendError::Other("no mock reply queued".to_string())),
        }
    }

    fn name(&self) -> &str {
        "MockLlm"
    }
}

/// Page loader serving fixed text per URL.
#[derive(Default)]
pub struct StaticPageLoader {
    pages: HashMap<String, String>,
}

impl StaticPageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.insert(url.into(), text.into());
        self
    }
}

#[async_trait]
impl PageLoader for StaticPageLoader {
    async fn load(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AgentError::fetch(url, "404 Not Found"))
    }
}
