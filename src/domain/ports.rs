use crate::domain::model::LlmRequest;
use crate::utils::error::{BackendError, Result};
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 取得單一網址的頁面文字
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String>;
}

/// Any text-generation provider: prompt in, raw text out.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> std::result::Result<String, BackendError>;

    fn name(&self) -> &str;
}
