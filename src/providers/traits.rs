use async_trait::async_trait;

/// Seam over the external text-generation API.
///
/// One call per judgment: a single user prompt in, the model's plain-text
/// reply out. Implementations own their transport, auth, and error
/// sanitization.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str, max_tokens: u32)
    -> anyhow::Result<String>;
}
