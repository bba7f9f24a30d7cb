use crate::error::LlmError;
use crate::providers::traits::Provider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Anthropic Messages API client.
pub struct AnthropicProvider {
    /// Pre-computed auth: `("Authorization", "Bearer <token>")` or `("x-api-key", "<key>")`.
    cached_auth: Option<(&'static str, String)>,
    cached_messages_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<&str>) -> Self {
        Self::with_base_url(api_key, None)
    }

    pub fn with_base_url(api_key: Option<&str>, base_url: Option<&str>) -> Self {
        let base = base_url
            .map_or("https://api.anthropic.com", |u| u.trim_end_matches('/'))
            .to_string();
        let cached_messages_url = format!("{base}/v1/messages");
        let cached_auth = api_key.map(str::trim).filter(|k| !k.is_empty()).map(|k| {
            if Self::is_setup_token(k) {
                ("Authorization", format!("Bearer {k}"))
            } else {
                ("x-api-key", k.to_string())
            }
        });
        Self {
            cached_auth,
            cached_messages_url,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(std::time::Duration::from_secs(90))
                .tcp_keepalive(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn is_setup_token(token: &str) -> bool {
        token.starts_with("sk-ant-oat01-")
    }

    fn build_request(prompt: &str, model: &str, max_tokens: u32) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        }
    }

    fn extract_text(chat_response: &ChatResponse) -> anyhow::Result<String> {
        let text = chat_response
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text.as_str()),
                ResponseContentBlock::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            Err(LlmError::EmptyCompletion {
                provider: "anthropic".into(),
            }
            .into())
        } else {
            Ok(text)
        }
    }

    async fn call_api(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let (auth_name, auth_value) = self.cached_auth.as_ref().ok_or(LlmError::Auth {
            provider: "anthropic".into(),
        })?;

        let response = self
            .client
            .post(&self.cached_messages_url)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .header(*auth_name, auth_value)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::api_error("anthropic", response).await);
        }

        response.json().await.map_err(anyhow::Error::msg)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> anyhow::Result<String> {
        let request = Self::build_request(prompt, model, max_tokens);
        let chat_response = self.call_api(&request).await?;
        Self::extract_text(&chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_with_key() {
        let p = AnthropicProvider::new(Some("sk-ant-test123"));
        let (name, value) = p.cached_auth.as_ref().unwrap();
        assert_eq!(*name, "x-api-key");
        assert_eq!(value, "sk-ant-test123");
        assert_eq!(
            p.cached_messages_url,
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn creates_without_key() {
        let p = AnthropicProvider::new(None);
        assert!(p.cached_auth.is_none());
    }

    #[test]
    fn empty_or_whitespace_key_counts_as_unset() {
        assert!(AnthropicProvider::new(Some("")).cached_auth.is_none());
        let p = AnthropicProvider::new(Some("  sk-ant-test123  "));
        let (_, value) = p.cached_auth.as_ref().unwrap();
        assert_eq!(value, "sk-ant-test123");
    }

    #[test]
    fn setup_token_uses_bearer_auth() {
        let p = AnthropicProvider::new(Some("sk-ant-oat01-abc123"));
        let (name, value) = p.cached_auth.as_ref().unwrap();
        assert_eq!(*name, "Authorization");
        assert_eq!(value, "Bearer sk-ant-oat01-abc123");
    }

    #[test]
    fn custom_base_url_trims_trailing_slash() {
        let p = AnthropicProvider::with_base_url(None, Some("https://api.example.com/"));
        assert_eq!(p.cached_messages_url, "https://api.example.com/v1/messages");
    }

    #[tokio::test]
    async fn complete_fails_without_key() {
        let p = AnthropicProvider::new(None);
        let result = p.complete("rate this apple", "claude-sonnet-4", 100).await;
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("credentials not set"),
            "expected auth error, got: {err}"
        );
    }

    #[test]
    fn chat_request_serializes() {
        let req = AnthropicProvider::build_request("judge: oat milk", "claude-sonnet-4", 1000);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "judge: oat milk");
    }

    #[test]
    fn chat_response_deserializes() {
        let json = r#"{"content":[{"type":"text","text":"Hello there!"}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(AnthropicProvider::extract_text(&resp).unwrap(), "Hello there!");
    }

    #[test]
    fn unsupported_blocks_are_skipped() {
        let json = r#"{"content":[
            {"type":"thinking","thinking":"hmm"},
            {"type":"text","text":"First"},
            {"type":"text","text":"Second"}
        ]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            AnthropicProvider::extract_text(&resp).unwrap(),
            "First\nSecond"
        );
    }

    #[test]
    fn empty_content_is_an_error() {
        let resp: ChatResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        let err = AnthropicProvider::extract_text(&resp).unwrap_err();
        assert!(err.to_string().contains("empty completion"));
    }
}
