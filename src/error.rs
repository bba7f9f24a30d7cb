use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for ecocart.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum EcoError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    // Generic fallthrough (wraps anyhow for interop)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── LLM / provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} credentials not set")]
    Auth { provider: String },

    #[error("empty completion from provider {provider}")]
    EmptyCompletion { provider: String },
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed reading store file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed writing store file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed encoding store state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, EcoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = EcoError::Config(ConfigError::Validation("judge_max_tokens must be > 0".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn llm_request_error_names_provider() {
        let err = EcoError::Llm(LlmError::Request {
            provider: "anthropic".into(),
            message: "500 oops".into(),
        });
        assert!(err.to_string().contains("anthropic"));
        assert!(err.to_string().contains("500 oops"));
    }

    #[test]
    fn store_error_includes_path() {
        let err = EcoError::Store(StoreError::Read {
            path: "/tmp/user_data.json".into(),
            source: std::io::Error::other("boom"),
        });
        assert!(err.to_string().contains("user_data.json"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let eco_err: EcoError = anyhow_err.into();
        assert!(eco_err.to_string().contains("something went wrong"));
    }
}
