pub mod anthropic;
pub mod scrub;
pub mod traits;

pub use anthropic::AnthropicProvider;
pub use scrub::{api_error, sanitize_api_error};
pub use traits::Provider;
