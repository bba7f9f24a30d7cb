//! Axum-based HTTP gateway.
//!
//! Every route answers the uniform envelope: `{"status": "success", ...}`
//! on the happy path, `{"status": "error", "message": ...}` with 400 for
//! validation failures and 500 for everything else. Body size limits and
//! request timeouts bound what a client can do to the process; CORS is
//! permissive because the mobile app calls straight from the device.

mod handlers;

use crate::config::Config;
use crate::judge::Judge;
use crate::providers::{AnthropicProvider, Provider};
use crate::store::Store;
use anyhow::Result;
use axum::{
    Router,
    http::StatusCode,
    routing::{delete, get, post},
};
use handlers::{
    handle_cart_add, handle_cart_clear, handle_cart_get, handle_cart_remove,
    handle_favorites_add, handle_favorites_get, handle_favorites_remove, handle_health,
    handle_history, handle_judge, handle_stats, handle_summary,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub judge: Arc<Judge>,
    pub store: Arc<Store>,
    /// Requests without a `user_id` resolve to this user.
    pub default_user_id: Arc<str>,
}

impl AppState {
    pub async fn from_config(config: &Config) -> Self {
        let provider: Arc<dyn Provider> = Arc::new(AnthropicProvider::with_base_url(
            config.api_key.as_deref(),
            config.base_url.as_deref(),
        ));
        let judge = Arc::new(Judge::new(
            provider,
            config.model.clone(),
            config.judge_max_tokens,
            config.summary_max_tokens,
        ));
        let store = Arc::new(Store::open(&config.store_path()).await);
        Self {
            judge,
            store,
            default_user_id: Arc::from(config.default_user_id.as_str()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/judge", post(handle_judge))
        .route("/cart/add", post(handle_cart_add))
        .route("/cart", get(handle_cart_get))
        .route("/cart/remove", delete(handle_cart_remove))
        .route("/cart/clear", post(handle_cart_clear))
        .route("/favorites/add", post(handle_favorites_add))
        .route("/favorites", get(handle_favorites_get))
        .route("/favorites/remove", delete(handle_favorites_remove))
        .route("/history", get(handle_history))
        .route("/stats", get(handle_stats))
        .route("/summary", get(handle_summary))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(CorsLayer::permissive())
}

/// Bind and serve the gateway.
pub async fn run_gateway(host: &str, port: u16, config: &Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, AppState::from_config(config).await).await
}

/// Serve the gateway from a pre-bound listener (tests bind their own
/// ephemeral port).
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    state: AppState,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("gateway listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        extract::{Query, State},
        response::IntoResponse,
    };
    use serde_json::{Value, json};
    use tempfile::TempDir;

    struct StaticProvider;

    #[async_trait]
    impl Provider for StaticProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _model: &str,
            _max_tokens: u32,
        ) -> anyhow::Result<String> {
            Ok(r#"{"food_name": "Oat milk", "overall_score": 78, "overall_rating": "GREAT"}"#
                .to_string())
        }
    }

    async fn make_test_state(tmp: &TempDir) -> AppState {
        let provider: Arc<dyn Provider> = Arc::new(StaticProvider);
        AppState {
            judge: Arc::new(Judge::new(provider, "test-model".to_string(), 1000, 300)),
            store: Arc::new(Store::open(&tmp.path().join("user_data.json")).await),
            default_user_id: Arc::from("default_user"),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn security_body_limit_is_64kb() {
        assert_eq!(MAX_BODY_SIZE, 65_536);
    }

    #[test]
    fn security_timeout_is_30_seconds() {
        assert_eq!(REQUEST_TIMEOUT_SECS, 30);
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn handle_health_reports_running() {
        let tmp = TempDir::new().unwrap();
        let state = make_test_state(&tmp).await;
        let response = handle_health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["message"].as_str().unwrap().contains("running"));
    }

    #[tokio::test]
    async fn judge_requires_food_query() {
        let tmp = TempDir::new().unwrap();
        let state = make_test_state(&tmp).await;
        let response = handle_judge(
            State(state),
            Ok(axum::Json(handlers::JudgeBody {
                food_query: String::new(),
                user_id: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
        assert!(json["message"].as_str().unwrap().contains("food_query"));
    }

    #[tokio::test]
    async fn judge_assigns_food_id_and_echoes_query() {
        let tmp = TempDir::new().unwrap();
        let state = make_test_state(&tmp).await;
        let response = handle_judge(
            State(state.clone()),
            Ok(axum::Json(handlers::JudgeBody {
                food_query: "oat milk".to_string(),
                user_id: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["judgment"]["food_id"], "food_1");
        assert_eq!(json["judgment"]["query"], "oat milk");

        // judgment lands in the default user's history
        let history = state.store.get_history("default_user").await;
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn cart_add_requires_food_item() {
        let tmp = TempDir::new().unwrap();
        let state = make_test_state(&tmp).await;
        let response = handle_cart_add(
            State(state),
            Ok(axum::Json(handlers::CartAddBody {
                food_item: None,
                user_id: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("food_item"));
    }

    #[tokio::test]
    async fn cart_round_trip_through_handlers() {
        let tmp = TempDir::new().unwrap();
        let state = make_test_state(&tmp).await;

        let added = handle_cart_add(
            State(state.clone()),
            Ok(axum::Json(handlers::CartAddBody {
                food_item: Some(json!({"food_id": "food_1", "overall_score": 78})),
                user_id: Some("shopper".to_string()),
            })),
        )
        .await
        .into_response();
        assert_eq!(added.status(), StatusCode::OK);

        let listed = handle_cart_get(
            State(state),
            Query(handlers::UserQuery {
                user_id: Some("shopper".to_string()),
            }),
        )
        .await
        .into_response();
        let json = body_json(listed).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["cart_items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_user_id_resolves_to_default() {
        let tmp = TempDir::new().unwrap();
        let state = make_test_state(&tmp).await;

        handle_cart_add(
            State(state.clone()),
            Ok(axum::Json(handlers::CartAddBody {
                food_item: Some(json!({"food_id": "food_1"})),
                user_id: Some("   ".to_string()),
            })),
        )
        .await
        .into_response();

        assert_eq!(state.store.get_cart("default_user").await.len(), 1);
    }
}
