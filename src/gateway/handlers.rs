use super::AppState;
use crate::store::UserStats;
use crate::util::truncate_with_ellipsis;
use axum::{
    extract::rejection::JsonRejection,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Failures crossing the route boundary, rendered as the uniform error
/// envelope: 400 for validation problems, 500 for everything else.
pub(super) enum ApiError {
    Validation(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(error) => {
                tracing::error!("request failed: {error:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{error:#}"))
            }
        };
        (status, Json(json!({"status": "error", "message": message}))).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self::Internal(error.into())
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

// ── Request bodies ───────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct JudgeBody {
    #[serde(default)]
    pub(super) food_query: String,
    #[serde(default)]
    pub(super) user_id: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct CartAddBody {
    #[serde(default)]
    pub(super) food_item: Option<Value>,
    #[serde(default)]
    pub(super) user_id: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct RemoveBody {
    #[serde(default)]
    pub(super) food_id: String,
    #[serde(default)]
    pub(super) user_id: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct UserQuery {
    #[serde(default)]
    pub(super) user_id: Option<String>,
}

/// The one place `user_id` defaults are resolved: an absent or blank id
/// becomes the configured default user.
fn resolve_user(state: &AppState, requested: Option<&str>) -> String {
    match requested {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => state.default_user_id.to_string(),
    }
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(parsed)) => Ok(parsed),
        Err(rejection) => Err(ApiError::Validation(format!("invalid JSON body: {rejection}"))),
    }
}

// ── Routes ───────────────────────────────────────────────────────

/// GET /health
pub(super) async fn handle_health(State(_state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "ecocart sustainability judge is running",
    }))
}

/// POST /judge — evaluate one food item, assign it a `food_id`, and record
/// the judgment in the user's history.
pub(super) async fn handle_judge(
    State(state): State<AppState>,
    body: Result<Json<JudgeBody>, JsonRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    if body.food_query.trim().is_empty() {
        return Err(ApiError::Validation("food_query is required".into()));
    }
    let user_id = resolve_user(&state, body.user_id.as_deref());
    tracing::info!(
        user_id,
        query = %truncate_with_ellipsis(&body.food_query, 80),
        "judging food item"
    );

    let mut judgment = state.judge.evaluate_food(&body.food_query).await;
    let food_id = format!("food_{}", state.store.food_count(&user_id).await + 1);
    if let Some(object) = judgment.as_object_mut() {
        object.insert("food_id".into(), Value::String(food_id));
        object.insert("query".into(), Value::String(body.food_query.clone()));
    }
    state.store.add_to_history(&user_id, judgment.clone()).await;

    Ok(Json(json!({"status": "success", "judgment": judgment})))
}

/// POST /cart/add
pub(super) async fn handle_cart_add(
    State(state): State<AppState>,
    body: Result<Json<CartAddBody>, JsonRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    let Some(food_item) = body.food_item else {
        return Err(ApiError::Validation("food_item is required".into()));
    };
    let user_id = resolve_user(&state, body.user_id.as_deref());
    state.store.add_to_cart(&user_id, food_item).await;
    Ok(Json(json!({"status": "success", "message": "Item added to cart"})))
}

/// GET /cart
pub(super) async fn handle_cart_get(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult {
    let user_id = resolve_user(&state, query.user_id.as_deref());
    let cart_items = state.store.get_cart(&user_id).await;
    Ok(Json(json!({"status": "success", "cart_items": cart_items})))
}

/// DELETE /cart/remove
pub(super) async fn handle_cart_remove(
    State(state): State<AppState>,
    body: Result<Json<RemoveBody>, JsonRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    let user_id = resolve_user(&state, body.user_id.as_deref());
    state.store.remove_from_cart(&user_id, &body.food_id).await;
    Ok(Json(json!({"status": "success", "message": "Item removed from cart"})))
}

/// POST /cart/clear
pub(super) async fn handle_cart_clear(
    State(state): State<AppState>,
    body: Result<Json<UserQuery>, JsonRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    let user_id = resolve_user(&state, body.user_id.as_deref());
    state.store.clear_cart(&user_id).await;
    Ok(Json(json!({"status": "success", "message": "Cart cleared"})))
}

/// POST /favorites/add
pub(super) async fn handle_favorites_add(
    State(state): State<AppState>,
    body: Result<Json<CartAddBody>, JsonRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    let Some(food_item) = body.food_item else {
        return Err(ApiError::Validation("food_item is required".into()));
    };
    let user_id = resolve_user(&state, body.user_id.as_deref());
    state.store.add_to_favorites(&user_id, food_item).await;
    Ok(Json(json!({"status": "success", "message": "Item added to favorites"})))
}

/// GET /favorites
pub(super) async fn handle_favorites_get(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult {
    let user_id = resolve_user(&state, query.user_id.as_deref());
    let favorites = state.store.get_favorites(&user_id).await;
    Ok(Json(json!({"status": "success", "favorites": favorites})))
}

/// DELETE /favorites/remove
pub(super) async fn handle_favorites_remove(
    State(state): State<AppState>,
    body: Result<Json<RemoveBody>, JsonRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    let user_id = resolve_user(&state, body.user_id.as_deref());
    state
        .store
        .remove_from_favorites(&user_id, &body.food_id)
        .await;
    Ok(Json(json!({"status": "success", "message": "Item removed from favorites"})))
}

/// GET /history
pub(super) async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult {
    let user_id = resolve_user(&state, query.user_id.as_deref());
    let history = state.store.get_history(&user_id).await;
    Ok(Json(json!({"status": "success", "history": history})))
}

/// GET /stats
pub(super) async fn handle_stats(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult {
    let user_id = resolve_user(&state, query.user_id.as_deref());
    let stats: UserStats = state.store.get_user_stats(&user_id).await;
    let stats = serde_json::to_value(stats)?;
    Ok(Json(json!({"status": "success", "stats": stats})))
}

/// GET /summary
pub(super) async fn handle_summary(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult {
    let user_id = resolve_user(&state, query.user_id.as_deref());
    let cart_items = state.store.get_cart(&user_id).await;
    let summary = state.judge.generate_summary(&cart_items).await;
    Ok(Json(json!({"status": "success", "summary": summary})))
}
