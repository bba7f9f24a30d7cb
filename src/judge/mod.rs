//! Sustainability judge: prompts the external model with the fixed rubric,
//! extracts its JSON verdict, and aggregates carts into summaries.

mod extract;
mod rubric;

pub use extract::{ExtractError, extract_json_object};
pub use rubric::SCORING_RUBRIC;

use crate::providers::Provider;
use crate::store::{item_rating, item_score};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Great,
    Good,
    Average,
    Poor,
    Error,
}

/// Counts per rating bucket. ERROR and unrecognized ratings are not
/// distributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    #[serde(rename = "GREAT")]
    pub great: usize,
    #[serde(rename = "GOOD")]
    pub good: usize,
    #[serde(rename = "AVERAGE")]
    pub average: usize,
    #[serde(rename = "POOR")]
    pub poor: usize,
}

impl RatingDistribution {
    fn record(&mut self, rating: &str) {
        match Rating::from_str(rating) {
            Ok(Rating::Great) => self.great += 1,
            Ok(Rating::Good) => self.good += 1,
            Ok(Rating::Average) => self.average += 1,
            Ok(Rating::Poor) => self.poor += 1,
            Ok(Rating::Error) | Err(_) => {}
        }
    }

    fn display(&self) -> String {
        format!(
            "GREAT: {}, GOOD: {}, AVERAGE: {}, POOR: {}",
            self.great, self.good, self.average, self.poor
        )
    }
}

/// One slice of the summary chart consumed by the mobile app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSlice {
    pub name: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSummary {
    pub average_score: f64,
    pub total_items: usize,
    pub rating_distribution: RatingDistribution,
    pub chart_data: Vec<ChartSlice>,
    pub summary_text: String,
    pub recommendations: Vec<String>,
}

impl CartSummary {
    fn empty() -> Self {
        Self {
            average_score: 0.0,
            total_items: 0,
            rating_distribution: RatingDistribution::default(),
            chart_data: Vec::new(),
            summary_text: "Your cart is empty.".to_string(),
            recommendations: Vec::new(),
        }
    }
}

fn chart_data(distribution: &RatingDistribution) -> Vec<ChartSlice> {
    let slice = |name: &str, count: usize, color: &str| ChartSlice {
        name: name.to_string(),
        count,
        color: color.to_string(),
    };
    vec![
        slice("GREAT", distribution.great, "#4CAF50"),
        slice("GOOD", distribution.good, "#8BC34A"),
        slice("AVERAGE", distribution.average, "#FF9800"),
        slice("POOR", distribution.poor, "#F44336"),
    ]
}

/// Reply lines that look like a list entry (digit, hyphen, or asterisk
/// first) are taken as recommendations.
fn extract_recommendation_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '*')
        })
        .map(ToString::to_string)
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub struct Judge {
    provider: Arc<dyn Provider>,
    model: String,
    judge_max_tokens: u32,
    summary_max_tokens: u32,
}

impl Judge {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: String,
        judge_max_tokens: u32,
        summary_max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            model,
            judge_max_tokens,
            summary_max_tokens,
        }
    }

    /// Evaluate a food item against the rubric. Never fails: transport or
    /// extraction problems degrade to a synthetic ERROR judgment with the
    /// cause in `rationale`.
    pub async fn evaluate_food(&self, food_query: &str) -> Value {
        match self.try_evaluate(food_query).await {
            Ok(judgment) => judgment,
            Err(e) => {
                tracing::warn!("food evaluation degraded to error judgment: {e:#}");
                error_judgment(food_query, &e)
            }
        }
    }

    async fn try_evaluate(&self, food_query: &str) -> anyhow::Result<Value> {
        let prompt = rubric::judgment_prompt(food_query);
        let reply = self
            .provider
            .complete(&prompt, &self.model, self.judge_max_tokens)
            .await?;
        Ok(extract_json_object(&reply)?)
    }

    /// Summarize a cart: local aggregation plus one model call for prose
    /// commentary. An empty cart short-circuits without touching the model;
    /// a failed commentary call falls back to a templated sentence.
    pub async fn generate_summary(&self, cart_items: &[Value]) -> CartSummary {
        if cart_items.is_empty() {
            return CartSummary::empty();
        }

        #[allow(clippy::cast_precision_loss)]
        let average_score =
            cart_items.iter().map(item_score).sum::<f64>() / cart_items.len() as f64;

        let mut rating_distribution = RatingDistribution::default();
        for item in cart_items {
            rating_distribution.record(item_rating(item));
        }

        let prompt =
            rubric::summary_prompt(cart_items, average_score, &rating_distribution.display());
        let (summary_text, recommendations) = match self
            .provider
            .complete(&prompt, &self.model, self.summary_max_tokens)
            .await
        {
            Ok(reply) => {
                let recommendations = extract_recommendation_lines(&reply);
                (reply, recommendations)
            }
            Err(e) => {
                tracing::warn!("cart commentary degraded to template: {e:#}");
                (
                    format!(
                        "Your cart has {} items with an average sustainability score of {average_score:.1}%.",
                        cart_items.len()
                    ),
                    vec![
                        "Consider adding more plant-based options".to_string(),
                        "Look for organic alternatives".to_string(),
                    ],
                )
            }
        };

        CartSummary {
            average_score: round_one_decimal(average_score),
            total_items: cart_items.len(),
            chart_data: chart_data(&rating_distribution),
            rating_distribution,
            summary_text,
            recommendations,
        }
    }
}

fn error_judgment(food_query: &str, error: &anyhow::Error) -> Value {
    json!({
        "food_name": food_query,
        "overall_score": 0,
        "overall_rating": Rating::Error.to_string(),
        "confidence": 0.0,
        "breakdown": {},
        "rationale": format!("Error occurred during evaluation: {error:#}"),
        "recommendation": "Unable to evaluate this food item",
        "data_gaps": ["evaluation error"],
    })
}
