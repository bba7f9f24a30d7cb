//! Fixed scoring rubric and prompt assembly.
//!
//! The rubric is the contract with the external model: six weighted
//! criteria and a rating scale, prompted verbatim on every judgment so
//! scores stay comparable across requests.

use crate::store::item_score;
use serde_json::Value;

pub const SCORING_RUBRIC: &str = r"# Food Sustainability Scoring System

## Criteria Weights (Total = 100%)
1. Carbon Footprint: 25%
2. Processing Level: 20%
3. Artificial Ingredients: 20%
4. Organic/Certifications: 15%
5. Transportation/Origin: 15%
6. Food Category Impact: 5%

## Scoring Scales:

### Carbon Footprint (25% weight)
- 100 points: <=1.0 kg CO2e/kg (vegetables, fruits)
- 75 points: 1.1-3.0 kg CO2e/kg (grains, dairy, eggs)
- 50 points: 3.1-8.0 kg CO2e/kg (chicken, pork)
- 25 points: 8.1-20.0 kg CO2e/kg (cheese, processed foods)
- 0 points: >20.0 kg CO2e/kg (beef, lamb)

### Processing Level (20% weight)
- 100 points: Minimal (1-3 ingredients)
- 75 points: Light (4-8 ingredients)
- 50 points: Moderate (9-15 ingredients)
- 25 points: High (16-25 ingredients)
- 0 points: Ultra-processed (25+ ingredients)

### Artificial Ingredients (20% weight)
- 100 points: No artificial ingredients
- 75-99 points: 1 minor artificial ingredient
- 50-74 points: 2-3 artificial ingredients
- 25-49 points: 4-6 artificial ingredients
- 0-24 points: 7+ artificial ingredients

### Organic/Certifications (15% weight)
- 100 points: Multiple certifications (Organic + Fair Trade)
- 85 points: USDA Organic
- 70 points: Made with Organic
- 60 points: Single certification (Non-GMO, Fair Trade)
- 40 points: Animal welfare only
- 20 points: Minor claims (natural)
- 0 points: No certifications

### Transportation/Origin (15% weight)
- 100 points: Local (<100 miles)
- 80 points: Regional (100-500 miles)
- 60 points: National (500-1,500 miles)
- 30 points: International (1,500+ miles)
- 0 points: Long-distance air freight

### Food Category Impact (5% weight)
- 100 points: Vegetables, fruits, legumes
- 80 points: Grains, nuts
- 60 points: Dairy alternatives, eggs
- 40 points: Dairy products, fish
- 20 points: Poultry, pork
- 0 points: Beef, lamb

## Final Rating Scale:
- 75-100%: GREAT - Highly sustainable
- 50-74%: GOOD - Reasonably sustainable
- 25-49%: AVERAGE - Some concerns
- 0-24%: POOR - Low sustainability";

const RESPONSE_FORMAT: &str = r#"{
    "food_name": "exact product name",
    "overall_score": 85,
    "overall_rating": "GREAT",
    "confidence": 0.85,
    "breakdown": {
        "carbon_footprint": {"score": 75, "reasoning": "brief explanation"},
        "processing_level": {"score": 100, "reasoning": "brief explanation"},
        "artificial_ingredients": {"score": 100, "reasoning": "brief explanation"},
        "organic_certifications": {"score": 85, "reasoning": "brief explanation"},
        "transportation_origin": {"score": 60, "reasoning": "brief explanation"},
        "food_category": {"score": 60, "reasoning": "brief explanation"}
    },
    "rationale": "2-3 sentence summary of why this food got this rating",
    "recommendation": "specific advice for the consumer",
    "data_gaps": ["list any missing information that affected confidence"]
}"#;

pub(super) fn judgment_prompt(food_query: &str) -> String {
    format!(
        "You are a sustainability judge applying this scoring system to grocery items:\n\n\
         {SCORING_RUBRIC}\n\n\
         Evaluate this food item: \"{food_query}\"\n\n\
         Return your analysis in this exact JSON format:\n{RESPONSE_FORMAT}\n\n\
         Be specific about the product. If the query is vague (like \"chicken\"), \
         make reasonable assumptions about a common variant."
    )
}

pub(super) fn summary_prompt(
    cart_items: &[Value],
    average_score: f64,
    rating_counts: &str,
) -> String {
    let items = cart_items
        .iter()
        .map(|item| {
            let name = item
                .get("food_name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown");
            format!("{name} ({}%)", item_score(item))
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Summarize the sustainability of this grocery cart:\n\n\
         Items: {items}\n\n\
         Average Score: {average_score:.1}%\n\
         Rating Distribution: {rating_counts}\n\n\
         Provide:\n\
         1. A 2-sentence overall assessment\n\
         2. 2-3 specific recommendations for improvement\n\n\
         Keep it encouraging but honest."
    )
}
