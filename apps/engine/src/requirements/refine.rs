//! Optional model pass that nudges requirement weights by perceived criticality.

use serde::Deserialize;
use tracing::debug;

use super::prompts::{refine_schema, REFINE_INSTRUCTIONS, REFINE_SCHEMA_NAME};
use crate::errors::EngineError;
use crate::llm_client::structured::request_validated;
use crate::llm_client::{LanguageModelClient, PromptSchema};
use crate::models::Requirement;

/// Largest change the model may make to a weight in either direction.
pub const MAX_WEIGHT_DELTA: f32 = 0.2;
/// Floor that keeps refined weights inside (0, 1].
pub const MIN_WEIGHT: f32 = 0.05;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightAdjustments {
    #[serde(default)]
    pub weights: Vec<WeightAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightAdjustment {
    pub index: usize,
    pub weight: f32,
}

fn render(requirements: &[Requirement]) -> String {
    requirements
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "[{i}] ({}, {:.2}) {}",
                r.category.as_str(),
                r.weight,
                r.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn validate(adjustments: &WeightAdjustments, count: usize) -> Result<(), String> {
    for adj in &adjustments.weights {
        if adj.index >= count {
            return Err(format!("index {} out of range for {count} requirements", adj.index));
        }
        if !adj.weight.is_finite() {
            return Err(format!("non-finite weight for index {}", adj.index));
        }
    }
    Ok(())
}

/// The weight the model asked for, held within `MAX_WEIGHT_DELTA` of the
/// rules-assigned one and inside (0, 1].
pub fn bounded_weight(original: f32, proposed: f32) -> f32 {
    proposed
        .clamp(original - MAX_WEIGHT_DELTA, original + MAX_WEIGHT_DELTA)
        .clamp(MIN_WEIGHT, 1.0)
}

pub async fn refine_weights(
    client: &dyn LanguageModelClient,
    requirements: &mut [Requirement],
    timeout_ms: u64,
) -> Result<(), EngineError> {
    let schema = PromptSchema::new(REFINE_SCHEMA_NAME, REFINE_INSTRUCTIONS, refine_schema());
    let count = requirements.len();
    let adjustments: WeightAdjustments = request_validated(
        client,
        &schema,
        &render(requirements),
        timeout_ms,
        |a: &WeightAdjustments| validate(a, count),
    )
    .await?;

    // Bounds come from the pre-refinement weights, even when an index repeats.
    let original: Vec<f32> = requirements.iter().map(|r| r.weight).collect();
    for adj in adjustments.weights {
        let requirement = &mut requirements[adj.index];
        let refined = bounded_weight(original[adj.index], adj.weight);
        debug!(
            keyword = %requirement.normalized_keyword,
            from = requirement.weight,
            to = refined,
            "requirement weight refined"
        );
        requirement.weight = refined;
    }
    Ok(())
}
