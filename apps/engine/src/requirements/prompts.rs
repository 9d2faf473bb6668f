// Prompt text for requirement weight refinement.

use serde_json::{json, Value};

pub const REFINE_SCHEMA_NAME: &str = "requirement_weights";

pub const REFINE_INSTRUCTIONS: &str = "\
You are reviewing requirements parsed from a job description. Each INPUT line \
is one requirement: its index in brackets, its current category and weight, \
then the sentence it came from.

Judge how critical each requirement is for the role, in context of the whole \
list. Return a weight between 0 and 1 for every requirement whose importance \
is clearly higher or lower than its current weight suggests. Omit requirements \
that are weighted correctly. Do not add, merge or rename requirements.";

pub fn refine_schema() -> Value {
    json!({
        "weights": [
            {"index": 0, "weight": 0.9}
        ]
    })
}
