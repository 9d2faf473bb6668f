// Prompt text for resume line rewrites.

use serde_json::{json, Value};

pub const EDITS_SCHEMA_NAME: &str = "suggested_edits";

pub const EDITS_INSTRUCTIONS: &str = "\
You are an ATS resume coach. The INPUT has two lists. GAPS are job requirements \
the resume misses or covers weakly, each with its index in brackets. LINES are \
lines from the candidate's resume, each with its index in brackets.

Pick the lines that would gain most from a rewrite and return at most five \
edits. For each edit give the line index, an upgraded version of that line and \
a one-sentence reason. Upgraded lines start with a strong action verb, state a \
measurable result where the original implies one and stay under 170 characters. \
Set requirement to the gap index the edit addresses, or null.

Only rephrase what the original line already claims. Do NOT add tools, numbers, \
employers or achievements that the line does not support.";

pub fn edits_schema() -> Value {
    json!({
        "edits": [
            {
                "line": 0,
                "upgraded": "Cut container build time 40% by moving CI images to Docker layer caching",
                "reason": "Leads with a verb and names the tool the job asks for.",
                "requirement": 1
            }
        ]
    })
}
