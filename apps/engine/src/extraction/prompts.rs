// Prompt text for the residual-span extraction call.

use serde_json::{json, Value};

pub const RESIDUAL_SCHEMA_NAME: &str = "resume_residual_spans";

/// Task description. The grounding rule from `llm_client::prompts` is appended
/// when the schema is built.
pub const RESIDUAL_INSTRUCTIONS: &str = "\
You are completing a resume parse. A rule-based parser has already read most \
of the resume; the INPUT below lists only the lines it could not resolve, one \
per line, each prefixed with its span number and kind in brackets.

For each span:
- experience_header: decide which part is the job title and which is the \
organization. Report them under \"experiences\" with the span number.
- orphan_bullet: if the bullet clearly names a role or employer, report it under \
\"experiences\" with the bullet text as a responsibility. Report any concrete \
skills, tools or technologies it names under \"skills\".
- skills_line: report each skill, tool or technology it names under \"skills\".

Report education only if a span states a degree. Use short canonical skill names \
(\"PostgreSQL\", not \"postgres databases\"). Set years_experience only when the \
span states a number of years for that skill.";

/// Example object showing the exact response shape.
pub fn residual_schema() -> Value {
    json!({
        "experiences": [
            {
                "span": 0,
                "title": "Senior Software Engineer",
                "organization": "Acme Corp",
                "responsibilities": []
            }
        ],
        "skills": [
            {"name": "Kubernetes", "years_experience": null}
        ],
        "education": [
            {"degree": "Bachelor's", "field": "Computer Science"}
        ]
    })
}
