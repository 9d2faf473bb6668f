// Shared prompt fragments. Each stage that calls the model keeps its own
// prompts.rs next to it; only cross-cutting text lives here.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended on the single retry after a malformed response.
pub const STRICT_RETRY_INSTRUCTION: &str = "\
    IMPORTANT: Your previous answer could not be parsed or did not match the schema. \
    Respond with ONE JSON object that matches the schema above EXACTLY. \
    Use only the listed keys. Use null for unknown scalar values and [] for empty lists. \
    The first character of your answer must be '{' and the last must be '}'.";

/// Added to the system prompt on the strict retry.
pub const STRICT_SYSTEM_SUFFIX: &str = "Your last answer was rejected. \
    Keep to the schema keys and types exactly and stop after the closing brace.";

/// Grounding rule shared by every extraction prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    Only report facts that appear in the INPUT text. \
    Do NOT infer, interpolate, or invent details. \
    If the text does not support a field, leave it null or omit the entry.";
