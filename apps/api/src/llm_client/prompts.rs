// Shared prompt fragments.
// Each pipeline stage defines its own templates in pipeline/prompts.rs;
// this file contains the cross-cutting output contract.

/// Appended to every prompt that expects a bare JSON array back.
pub const JSON_ARRAY_ONLY: &str = "Only return the JSON array, no additional text. \
    Do NOT wrap the JSON in markdown code fences. \
    Do NOT include explanations or commentary.";
