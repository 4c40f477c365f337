// Shared prompt fragments. Each feature that calls the LLM keeps its own
// prompts.rs next to it and builds on these.

/// Output constraints appended to every system prompt.
pub const PLAIN_TEXT_OUTPUT: &str = "Reply in plain text with short paragraphs or \
    hyphen bullets. Do not use markdown headings, tables or code fences. \
    Do not invent facts about the candidate.";

/// Joins a feature-specific role description with the shared output rules.
pub fn system_prompt(role: &str) -> String {
    format!("{}\n\n{PLAIN_TEXT_OUTPUT}", role.trim())
}
