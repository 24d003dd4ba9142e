//! The fixed instruction block that leads every upstream conversation.

const SYSTEM_PROMPT: &str = include_str!("./prompt.md");

const CONTEXT_PREFIX: &str = "Context from previous discussion: ";

/// Returns the persona and output-format instructions.
///
/// The string is the same on every call. Per-call context never goes in
/// here, it is sent as a separate turn (see [`context_turn`]).
#[inline]
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Formats the carried-over note of a previous discussion phase as the
/// text of the second system turn.
#[inline]
pub fn context_turn(note: &str) -> String {
    format!("{CONTEXT_PREFIX}{note}")
}
