//! Prompt construction for transcript summarization.
//!
//! The prompt is deterministic: a fixed system message followed by a single
//! user message that embeds the instruction and the transcript verbatim.

use crate::models::ChatMessage;

pub const SYSTEM_PROMPT: &str = "You are an expert meeting/call summarizer.
Return clean, structured, concise output.
Prefer headings + bullet points. Respect the user's instruction exactly.
If action items exist, extract them into a dedicated section with assignee and due date if present.";

pub const DEFAULT_INSTRUCTION: &str = "Summarize in clear bullet points with headings.";

/// Trimmed instruction, or [`DEFAULT_INSTRUCTION`] when absent or blank.
pub fn resolve_instruction(prompt: Option<&str>) -> &str {
    match prompt.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => DEFAULT_INSTRUCTION,
    }
}

pub fn user_message(instruction: &str, transcript: &str) -> String {
    format!("Instruction: {}\n\nTranscript:\n{}", instruction, transcript)
}

/// Build the two-message prompt sent to the completion provider.
pub fn build_messages(transcript: &str, prompt: Option<&str>) -> Vec<ChatMessage> {
    let instruction = resolve_instruction(prompt);
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_message(instruction, transcript)),
    ]
}
