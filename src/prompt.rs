//! Prompt assembly for answer generation

use crate::retrieve::RetrievedSource;

/// Instruction frame prepended to every prompt
pub const INSTRUCTION_FRAME: &str = "You are a financial analyst assistant for CrediTrust. \
Your task is to answer questions about customer complaints.\n\
Use the following retrieved complaint excerpts to formulate your answer. \
If the context doesn't contain the answer, state that you don't have enough information.";

/// Assemble the generation prompt for a question and its retrieved sources.
///
/// Sources appear as a bulleted context block in retrieval order, separated
/// by blank lines. The function is pure: no I/O, no randomness, identical
/// output for identical input.
#[must_use]
pub fn build_prompt(question: &str, sources: &[RetrievedSource]) -> String {
    let context = sources
        .iter()
        .map(|source| format!("- {}", source.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{INSTRUCTION_FRAME}\n\nContext:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}
