//! Flatten a model response into plain text.

use crate::gemini::types::GenerateContentResponse;

/// Concatenate every text part of every candidate, in order.
///
/// Degenerate responses (none, no candidates, no content, no text parts)
/// produce an empty string. Callers decide what an empty result means.
pub fn extract_text(response: Option<&GenerateContentResponse>) -> String {
    let Some(response) = response else {
        return String::new();
    };

    response
        .candidates()
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.as_text())
        .collect()
}
