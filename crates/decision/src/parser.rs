// In crates/decision/src/parser.rs
//
// Extracts a reasoning trace and a bracket-matched JSON decision array from
// free-form model output. Bracket matching is on raw characters, not
// JSON-aware parsing, so arrays nested inside object values are tolerated.
// Kept as standalone functions: the edge cases here (unbalanced brackets,
// curly quotes, arrays in string values) are a recurring source of bugs.

use core_types::TradeAction;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No JSON array found in model response")]
    MissingArray,
    #[error("Unterminated JSON array in model response")]
    UnbalancedArray,
    #[error("Invalid decision JSON: {source}; fragment: {fragment}")]
    InvalidJson {
        fragment: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The free-text reasoning section: everything before the first `[`.
/// When no `[` exists the entire response is the trace.
pub fn extract_reasoning(response: &str) -> &str {
    match response.find('[') {
        Some(start) => response[..start].trim(),
        None => response.trim(),
    }
}

/// Finds the `]` that returns bracket depth to zero, starting from the `[`
/// at byte offset `start`. Returns the closing bracket's byte offset.
pub fn find_matching_bracket(s: &str, start: usize) -> Option<usize> {
    if s.as_bytes().get(start) != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    for (offset, byte) in s.as_bytes().iter().enumerate().skip(start) {
        match byte {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Replaces typographic quotes with their straight equivalents, recovering
/// from text-input artifacts in model output.
pub fn normalize_quotes(s: &str) -> String {
    s.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Extracts and decodes the trailing JSON decision array.
pub fn extract_actions(response: &str) -> Result<Vec<TradeAction>, ParseError> {
    let start = response.find('[').ok_or(ParseError::MissingArray)?;
    let end = find_matching_bracket(response, start).ok_or(ParseError::UnbalancedArray)?;

    let span = normalize_quotes(response[start..=end].trim());
    match serde_json::from_str(&span) {
        Ok(actions) => Ok(actions),
        Err(source) => Err(ParseError::InvalidJson {
            fragment: span,
            source,
        }),
    }
}
