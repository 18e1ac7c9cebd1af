//! Free-text mapping of auditor replies onto boolean findings.

use crate::error::AuditError;

/// Replies accepted as a `true` finding (case-insensitive).
pub const TRUE_ANSWERS: [&str; 5] = ["yes", "true", "1", "y", "t"];

/// Replies accepted as a `false` finding (case-insensitive).
pub const FALSE_ANSWERS: [&str; 5] = ["no", "false", "0", "n", "f"];

/// Parses a free-text reply into a boolean finding.
///
/// Input is trimmed and lowercased before matching against the fixed
/// vocabularies. Anything outside them is rejected so the caller can
/// re-prompt without mutating any state.
///
/// # Errors
/// Returns [`AuditError::InvalidAnswer`] with the original text.
pub fn parse(text: &str) -> Result<bool, AuditError> {
    let normalised = text.trim().to_lowercase();
    if TRUE_ANSWERS.contains(&normalised.as_str()) {
        Ok(true)
    } else if FALSE_ANSWERS.contains(&normalised.as_str()) {
        Ok(false)
    } else {
        Err(AuditError::InvalidAnswer(text.to_owned()))
    }
}
