//! Plain-text value tokens shared by capture and validation

/// Token written for a ticked box
pub const TICKED: &str = "Ticked";

const TICK_TOKENS: [&str; 6] = ["ticked", "true", "1", "yes", "checked", "tick"];

/// True when a stored value reads as a ticked box
///
/// Accepts the token written by capture plus legacy spellings found in older
/// batches.
#[must_use]
pub fn is_tick_token(value: &str) -> bool {
    let value = value.trim();
    TICK_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(value))
}
