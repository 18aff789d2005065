//! Input normalization for identifiers and phone numbers.

/// Keep ASCII letters, ASCII digits and whitespace.
///
/// Everything else is dropped, including accented letters.
pub fn normalize_text(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Keep ASCII digits only.
pub fn normalize_phone(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}
