//! Command line text -> patch value conversion

use serde_json::Value as Json;

use super::CliError;

/// Parses a command line value as JSON, falling back to a plain string.
///
/// `42` is a number, `"42"` and `abc` are strings, `[1,2]` is an array.
pub fn parse_value(text: &str) -> Json {
    serde_json::from_str(text).unwrap_or_else(|_| Json::String(text.to_string()))
}

/// Splits `PATH=VALUE` at the first `=` outside a string literal.
pub fn parse_assignment(text: &str) -> Result<(String, Json), CliError> {
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '=' if !in_string => {
                let path = text[..i].trim();
                if path.is_empty() {
                    break;
                }
                return Ok((path.to_string(), parse_value(&text[i + 1..])));
            }
            _ => {}
        }
    }

    Err(CliError::InvalidAssignment(text.to_string()))
}
