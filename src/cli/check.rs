//! Validate path expressions

use super::CliError;
use crate::Expression;

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The path expression to validate
    pub path: String,
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// The expression is valid
    Valid {
        /// Normalized form of the expression
        normalized: String,
        /// Leading segment, empty when the path has no `.`
        first_part: String,
    },
}

/// Lex and parse a path expression without evaluating it
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expression = Expression::compile(&options.path)?;
    Ok(CheckResult::Valid {
        normalized: expression.to_string(),
        first_part: expression.first_part(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_normalizes() {
        let options = CheckOptions {
            path: "comments[commentIds[0]].nickName".to_string(),
        };
        assert_eq!(
            execute_check(&options).unwrap(),
            CheckResult::Valid {
                normalized: "Comments[CommentIds[0]].NickName".to_string(),
                first_part: "Comments[commentIds[0]]".to_string(),
            }
        );
    }

    #[test]
    fn test_check_reports_lex_errors() {
        let options = CheckOptions {
            path: "Name.\"abc".to_string(),
        };
        let err = execute_check(&options).unwrap_err();
        assert!(err.to_string().contains("string not closed"));
    }
}
