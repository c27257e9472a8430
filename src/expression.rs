//! Compiled path expressions.
//!
//! Compiling lexes and parses once; the resulting tree holds no reference to
//! any root, so one [`Expression`] can be executed against many objects.
//!
//! ```
//! use objpath::Expression;
//!
//! let expression = Expression::compile("images[imgIDList[2]].content").unwrap();
//! assert_eq!(expression.to_string(), "Images[ImgIDList[2]].Content");
//! assert_eq!(expression.first_part(), "Images[imgIDList[2]]");
//! ```
use std::{fmt, str::FromStr};

use tracing::debug;

use crate::{
    ast::Expr,
    error::Result,
    evaluator::Evaluator,
    lexer::{lex, normalize_identifier},
    object::Object,
    parser::parse,
    value::Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    tree: Expr,
}

impl Expression {
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = lex(source)?;
        let tree = parse(tokens)?;
        debug!(source, expression = %tree, "compiled expression");
        Ok(Expression {
            source: source.to_string(),
            tree,
        })
    }

    /// The text the expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    /// Evaluates the expression against `root` with default options.
    pub fn execute<'a>(&self, root: &'a mut dyn Object) -> Result<Value<'a>> {
        self.execute_with(&Evaluator::new(), root)
    }

    pub fn execute_with<'a>(
        &self,
        evaluator: &Evaluator,
        root: &'a mut dyn Object,
    ) -> Result<Value<'a>> {
        Ok(evaluator.evaluate(&self.tree, root)?)
    }

    /// The source text before the first `.`, with its first letter upper-cased.
    ///
    /// Empty when the source has no `.` at all. Hosts use it to map a changed
    /// path to the top-level field it touches.
    pub fn first_part(&self) -> String {
        match self.source.split_once('.') {
            Some((head, _)) => normalize_identifier(head),
            None => String::new(),
        }
    }
}

impl FromStr for Expression {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Expression::compile(s)
    }
}

/// The normalized form of the expression.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_part_without_dot() {
        let expression = Expression::compile("name").unwrap();
        assert_eq!(expression.first_part(), "");
    }

    #[test]
    fn test_first_part_is_normalized() {
        let expression = Expression::compile("firstComment().content").unwrap();
        assert_eq!(expression.first_part(), "FirstComment()");
    }

    #[test]
    fn test_compile_errors_are_positioned() {
        let err = Expression::compile("a.").unwrap_err();
        assert!(matches!(err, crate::Error::Parse(_)));
    }
}
