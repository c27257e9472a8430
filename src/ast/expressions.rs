use std::fmt;

use crate::ast::Token;

/// Abstract Syntax Tree node representing a parsed path expression.
///
/// Trees hold no reference to any root object, so one parsed expression can be
/// evaluated against many roots. Every node keeps the token it was parsed from
/// for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer { value: i64, token: Token },

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String { value: String, token: Token },

    /// Boolean literal
    Boolean { value: bool, token: Token },

    /// Path into the root object
    ///
    /// # Examples
    /// ```text
    /// Name
    /// Images[ImgIDList[2]].Content
    /// FindImage(ImgIDList.1).Content
    /// ```
    Variable(VariablePath),
}

impl Expr {
    /// The token this node was parsed from.
    pub fn token(&self) -> &Token {
        match self {
            Expr::Integer { token, .. } | Expr::String { token, .. } | Expr::Boolean { token, .. } => {
                token
            }
            Expr::Variable(path) => &path.token,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer { value, .. } => write!(f, "{}", value),
            Expr::String { value, .. } => {
                write!(f, "\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
            }
            Expr::Boolean { value, .. } => write!(f, "{}", value),
            Expr::Variable(path) => write!(f, "{}", path),
        }
    }
}

/// An ordered chain of path parts starting at a field of the root.
///
/// Invariant: `parts` is never empty and `parts[0]` is a [`Selector::Field`].
#[derive(Debug, Clone, PartialEq)]
pub struct VariablePath {
    /// Leading identifier token
    pub token: Token,
    pub parts: Vec<PathPart>,
}

impl VariablePath {
    /// Renders the first `count` parts, e.g. `Images[ImgIDList[2]]` for a
    /// prefix of `Images[ImgIDList[2]].Content`.
    pub fn prefix(&self, count: usize) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().take(count).enumerate() {
            match &part.selector {
                Selector::Field(name) => {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                Selector::Index(n) => {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(&n.to_string());
                }
                Selector::Computed(expr) => {
                    out.push('[');
                    out.push_str(&expr.to_string());
                    out.push(']');
                }
            }
            if let Some(args) = &part.args {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                out.push('(');
                out.push_str(&args.join(", "));
                out.push(')');
            }
        }
        out
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.parts.len()))
    }
}

/// One step of a [`VariablePath`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathPart {
    pub selector: Selector,

    /// Call arguments when the part is written as `name(...)`
    ///
    /// `Some(vec![])` for `name()`, `None` for a plain field access.
    pub args: Option<Vec<Expr>>,

    pub token: Token,
}

impl PathPart {
    pub fn is_call(&self) -> bool {
        self.args.is_some()
    }
}

/// How a path part selects its target.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Field, map key or method name (`.Name`)
    Field(String),

    /// Literal index (`.2`)
    Index(i64),

    /// Bracketed sub-expression evaluated against the same root (`[ImgIDList[2]]`)
    Computed(Box<Expr>),
}
