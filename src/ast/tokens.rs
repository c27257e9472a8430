use std::fmt;

/// Lexical category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Field or method name
    ///
    /// Starts with an ASCII letter or underscore, followed by letters, digits, or underscores.
    /// The first character is upper-cased on emission, so `imgIDList` and `ImgIDList`
    /// name the same field.
    ///
    /// # Examples
    /// ```text
    /// Name
    /// img_id_list
    /// _internal
    /// ```
    Identifier,

    /// Unsigned integer literal
    ///
    /// # Examples
    /// ```text
    /// 0
    /// 42
    /// ```
    Number,

    /// String literal enclosed in double quotes
    ///
    /// Only `\"` and `\\` escapes are recognized. The token text holds the unescaped value.
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "say \"hi\""
    /// ```
    String,

    /// Reserved word (`true` or `false`)
    Keyword,

    /// One of `.` `(` `)` `[` `]` `,` `;`
    Symbol,

    /// Lexical failure; the token text is the error message
    Error,

    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Keyword => "keyword",
            TokenKind::Symbol => "symbol",
            TokenKind::Error => "error",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A positioned lexical unit.
///
/// Lines and columns are 1-based and point at the first character of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// Returns true if this is the symbol `sym`.
    pub fn is_symbol(&self, sym: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == sym
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}
