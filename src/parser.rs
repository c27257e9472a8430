use std::fmt;

use thiserror::Error;

use crate::ast::{Expr, PathPart, Selector, Token, TokenKind, VariablePath};

/// A positioned parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    /// Literal text of the offending (or last seen) token
    pub near: Option<String>,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Error | Line {} Col {}", self.line, self.column)?;
        if let Some(near) = &self.near {
            write!(f, " near '{}'", near)?;
        }
        write!(f, "] {}", self.message)
    }
}

/// Cursor over a token sequence.
///
/// The stream always ends with an `Eof` token, so `current()` never runs off the end.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + t.text.chars().count()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", line, column));
        }
        TokenStream { tokens, index: 0 }
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// The token `n` positions ahead of the cursor, clamped to `Eof`.
    pub fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + n).min(last)]
    }

    pub fn check(&self, kind: TokenKind, text: &str) -> bool {
        let token = self.current();
        token.kind == kind && token.text == text
    }

    /// Consumes and returns the current token if it has the given kind and text.
    pub fn matches(&mut self, kind: TokenKind, text: &str) -> Option<Token> {
        if self.check(kind, text) {
            Some(self.consume())
        } else {
            None
        }
    }

    pub fn consume(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is_eof() {
            self.index += 1;
        }
        token
    }

    /// Number of tokens left before `Eof`.
    pub fn remaining(&self) -> usize {
        self.tokens.len() - 1 - self.index.min(self.tokens.len() - 1)
    }

    /// The last token that is not `Eof`.
    pub fn last_token(&self) -> &Token {
        let len = self.tokens.len();
        if len >= 2 {
            &self.tokens[len - 2]
        } else {
            &self.tokens[len - 1]
        }
    }

    /// Builds an error positioned at `token`, or at the current token when `None`.
    ///
    /// At end of input the last real token is reported instead.
    pub fn error(&self, message: impl Into<String>, token: Option<&Token>) -> ParseError {
        let token = match token {
            Some(t) => t,
            None if self.current().is_eof() => self.last_token(),
            None => self.current(),
        };
        ParseError {
            line: token.line,
            column: token.column,
            near: (!token.is_eof()).then(|| token.text.clone()),
            message: message.into(),
        }
    }
}

/// Parses a complete token sequence into one expression.
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}

pub struct Parser {
    stream: TokenStream,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            stream: TokenStream::new(tokens),
        }
    }

    /// Parses one expression and requires the input to end there (an optional
    /// trailing `;` is allowed).
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.stream.matches(TokenKind::Symbol, ";");
        if !self.stream.current().is_eof() {
            return Err(self.stream.error("Unexpected token after expression.", None));
        }
        Ok(expr)
    }

    /// Expr := '(' Expr ')' | Number | String | Keyword | Variable
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        if self.stream.matches(TokenKind::Symbol, "(").is_some() {
            let expr = self.parse_expression()?;
            if self.stream.matches(TokenKind::Symbol, ")").is_none() {
                return Err(self
                    .stream
                    .error("Closing bracket expected after expression", None));
            }
            return Ok(expr);
        }

        let token = self.stream.current().clone();

        match token.kind {
            TokenKind::Number => {
                self.stream.consume();
                let value = token
                    .text
                    .parse::<i64>()
                    .map_err(|e| self.stream.error(format!("Invalid number: {}", e), Some(&token)))?;
                Ok(Expr::Integer { value, token })
            }
            TokenKind::String => {
                self.stream.consume();
                Ok(Expr::String {
                    value: token.text.clone(),
                    token,
                })
            }
            TokenKind::Keyword => {
                self.stream.consume();
                let value = match token.text.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(self
                            .stream
                            .error("This keyword is not allowed here.", Some(&token)));
                    }
                };
                Ok(Expr::Boolean { value, token })
            }
            TokenKind::Identifier => self.parse_variable().map(Expr::Variable),
            TokenKind::Eof => Err(self.stream.error(
                "Unexpected EOF, expected an identifier",
                Some(self.stream.last_token()),
            )),
            _ => Err(self.stream.error(
                "Expected either a number, string, keyword or identifier.",
                Some(&token),
            )),
        }
    }

    /// Variable := Identifier PathPart*
    fn parse_variable(&mut self) -> Result<VariablePath, ParseError> {
        let head = self.stream.consume();
        let mut parts = vec![PathPart {
            selector: Selector::Field(head.text.clone()),
            args: None,
            token: head.clone(),
        }];

        loop {
            if self.stream.matches(TokenKind::Symbol, ".").is_some() {
                parts.push(self.parse_dot_part()?);
            } else if let Some(open) = self.stream.matches(TokenKind::Symbol, "[") {
                if self.stream.current().is_eof() {
                    return Err(self.stream.error(
                        "Unexpected EOF, expected an index expression.",
                        Some(self.stream.last_token()),
                    ));
                }
                let index = self.parse_expression()?;
                if self.stream.matches(TokenKind::Symbol, "]").is_none() {
                    return Err(self
                        .stream
                        .error("Closing ']' expected after index expression.", None));
                }
                parts.push(PathPart {
                    selector: Selector::Computed(Box::new(index)),
                    args: None,
                    token: open,
                });
            } else if let Some(open) = self.stream.matches(TokenKind::Symbol, "(") {
                let args = self.parse_arguments()?;
                // parts is never empty: it starts with the head identifier
                let Some(part) = parts.last_mut() else {
                    return Err(self.stream.error("Call without a target.", Some(&open)));
                };
                if part.args.is_some() {
                    return Err(self
                        .stream
                        .error("The result of a call cannot be called again.", Some(&open)));
                }
                part.args = Some(args);
            } else {
                break;
            }
        }

        Ok(VariablePath {
            token: head,
            parts,
        })
    }

    /// '.' (Identifier | Number), with the dot already consumed
    fn parse_dot_part(&mut self) -> Result<PathPart, ParseError> {
        let token = self.stream.current().clone();
        let selector = match token.kind {
            TokenKind::Identifier => Selector::Field(token.text.clone()),
            TokenKind::Number => {
                let n = token
                    .text
                    .parse::<i64>()
                    .map_err(|e| self.stream.error(format!("Invalid index: {}", e), Some(&token)))?;
                Selector::Index(n)
            }
            TokenKind::Eof => {
                return Err(self
                    .stream
                    .error("Unexpected EOF", Some(self.stream.last_token())));
            }
            _ => {
                return Err(self
                    .stream
                    .error("This token is not allowed within a variable name", Some(&token)));
            }
        };
        self.stream.consume();
        Ok(PathPart {
            selector,
            args: None,
            token,
        })
    }

    /// ArgList? ')' with the opening parenthesis already consumed
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![];

        loop {
            if self.stream.current().is_eof() {
                return Err(self.stream.error(
                    "Unexpected EOF, expected function call argument list.",
                    Some(self.stream.last_token()),
                ));
            }

            if self.stream.matches(TokenKind::Symbol, ")").is_some() {
                break;
            }

            args.push(self.parse_expression()?);

            if self.stream.matches(TokenKind::Symbol, ")").is_some() {
                break;
            }
            if self.stream.matches(TokenKind::Symbol, ",").is_none() {
                return Err(self
                    .stream
                    .error("Missing comma or closing bracket after argument.", None));
            }
        }

        Ok(args)
    }
}
