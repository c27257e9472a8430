use thiserror::Error;
use tracing::trace;

use crate::ast::{Token, TokenKind};

/// Fixed symbol set. `;` ends lexing even if input remains.
const SYMBOLS: &[char] = &[';', '(', ')', '.', '[', ']', ','];

const KEYWORDS: &[&str] = &["true", "false"];

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// The first lexical error of a lex pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[Error | Line {line} Col {column}] {message}")]
pub struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl From<Token> for LexError {
    fn from(token: Token) -> Self {
        LexError {
            line: token.line,
            column: token.column,
            message: token.text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Identifier,
    Number,
    String,
}

/// Upper-cases the first character of an identifier.
///
/// Identifiers are normalized this way on emission, so `imgIDList` and
/// `ImgIDList` denote the same field.
pub fn normalize_identifier(ident: &str) -> String {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Turns a path string into positioned tokens, ending with an `Eof` token.
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    start: Position,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            start: Position { line: 1, column: 1 },
            tokens: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn mark_start(&mut self) {
        self.start = Position {
            line: self.line,
            column: self.column,
        };
    }

    fn emit(&mut self, kind: TokenKind, text: String) {
        trace!(?kind, %text, line = self.start.line, column = self.start.column, "token");
        self.tokens
            .push(Token::new(kind, text, self.start.line, self.start.column));
    }

    fn fail(&self, message: String) -> LexError {
        Token::new(TokenKind::Error, message, self.start.line, self.start.column).into()
    }

    /// Runs the state machine to completion.
    ///
    /// Lexing stops at the end of input or right after a `;` symbol.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut state = State::Code;

        loop {
            state = match state {
                State::Code => match self.lex_code()? {
                    Some(next) => next,
                    None => break,
                },
                State::Identifier => self.lex_identifier(),
                State::Number => self.lex_number(),
                State::String => self.lex_string()?,
            };
        }

        self.mark_start();
        self.emit(TokenKind::Eof, String::new());
        Ok(self.tokens)
    }

    /// Returns the next state, or `None` when lexing is finished.
    fn lex_code(&mut self) -> Result<Option<State>, LexError> {
        loop {
            self.mark_start();

            let Some(ch) = self.current_char() else {
                return Ok(None);
            };

            match ch {
                ' ' | '\t' | '\r' => self.advance(),
                '\n' => return Err(self.fail("Newline not allowed within expression.".to_string())),
                c if is_identifier_start(c) => return Ok(Some(State::Identifier)),
                c if c.is_ascii_digit() => return Ok(Some(State::Number)),
                '"' => return Ok(Some(State::String)),
                c if SYMBOLS.contains(&c) => {
                    self.advance();
                    self.emit(TokenKind::Symbol, c.to_string());
                    if c == ';' {
                        return Ok(None);
                    }
                }
                c => {
                    return Err(self.fail(format!(
                        "Unknown character: '{}' (U+{:04X})",
                        c, c as u32
                    )));
                }
            }
        }
    }

    fn lex_identifier(&mut self) -> State {
        let mut ident = String::new();
        while let Some(ch) = self.current_char() {
            if is_identifier_continue(ch) {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if KEYWORDS.contains(&ident.as_str()) {
            self.emit(TokenKind::Keyword, ident);
        } else {
            self.emit(TokenKind::Identifier, normalize_identifier(&ident));
        }
        State::Code
    }

    fn lex_number(&mut self) -> State {
        let mut number = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        self.emit(TokenKind::Number, number);
        State::Code
    }

    fn lex_string(&mut self) -> Result<State, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        loop {
            match self.current_char() {
                None => return Err(self.fail("Unexpected EOF, string not closed.".to_string())),
                Some('"') => {
                    self.advance();
                    self.emit(TokenKind::String, result);
                    return Ok(State::Code);
                }
                Some('\n') => {
                    return Err(self.fail("Newline in string is not allowed.".to_string()));
                }
                Some('\\') => {
                    self.advance();
                    match self.current_char() {
                        Some(c @ ('"' | '\\')) => {
                            result.push(c);
                            self.advance();
                        }
                        Some(c) => {
                            return Err(self.fail(format!("Unknown escape sequence: \\{}", c)));
                        }
                        None => {
                            return Err(self.fail("Unexpected EOF, string not closed.".to_string()));
                        }
                    }
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        lex(input).unwrap().into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_path_with_brackets() {
        let tokens = lex("abc.cc[1]").unwrap();
        // 6 tokens plus Eof
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[3].text, "[");
        assert_eq!(tokens[5].text, "]");
        assert!(tokens[6].is_eof());
    }

    #[test]
    fn test_semicolon_stops_lexing() {
        assert_eq!(texts("A;B C"), vec!["A", ";", ""]);
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("imgIDList"), "ImgIDList");
        assert_eq!(normalize_identifier("_x"), "_x");
        assert_eq!(normalize_identifier(""), "");
    }

    #[test]
    fn test_error_position_points_at_token_start() {
        let err = lex("Name.\"abc").unwrap_err();
        assert_eq!((err.line, err.column), (1, 6));
    }
}
