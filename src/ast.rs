//! # Path Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and the expression tree of the path language used to
//! locate a value nested inside a host object graph.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Positioned lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals and variable paths)
//!
//! ## Quick Start
//!
//! ```text
//! Images[ImgIDList[2]].Content
//! ```
//!
//! Reads field `ImgIDList` of the root, takes its element `2`, uses it to index
//! `Images`, and selects `Content` of the element found.
//!
//! ## Core Concepts
//!
//! ### Path Parts
//!
//! A path starts with one identifier and chains parts:
//!
//! - **Dot field** `.Name` - struct field, map key or method
//! - **Dot index** `.2` - sequence or string index, or map key
//! - **Bracket** `[expr]` - the sub-expression is evaluated against the same root and its
//!   integer or string result is used as the selector
//! - **Call** `name(arg, ...)` - invokes the method named by the preceding part; each
//!   argument is evaluated against the same root
//!
//! ### Literals
//!
//! Unsigned integers, double-quoted strings (`\"` and `\\` escapes) and `true`/`false`.
//! There are no operators: the language only expresses locations.
//!
//! ## Examples
//!
//! ```text
//! Name
//! ImgIDList.0
//! BizState[3]
//! FindImage(ImgIDList.1).Content
//! Comments[CommentIds[0]].NickName
//! ```
pub mod expressions;
pub mod tokens;

pub use expressions::{Expr, PathPart, Selector, VariablePath};
pub use tokens::{Token, TokenKind};
