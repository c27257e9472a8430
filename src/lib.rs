//! Path expressions over in-memory object graphs.
//!
//! A path such as `Images[ImgIDList[2]].Content` or `FindImage(ImgIDList.1).Content`
//! is lexed, parsed into a tree, and resolved against a root [`Object`]. The
//! resulting [`Value`] can be inspected, or written with [`Value::set_value`],
//! which is how [`Patcher`] applies batches of `path => value` assignments to a
//! live object.
//!
//! ```
//! use objpath::{Expression, impl_struct};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Image {
//!     content: String,
//! }
//! impl_struct!(Image { "Content" => content });
//!
//! #[derive(Debug, Clone, Default)]
//! struct User {
//!     img_id_list: Vec<i64>,
//!     images: Vec<Box<Image>>,
//! }
//! impl_struct!(User { "ImgIDList" => img_id_list, "Images" => images });
//!
//! let mut user = User {
//!     img_id_list: vec![2, 0],
//!     images: vec![Box::default(), Box::default(), Box::default()],
//! };
//!
//! Expression::compile("Images[ImgIDList[0]].Content")
//!     .unwrap()
//!     .execute(&mut user)
//!     .unwrap()
//!     .set_value("cover".to_string())
//!     .unwrap();
//! assert_eq!(user.images[2].content, "cover");
//! ```
pub mod ast;
pub mod cli;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod lexer;
pub mod number;
pub mod object;
pub mod output;
pub mod parser;
pub mod patcher;
pub mod value;

pub use ast::{Expr, Token};
pub use config::{IndexPolicy, ResolveOptions};
pub use error::{Error, Result};
pub use evaluator::{Evaluator, ResolutionError, ResolutionErrorKind};
pub use expression::Expression;
pub use lexer::{LexError, Lexer, Position};
pub use number::Number;
pub use object::Object;
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser};
pub use patcher::{Patch, PatchError, Patcher};
pub use value::{MutationError, Value};
