use thiserror::Error;

use crate::{
    evaluator::ResolutionError, lexer::LexError, parser::ParseError, patcher::PatchError,
    value::MutationError,
};

/// Any failure of compiling, resolving or patching a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolutionError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
