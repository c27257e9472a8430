//! Applies ordered batches of path assignments to a target object.
//!
//! ```
//! use std::collections::HashMap;
//!
//! use objpath::{Patch, Patcher};
//!
//! let mut scores: HashMap<String, i64> = HashMap::new();
//! let patch = Patch::new().set("alice", 3_i64).set("bob", 5_i64);
//!
//! Patcher::new().apply(&mut scores, patch).unwrap();
//! assert_eq!(scores["Alice"], 3);
//! ```
use thiserror::Error;
use tracing::debug;

use crate::{
    config::ResolveOptions,
    error::Result,
    evaluator::Evaluator,
    expression::Expression,
    object::Object,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The path resolved to nothing that could be written.
    #[error("path: {path} doesn't match any property in target")]
    NoMatch { path: String },
}

/// An ordered list of `path => value` assignments.
#[derive(Debug, Default)]
pub struct Patch {
    entries: Vec<(String, Box<dyn Object>)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Object + Clone>(mut self, path: impl Into<String>, value: T) -> Self {
        self.push(path, Box::new(value));
        self
    }

    pub fn push(&mut self, path: impl Into<String>, value: Box<dyn Object>) {
        self.entries.push((path.into(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }
}

impl FromIterator<(String, Box<dyn Object>)> for Patch {
    fn from_iter<I: IntoIterator<Item = (String, Box<dyn Object>)>>(iter: I) -> Self {
        Patch {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Patcher {
    evaluator: Evaluator,
}

impl Patcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ResolveOptions) -> Self {
        Patcher {
            evaluator: Evaluator::with_options(options),
        }
    }

    /// Applies every entry of `patch` to `target`, in order.
    ///
    /// Stops at the first failing entry; entries applied before it stay applied.
    pub fn apply(&self, target: &mut dyn Object, patch: Patch) -> Result<()> {
        for (path, value) in patch.entries {
            let expression = Expression::compile(&path)?;
            self.apply_one(target, &expression, value)?;
        }
        Ok(())
    }

    /// Resolves `expression` against `target` and writes `value` there.
    pub fn apply_one(
        &self,
        target: &mut dyn Object,
        expression: &Expression,
        value: Box<dyn Object>,
    ) -> Result<()> {
        let mut slot = expression.execute_with(&self.evaluator, target)?;
        if slot.is_nil() && !slot.is_settable() {
            return Err(PatchError::NoMatch {
                path: expression.source().to_string(),
            }
            .into());
        }
        slot.set_boxed(value)?;
        debug!(path = expression.source(), "applied patch entry");
        Ok(())
    }
}
