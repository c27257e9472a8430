//! Resolution options.
//!
//! Options are plain serde structs so hosts can load them alongside their own
//! configuration.
//!
//! ```
//! use objpath::config::{IndexPolicy, ResolveOptions};
//!
//! let options: ResolveOptions = serde_json::from_str(r#"{"index_policy": "extend"}"#).unwrap();
//! assert_eq!(options.index_policy, IndexPolicy::Extend);
//! ```
use serde::{Deserialize, Serialize};

/// How a sequence index past the end is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum IndexPolicy {
    /// Out-of-range indices are resolution errors
    #[default]
    Strict,

    /// An out-of-range index on the last path part resolves to a deferred
    /// setter that grows the sequence when written; on earlier parts it
    /// resolves to nil
    Extend,
}

/// Default for [`ResolveOptions::max_extend`].
pub const DEFAULT_MAX_EXTEND: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    pub index_policy: IndexPolicy,

    /// Most elements a single [`IndexPolicy::Extend`] write may append.
    /// Indices further past the end are out of range.
    pub max_extend: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            index_policy: IndexPolicy::default(),
            max_extend: DEFAULT_MAX_EXTEND,
        }
    }
}

impl ResolveOptions {
    pub fn with_index_policy(mut self, index_policy: IndexPolicy) -> Self {
        self.index_policy = index_policy;
        self
    }

    pub fn with_max_extend(mut self, max_extend: usize) -> Self {
        self.max_extend = max_extend;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_strict() {
        let options: ResolveOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.index_policy, IndexPolicy::Strict);
        assert_eq!(options.max_extend, DEFAULT_MAX_EXTEND);
    }
}
