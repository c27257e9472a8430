//! Resolve and patch paths in JSON documents

use serde_json::Value as Json;

use super::{CliError, parse_assignment};
use crate::{
    Expression, IndexPolicy, Patch, Patcher, ResolveOptions, evaluator::Evaluator, object::Object,
    output::to_json,
};

/// Options for the get command
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// The path expression to resolve
    pub path: String,
    /// JSON input string
    pub input: Option<String>,
    pub index_policy: IndexPolicy,
}

/// Options for the patch command
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    /// JSON input string
    pub input: Option<String>,
    /// `PATH=VALUE` assignments, applied in order
    pub assignments: Vec<String>,
    pub index_policy: IndexPolicy,
}

fn read_document(input: Option<&String>) -> Result<Json, CliError> {
    let text = input.ok_or(CliError::NoInput)?;
    Ok(serde_json::from_str(text)?)
}

/// Resolve a path against a JSON document and render the result
pub fn execute_get(options: &GetOptions) -> Result<Json, CliError> {
    let mut document = read_document(options.input.as_ref())?;
    let expression = Expression::compile(&options.path)?;
    let evaluator =
        Evaluator::with_options(ResolveOptions::default().with_index_policy(options.index_policy));
    let value = expression.execute_with(&evaluator, &mut document)?;
    Ok(to_json(&value))
}

/// Apply assignments to a JSON document and return the patched document
pub fn execute_patch(options: &PatchOptions) -> Result<Json, CliError> {
    let mut document = read_document(options.input.as_ref())?;

    let mut patch = Patch::new();
    for assignment in &options.assignments {
        let (path, value) = parse_assignment(assignment)?;
        patch.push(path, Box::new(value) as Box<dyn Object>);
    }

    let patcher =
        Patcher::with_options(ResolveOptions::default().with_index_policy(options.index_policy));
    patcher.apply(&mut document, patch)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_get_requires_input() {
        let options = GetOptions {
            path: "a".to_string(),
            ..Default::default()
        };
        assert!(matches!(execute_get(&options), Err(CliError::NoInput)));
    }

    #[test]
    fn test_patch_document() {
        let options = PatchOptions {
            input: Some(r#"{"title": "old", "tags": ["a"]}"#.to_string()),
            assignments: vec!["title=new".to_string(), "tags.0=\"b\"".to_string()],
            index_policy: IndexPolicy::Strict,
        };
        assert_eq!(
            execute_patch(&options).unwrap(),
            json!({"title": "new", "tags": ["b"]})
        );
    }
}
