use objpath::{
    Error, Expression, IndexPolicy, Number, Patch, Patcher, ResolveOptions,
    cli::{self, CheckOptions, CheckResult, CliError, GetOptions, PatchOptions},
    output::to_json,
};
use serde_json::{Value as Json, json};

fn document() -> Json {
    json!({
        "name": "Tom",
        "imgIDList": [2, 0, 1],
        "images": [
            {"content": "abc---1"},
            {"content": "abc---2"},
            {"content": "abc---3"}
        ],
        "avatar": null,
        "Score": 1.5
    })
}

fn get(path: &str, doc: &mut Json) -> Json {
    to_json(&Expression::compile(path).unwrap().execute(doc).unwrap())
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_lowercase_keys_match_normalized_identifiers() {
    let mut doc = document();
    assert_eq!(get("name", &mut doc), json!("Tom"));
    assert_eq!(get("Name", &mut doc), json!("Tom"));
    assert_eq!(get("Score", &mut doc), json!(1.5));
}

#[test]
fn test_nested_selectors_in_documents() {
    let mut doc = document();
    assert_eq!(get("images[imgIDList[0]].content", &mut doc), json!("abc---3"));
    assert_eq!(get("images.1", &mut doc), json!({"content": "abc---2"}));
}

#[test]
fn test_null_leaf_is_nil() {
    let mut doc = document();
    let value = Expression::compile("avatar.content")
        .unwrap()
        .execute(&mut doc)
        .unwrap();
    assert!(value.is_nil());
    assert_eq!(to_json(&value), Json::Null);
}

#[test]
fn test_missing_key_is_nil() {
    let mut doc = document();
    assert_eq!(get("missing", &mut doc), Json::Null);
}

#[test]
fn test_array_index_out_of_range() {
    let mut doc = document();
    let err = Expression::compile("imgIDList.7")
        .unwrap()
        .execute(&mut doc)
        .unwrap_err();
    assert!(matches!(err, Error::Resolve(_)));
}

// ============================================================================
// Patching
// ============================================================================

#[test]
fn test_patch_document() {
    let mut doc = document();
    let patch = Patch::new()
        .set("name", json!("Ann"))
        .set("avatar", json!({"content": "me"}))
        .set("images[imgIDList[1]].content", json!("cover"))
        .set("tags", json!(["a"]));

    Patcher::new().apply(&mut doc, patch).unwrap();

    assert_eq!(doc["name"], json!("Ann"));
    assert_eq!(doc["avatar"]["content"], json!("me"));
    assert_eq!(doc["images"][0]["content"], json!("cover"));
    // New keys keep the normalized spelling of the path.
    assert_eq!(doc["Tags"], json!(["a"]));
}

#[test]
fn test_patch_number_carrier_into_document() {
    let mut doc = document();
    Patcher::new()
        .apply(&mut doc, Patch::new().set("imgIDList.2", Number::new("12")))
        .unwrap();
    assert_eq!(doc["imgIDList"], json!([2, 0, 12]));
}

#[test]
fn test_extend_array_in_document() {
    let mut doc = document();
    let patcher =
        Patcher::with_options(ResolveOptions::default().with_index_policy(IndexPolicy::Extend));
    patcher
        .apply(&mut doc, Patch::new().set("imgIDList[4]", json!(7)))
        .unwrap();
    assert_eq!(doc["imgIDList"], json!([2, 0, 1, null, 7]));
}

// ============================================================================
// Command line operations
// ============================================================================

#[test]
fn test_cli_check() {
    let result = cli::execute_check(&CheckOptions {
        path: "findImage(imgIDList.1).content".to_string(),
    })
    .unwrap();
    assert_eq!(
        result,
        CheckResult::Valid {
            normalized: "FindImage(ImgIDList.1).Content".to_string(),
            first_part: "FindImage(imgIDList".to_string(),
        }
    );
}

#[test]
fn test_cli_check_reports_parse_errors() {
    let err = cli::execute_check(&CheckOptions {
        path: "a[1".to_string(),
    })
    .unwrap_err();
    assert!(matches!(err, CliError::Path(Error::Parse(_))));
}

#[test]
fn test_cli_get() {
    let options = GetOptions {
        path: "images[imgIDList[2]]".to_string(),
        input: Some(document().to_string()),
        index_policy: IndexPolicy::Strict,
    };
    assert_eq!(cli::execute_get(&options).unwrap(), json!({"content": "abc---2"}));
}

#[test]
fn test_cli_get_invalid_json() {
    let options = GetOptions {
        path: "name".to_string(),
        input: Some("{".to_string()),
        ..Default::default()
    };
    assert!(matches!(cli::execute_get(&options), Err(CliError::Json(_))));
}

#[test]
fn test_cli_patch() {
    let options = PatchOptions {
        input: Some(document().to_string()),
        assignments: vec![
            "name=Ann".to_string(),
            "imgIDList.0=5".to_string(),
            "imgIDList[3]=[1]".to_string(),
        ],
        index_policy: IndexPolicy::Extend,
    };
    let patched = cli::execute_patch(&options).unwrap();
    assert_eq!(patched["name"], json!("Ann"));
    assert_eq!(patched["imgIDList"], json!([5, 0, 1, [1]]));
}

#[test]
fn test_cli_patch_unmatched_path() {
    let options = PatchOptions {
        input: Some(document().to_string()),
        assignments: vec!["missing.inner=1".to_string()],
        index_policy: IndexPolicy::Strict,
    };
    let err = cli::execute_patch(&options).unwrap_err();
    assert_eq!(
        err.to_string(),
        "path: missing.inner doesn't match any property in target"
    );
}
