use super::{munge, patch_document, MungeMode};
use crate::context::{BuildContext, Platform};
use serde_json::json;

#[test]
fn creates_missing_path_then_appends_then_replaces() {
    let mut doc = json!({});

    patch_document(&mut doc, &["a", "b", "c"], json!(1), MungeMode::Append).expect("first");
    assert_eq!(doc, json!({"a": {"b": {"c": [1]}}}));

    patch_document(&mut doc, &["a", "b", "c"], json!(2), MungeMode::Append).expect("second");
    assert_eq!(doc, json!({"a": {"b": {"c": [1, 2]}}}));

    patch_document(&mut doc, &["a", "b", "c"], json!(3), MungeMode::Replace).expect("third");
    assert_eq!(doc, json!({"a": {"b": {"c": [3]}}}));
}

#[test]
fn existing_siblings_are_preserved() {
    let mut doc = json!({
        "prepare_queue": {"installed": [], "uninstalled": []},
        "a": {"keep": true, "b": {"c": ["old"]}}
    });

    patch_document(&mut doc, &["a", "b", "c"], json!("new"), MungeMode::Append).expect("patch");

    assert_eq!(
        doc,
        json!({
            "prepare_queue": {"installed": [], "uninstalled": []},
            "a": {"keep": true, "b": {"c": ["old", "new"]}}
        })
    );
}

#[test]
fn kind_mismatch_fails_without_overwriting() {
    let mut doc = json!({"a": ["not", "an", "object"]});
    let err = patch_document(&mut doc, &["a", "b"], json!(1), MungeMode::Append).unwrap_err();
    assert!(err.to_string().contains("a is a list"), "{err}");
    assert_eq!(doc, json!({"a": ["not", "an", "object"]}));

    let mut doc = json!({"a": {"b": {"c": "text"}}});
    let err =
        patch_document(&mut doc, &["a", "b", "c"], json!(1), MungeMode::Replace).unwrap_err();
    assert!(err.to_string().contains("must be a list"), "{err}");
}

#[test]
fn null_nodes_are_treated_as_missing() {
    let mut doc = json!({"a": null});
    patch_document(&mut doc, &["a", "b"], json!(1), MungeMode::Append).expect("patch");
    assert_eq!(doc, json!({"a": {"b": [1]}}));
}

#[test]
fn empty_key_path_is_rejected() {
    let mut doc = json!({});
    assert!(patch_document(&mut doc, &[], json!(1), MungeMode::Append).is_err());
}

#[test]
fn munge_rewrites_the_platform_record() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().to_path_buf();
    let record = root.join("plugins").join("ios.json");
    std::fs::create_dir_all(record.parent().expect("parent")).expect("create plugins dir");
    std::fs::write(&record, r#"{"installed_plugins": {"x": {}}}"#).expect("seed record");

    let ctx = BuildContext::new(root, vec![Platform::Ios]);
    let applied = munge(
        &ctx,
        &Platform::Ios,
        &["config_munge", "files"],
        json!({"xml": "<a/>", "count": 1}),
        MungeMode::Append,
    )
    .expect("munge");
    assert!(applied);

    let text = std::fs::read_to_string(&record).expect("read record");
    let doc: serde_json::Value = serde_json::from_str(&text).expect("parse record");
    assert_eq!(
        doc,
        json!({
            "installed_plugins": {"x": {}},
            "config_munge": {"files": [{"xml": "<a/>", "count": 1}]}
        })
    );
    assert!(text.contains("\n  \"config_munge\""), "record is pretty printed");
}

#[test]
fn record_key_order_survives_a_rewrite() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().to_path_buf();
    let record = root.join("plugins").join("ios.json");
    std::fs::create_dir_all(record.parent().expect("parent")).expect("create plugins dir");
    std::fs::write(
        &record,
        r#"{"prepare_queue": {"uninstalled": [], "installed": []}, "config_munge": {"files": {}}, "dependent_plugins": {}}"#,
    )
    .expect("seed record");

    let ctx = BuildContext::new(root, vec![Platform::Ios]);
    munge(
        &ctx,
        &Platform::Ios,
        &["config_munge", "files", "*-Info.plist", "parents", "CFBundleURLTypes"],
        json!({}),
        MungeMode::Replace,
    )
    .expect("munge");

    let text = std::fs::read_to_string(&record).expect("read record");
    let position = |key: &str| text.find(key).expect("key present");
    assert!(position("\"prepare_queue\"") < position("\"config_munge\""));
    assert!(position("\"config_munge\"") < position("\"dependent_plugins\""));
    assert!(position("\"uninstalled\"") < position("\"installed\""));
}

#[test]
fn untargeted_platform_is_a_silent_no_op() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let ctx = BuildContext::new(temp.path().to_path_buf(), vec![Platform::Ios]);

    let applied = munge(
        &ctx,
        &Platform::Android,
        &["config_munge"],
        json!({}),
        MungeMode::Replace,
    )
    .expect("munge");

    assert!(!applied);
    assert!(!temp.path().join("plugins").exists());
}
