// tests/integration/error_handling.rs

use std::io::Write;

use tempfile::NamedTempFile;

use assetflow::config::{load_and_validate, load_or_default};
use assetflow::errors::AssetflowError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str, needle: &str) {
    let file = config_file(contents);
    match load_and_validate(file.path()) {
        Err(AssetflowError::Config(msg)) => assert!(msg.contains(needle), "{msg}"),
        Err(e) => panic!("Expected Config error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn empty_file_yields_the_standard_layout() {
    let file = config_file("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.source_root().to_str(), Some("./source"));
    assert_eq!(cfg.dest_root().to_str(), Some("./docs"));
    assert_eq!(cfg.build.jobs, 1);
    assert!(cfg.css.source_map);
    assert_eq!(cfg.css.browsers, vec!["defaults".to_string()]);
    assert_eq!(cfg.js.target, "es2015");
    assert!(!cfg.lint.css.fail_on_error);
    assert_eq!(cfg.watch.debounce_ms, 100);
}

#[test]
fn full_file_is_read() {
    let file = config_file(
        r#"
[paths]
source = "site"
dest = "public"

[build]
jobs = 4

[css]
entry = "styles/main.css"
source_map = false

browsers = ["last 2 versions", "not dead"]

[js]
target = "es2020"

[html]
remove_comments = false

[lint.css]
fail_on_error = true

[lint.css.rules]
"unit-no-unknown" = false

[watch]
debounce_ms = 0
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.source_root().to_str(), Some("site"));
    assert_eq!(cfg.build.jobs, 4);
    assert_eq!(cfg.css.entry.to_str(), Some("styles/main.css"));
    assert!(!cfg.css.source_map);
    assert_eq!(cfg.css.browsers.len(), 2);
    assert_eq!(cfg.js.target, "es2020");
    assert!(!cfg.html.remove_comments);
    assert!(cfg.html.collapse_whitespace);
    assert!(cfg.lint.css.fail_on_error);
    assert!(!cfg.lint.css.rule_enabled("unit-no-unknown"));
    assert!(cfg.lint.css.rule_enabled("block-no-empty"));
    assert_eq!(cfg.watch.debounce_ms, 0);
}

#[test]
fn identical_roots_are_rejected() {
    expect_config_error("[paths]\nsource = \"./site\"\ndest = \"site\"\n", "must differ");
}

#[test]
fn zero_jobs_is_rejected() {
    expect_config_error("[build]\njobs = 0\n", "jobs");
}

#[test]
fn entries_must_stay_inside_their_roots() {
    expect_config_error("[css]\nentry = \"../outside.css\"\n", "[css].entry");
    expect_config_error("[js]\noutput = \"/abs/script.js\"\n", "[js].output");
}

#[test]
fn dest_nested_in_source_is_rejected() {
    expect_config_error(
        "[paths]\nsource = \"./site\"\ndest = \"site/out\"\n",
        "must not be inside [paths].source",
    );
    expect_config_error(
        "[paths]\nsource = \"public/src\"\ndest = \"public\"\n",
        "must not be inside [paths].dest",
    );
}

#[test]
fn sibling_roots_with_a_shared_prefix_are_accepted() {
    let file = config_file("[paths]\nsource = \"site\"\ndest = \"site-out\"\n");
    assert!(load_and_validate(file.path()).is_ok());
}

#[test]
fn invalid_targets_are_rejected() {
    expect_config_error("[css]\nbrowsers = [\"no such browser 99\"]\n", "[css].browsers");
    expect_config_error("[js]\ntarget = \"es1999\"\n", "[js].target");
}

#[test]
fn empty_browser_list_disables_lowering() {
    let file = config_file("[css]\nbrowsers = []\n");
    let cfg = load_and_validate(file.path()).unwrap();
    assert!(cfg.css.browsers.is_empty());
}

#[test]
fn unknown_lint_rule_is_rejected() {
    expect_config_error("[lint.css.rules]\n\"no-such-rule\" = true\n", "no-such-rule");
}

#[test]
fn unknown_field_is_a_toml_error() {
    let file = config_file("[paths]\nsrc = \"site\"\n");
    match load_and_validate(file.path()) {
        Err(AssetflowError::Toml(_)) => {}
        other => panic!("Expected Toml error, got: {:?}", other),
    }
}

#[test]
fn missing_explicit_config_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Missing.toml");
    match load_or_default(&path, true) {
        Err(AssetflowError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected Io error, got: {:?}", other),
    }
}

#[test]
fn missing_default_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Assetflow.toml"), false).unwrap();
    assert_eq!(cfg.build.jobs, 1);
}
