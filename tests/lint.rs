// tests/lint.rs

mod common;
use crate::common::{RegistryBuilder, TestResult, init_tracing, mock_fs, mock_runner, with_timeout};

use std::path::Path;

use assetflow::config::CssLintSection;
use assetflow::lint::CssLintGate;
use assetflow::lint::css_rules::{
    BLOCK_NO_EMPTY, COLOR_NO_INVALID_HEX, COMMENT_NO_EMPTY,
    DECLARATION_BLOCK_NO_DUPLICATE_PROPERTIES, NO_DUPLICATE_SELECTORS, SYNTAX_ERROR,
    UNIT_NO_UNKNOWN,
};
use assetflow::pipeline::SourceSet;
use assetflow::types::TriggerReason;

const SHEET: &str = "a { color: #12; }
b {}
a { margin: 1pz; }
c { color: red; color: blue; }
/* */
";

fn gate(settings: CssLintSection) -> CssLintGate {
    CssLintGate::new(SourceSet::new(["**/*.css"]).unwrap(), settings)
}

#[test]
fn every_rule_reports_on_its_line() {
    let violations = gate(CssLintSection::default())
        .lint_text(Path::new("style.css"), SHEET)
        .unwrap();

    let found: Vec<(&str, usize)> = violations
        .iter()
        .map(|v| (v.rule.as_str(), v.line))
        .collect();
    assert_eq!(
        found,
        vec![
            (COLOR_NO_INVALID_HEX, 1),
            (BLOCK_NO_EMPTY, 2),
            (NO_DUPLICATE_SELECTORS, 3),
            (UNIT_NO_UNKNOWN, 3),
            (DECLARATION_BLOCK_NO_DUPLICATE_PROPERTIES, 4),
            (COMMENT_NO_EMPTY, 5),
        ]
    );
    assert_eq!(
        violations[0].to_string(),
        "style.css:1 Unexpected invalid hex color \"#12\" (color-no-invalid-hex)"
    );
}

#[test]
fn disabled_rules_are_silent() {
    let mut settings = CssLintSection::default();
    settings.rules.insert(UNIT_NO_UNKNOWN.to_string(), false);
    settings.rules.insert(BLOCK_NO_EMPTY.to_string(), false);

    let violations = gate(settings)
        .lint_text(Path::new("style.css"), SHEET)
        .unwrap();

    assert!(violations.iter().all(|v| v.rule != UNIT_NO_UNKNOWN && v.rule != BLOCK_NO_EMPTY));
    assert_eq!(violations.len(), 4);
}

#[test]
fn custom_properties_and_urls_are_not_checked_for_units() {
    let text = ":root { --gap: 2zz; }\n.a { background: url(img/1x2y.png); width: 1e3px; }\n";
    let violations = gate(CssLintSection::default())
        .lint_text(Path::new("style.css"), text)
        .unwrap();
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn syntax_error_is_reported_as_a_violation() {
    let violations = gate(CssLintSection::default())
        .lint_text(Path::new("broken.css"), "a { color: red;\n")
        .unwrap();

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule, SYNTAX_ERROR);
    assert_eq!(violations[0].line, 1);
}

#[test]
fn outline_errors_name_the_offending_line() {
    use assetflow::lint::syntax::parse_stylesheet;

    let err = parse_stylesheet("a { color: red; }\n}\n").unwrap_err();
    assert_eq!((err.line, err.message.as_str()), (2, "Unexpected }"));

    let err = parse_stylesheet("a { color: red; }\n/* open").unwrap_err();
    assert_eq!((err.line, err.message.as_str()), (2, "Unclosed comment"));

    let err = parse_stylesheet("a { color }\n").unwrap_err();
    assert_eq!(err.message, "Unknown word");

    let nodes = parse_stylesheet("@import \"a.css\";\n@media print { a { color: red; } }\n").unwrap();
    assert_eq!(nodes.len(), 2);
}

#[tokio::test]
async fn violations_are_reported_without_failing_by_default() -> TestResult {
    init_tracing();
    let fs = mock_fs();
    fs.add_file("source/style.css", SHEET);
    let registry = RegistryBuilder::new()
        .pipeline("lint:css", gate(CssLintSection::default()), &[])
        .build();
    let runner = mock_runner(registry, &fs);

    let summary = with_timeout(runner.run("lint:css")).await?;

    assert_eq!(summary.violations.len(), 6);
    assert!(fs.written_paths().is_empty());
    Ok(())
}

#[tokio::test]
async fn fail_on_error_turns_violations_into_a_task_failure() -> TestResult {
    init_tracing();
    let fs = mock_fs();
    fs.add_file("source/style.css", SHEET);
    fs.add_file("source/clean.css", ".ok { margin: 0; }\n");
    let settings = CssLintSection {
        fail_on_error: true,
        ..CssLintSection::default()
    };
    let registry = RegistryBuilder::new()
        .pipeline("lint:css", gate(settings), &[])
        .aggregate("lint", &["lint:css"])
        .build();
    let runner = mock_runner(registry, &fs);

    let summary = with_timeout(runner.execute("lint", TriggerReason::Manual)).await?;

    assert_eq!(summary.failed, vec!["lint:css".to_string()]);
    assert_eq!(summary.skipped, vec!["lint".to_string()]);
    assert_eq!(summary.violations.len(), 6);
    Ok(())
}
