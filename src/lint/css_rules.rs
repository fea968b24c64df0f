// src/lint/css_rules.rs

//! Built-in stylesheet rules.

use std::collections::HashSet;

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::lint::syntax::{Declaration, Node};

pub const BLOCK_NO_EMPTY: &str = "block-no-empty";
pub const COLOR_NO_INVALID_HEX: &str = "color-no-invalid-hex";
pub const DECLARATION_BLOCK_NO_DUPLICATE_PROPERTIES: &str = "declaration-block-no-duplicate-properties";
pub const COMMENT_NO_EMPTY: &str = "comment-no-empty";
pub const NO_DUPLICATE_SELECTORS: &str = "no-duplicate-selectors";
pub const UNIT_NO_UNKNOWN: &str = "unit-no-unknown";

/// Pseudo-rule reported when a stylesheet cannot be parsed.
pub const SYNTAX_ERROR: &str = "CssSyntaxError";

/// Every rule id that can be configured under `[lint.css.rules]`.
pub const RULE_IDS: &[&str] = &[
    BLOCK_NO_EMPTY,
    COLOR_NO_INVALID_HEX,
    DECLARATION_BLOCK_NO_DUPLICATE_PROPERTIES,
    COMMENT_NO_EMPTY,
    NO_DUPLICATE_SELECTORS,
    UNIT_NO_UNKNOWN,
];

const KNOWN_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "rex", "ch", "rch", "ic", "ric", "cap", "rcap", "lh", "rlh", "vw",
    "vh", "vi", "vb", "vmin", "vmax", "svw", "svh", "svi", "svb", "svmin", "svmax", "lvw", "lvh",
    "lvi", "lvb", "lvmin", "lvmax", "dvw", "dvh", "dvi", "dvb", "dvmin", "dvmax", "cqw", "cqh",
    "cqi", "cqb", "cqmin", "cqmax", "cm", "mm", "q", "in", "pt", "pc", "deg", "grad", "rad",
    "turn", "s", "ms", "hz", "khz", "dpi", "dpcm", "dppx", "x", "fr",
];

/// One rule finding before it is attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule: &'static str,
    pub line: usize,
    pub message: String,
}

/// Run every enabled rule over a stylesheet outline.
///
/// Findings are ordered by line.
pub fn check_stylesheet(nodes: &[Node], enabled: &dyn Fn(&str) -> bool) -> Vec<Finding> {
    let mut checker = Checker {
        enabled,
        findings: Vec::new(),
    };
    checker.block(nodes);
    checker.findings.sort_by_key(|f| f.line);
    checker.findings
}

struct Checker<'a> {
    enabled: &'a dyn Fn(&str) -> bool,
    findings: Vec<Finding>,
}

impl Checker<'_> {
    fn report(&mut self, rule: &'static str, line: usize, message: String) {
        if (self.enabled)(rule) {
            self.findings.push(Finding { rule, line, message });
        }
    }

    /// Selectors and properties are compared within a single block.
    fn block(&mut self, nodes: &[Node]) {
        let mut selectors: HashSet<String> = HashSet::new();
        let mut properties: HashSet<String> = HashSet::new();

        for node in nodes {
            match node {
                Node::Comment(comment) => {
                    if comment.text.trim().is_empty() {
                        self.report(COMMENT_NO_EMPTY, comment.line, "Unexpected empty comment".to_string());
                    }
                }
                Node::Decl(decl) => {
                    let property = decl.property.to_ascii_lowercase();
                    if !properties.insert(property.clone()) {
                        self.report(
                            DECLARATION_BLOCK_NO_DUPLICATE_PROPERTIES,
                            decl.line,
                            format!("Unexpected duplicate \"{property}\""),
                        );
                    }
                    self.declaration(decl);
                }
                Node::Rule(rule) => {
                    if rule.children.is_empty() {
                        self.report(BLOCK_NO_EMPTY, rule.line, "Unexpected empty block".to_string());
                    }
                    let normalized = normalize_selector(&rule.selector);
                    if !selectors.insert(normalized.clone()) {
                        self.report(
                            NO_DUPLICATE_SELECTORS,
                            rule.line,
                            format!("Unexpected duplicate selector \"{normalized}\""),
                        );
                    }
                    self.block(&rule.children);
                }
                Node::AtRule(at) => {
                    if let Some(children) = &at.children {
                        if children.is_empty() {
                            self.report(BLOCK_NO_EMPTY, at.line, "Unexpected empty block".to_string());
                        }
                        self.block(children);
                    }
                }
            }
        }
    }

    fn declaration(&mut self, decl: &Declaration) {
        if decl.property.starts_with("--") {
            return;
        }

        let mut tokens = ValueTokens::default();
        let mut input = ParserInput::new(&decl.value);
        scan_value(&mut Parser::new(&mut input), &mut tokens);

        for digits in &tokens.hashes {
            let valid_len = matches!(digits.len(), 3 | 4 | 6 | 8);
            if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                self.report(
                    COLOR_NO_INVALID_HEX,
                    decl.line,
                    format!("Unexpected invalid hex color \"#{digits}\""),
                );
            }
        }

        if decl.property.eq_ignore_ascii_case("unicode-range") {
            return;
        }
        for unit in &tokens.units {
            if !KNOWN_UNITS.contains(&unit.to_ascii_lowercase().as_str()) {
                self.report(UNIT_NO_UNKNOWN, decl.line, format!("Unexpected unknown unit \"{unit}\""));
            }
        }
    }
}

/// Hash and dimension tokens of a declaration value.
#[derive(Debug, Default)]
struct ValueTokens {
    hashes: Vec<String>,
    units: Vec<String>,
}

/// Collect from every nesting level except `url()`.
fn scan_value<'i>(p: &mut Parser<'i, '_>, found: &mut ValueTokens) {
    loop {
        let token = match p.next() {
            Ok(token) => token.clone(),
            Err(_) => return,
        };
        match token {
            Token::Hash(value) | Token::IDHash(value) => found.hashes.push(value.to_string()),
            Token::Dimension { unit, .. } => found.units.push(unit.to_string()),
            Token::Function(name) if name.eq_ignore_ascii_case("url") => {}
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let _ = p.parse_nested_block(|inner| {
                    scan_value(inner, found);
                    Ok::<_, ParseError<'i, ()>>(())
                });
            }
            _ => {}
        }
    }
}

fn normalize_selector(selector: &str) -> String {
    let mut parts: Vec<String> = selector
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    parts.sort();
    parts.join(",")
}
