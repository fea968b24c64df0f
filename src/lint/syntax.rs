// src/lint/syntax.rs

//! Stylesheet outline for the linter, read from the `cssparser` tokenizer.
//!
//! The outline only keeps what the rules look at: comments, declarations,
//! qualified rules and at-rules, each with the line it starts on.
//! Tokenizing never fails, so malformed input is detected here: unclosed
//! blocks, comments and strings, stray `}` and declarations without a colon.

use cssparser::{ParseError, Parser, ParserInput, SourcePosition, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line.
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: &str) -> Self {
        Self {
            line,
            message: message.to_string(),
        }
    }
}

type Parsed<T> = std::result::Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Comment(Comment),
    Decl(Declaration),
    Rule(Rule),
    AtRule(AtRule),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub line: usize,
    pub property: String,
    /// Value text with `!important` left in place.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub line: usize,
    pub selector: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    pub line: usize,
    pub name: String,
    pub prelude: String,
    /// `None` for statement at-rules such as `@import`.
    pub children: Option<Vec<Node>>,
}

pub fn parse_stylesheet(text: &str) -> Parsed<Vec<Node>> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut nodes = Vec::new();
    parse_block(&mut parser, &mut nodes)?;
    Ok(nodes)
}

fn line_of(p: &Parser<'_, '_>) -> usize {
    p.current_source_location().line as usize + 1
}

fn check_comment(p: &Parser<'_, '_>, start: SourcePosition, line: usize) -> Parsed<()> {
    let raw = p.slice_from(start);
    if raw.len() < 4 || !raw.ends_with("*/") {
        return Err(SyntaxError::new(line, "Unclosed comment"));
    }
    Ok(())
}

/// Statements of the stylesheet or of one `{}` block, until the input ends.
fn parse_block<'i>(p: &mut Parser<'i, '_>, nodes: &mut Vec<Node>) -> Parsed<()> {
    loop {
        let start = p.position();
        let line = line_of(p);
        let token = match p.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };

        match token {
            Token::WhiteSpace(_) | Token::Semicolon | Token::CDO | Token::CDC => {}
            Token::Comment(text) => {
                check_comment(p, start, line)?;
                nodes.push(Node::Comment(Comment {
                    line,
                    text: text.to_string(),
                }));
            }
            Token::CloseCurlyBracket => return Err(SyntaxError::new(line, "Unexpected }")),
            Token::AtKeyword(name) => {
                let name = name.to_string();
                let prelude_start = p.position();
                let stmt = collect(p, line, None)?;
                nodes.push(Node::AtRule(AtRule {
                    line,
                    name,
                    prelude: p.slice(prelude_start..stmt.prelude_end).trim().to_string(),
                    children: stmt.block,
                }));
            }
            first => {
                let stmt = collect(p, line, Some((start, first)))?;
                let node = match stmt.block {
                    Some(children) => Node::Rule(Rule {
                        line,
                        selector: p.slice(start..stmt.prelude_end).trim().to_string(),
                        children,
                    }),
                    None => {
                        let (colon_start, colon_end) =
                            stmt.colon.ok_or_else(|| SyntaxError::new(line, "Unknown word"))?;
                        let property = p.slice(start..colon_start).trim();
                        if property.is_empty() {
                            return Err(SyntaxError::new(line, "Missing property name"));
                        }
                        Node::Decl(Declaration {
                            line,
                            property: property.to_string(),
                            value: p.slice(colon_end..stmt.prelude_end).trim().to_string(),
                        })
                    }
                };
                nodes.push(node);
            }
        }
    }
}

struct Statement {
    prelude_end: SourcePosition,
    /// Span of the first top-level `:`.
    colon: Option<(SourcePosition, SourcePosition)>,
    block: Option<Vec<Node>>,
}

/// Read one statement up to its `;`, its `{}` block or the end of input.
fn collect<'i>(
    p: &mut Parser<'i, '_>,
    line: usize,
    mut pending: Option<(SourcePosition, Token<'i>)>,
) -> Parsed<Statement> {
    let mut colon = None;
    loop {
        let (before, token) = match pending.take() {
            Some(first) => first,
            None => {
                let before = p.position();
                match p.next_including_whitespace_and_comments() {
                    Ok(token) => (before, token.clone()),
                    Err(_) => {
                        return Ok(Statement {
                            prelude_end: p.position(),
                            colon,
                            block: None,
                        });
                    }
                }
            }
        };

        match token {
            Token::Semicolon => {
                return Ok(Statement {
                    prelude_end: before,
                    colon,
                    block: None,
                });
            }
            Token::CurlyBracketBlock => {
                let children = nested_block(p, line)?;
                return Ok(Statement {
                    prelude_end: before,
                    colon,
                    block: Some(children),
                });
            }
            Token::Colon if colon.is_none() => colon = Some((before, p.position())),
            Token::Comment(_) => check_comment(p, before, line_of(p))?,
            Token::BadString(_) => return Err(SyntaxError::new(line_of(p), "Unclosed string")),
            Token::BadUrl(_) => return Err(SyntaxError::new(line_of(p), "Unclosed url")),
            Token::CloseCurlyBracket => return Err(SyntaxError::new(line_of(p), "Unexpected }")),
            _ => {}
        }
    }
}

/// Parse the `{}` block just returned by the tokenizer.
///
/// The tokenizer closes blocks at end of input; a block is only closed in
/// the source if its `}` moved the position past the block's last token.
fn nested_block<'i>(p: &mut Parser<'i, '_>, line: usize) -> Parsed<Vec<Node>> {
    let parsed = p.parse_nested_block(|inner| {
        let mut nodes = Vec::new();
        let result = parse_block(inner, &mut nodes).map(|()| nodes);
        while inner.next_including_whitespace_and_comments().is_ok() {}
        Ok::<_, ParseError<'i, ()>>((result, inner.position().byte_index()))
    });

    let (children, inner_end) = parsed.map_err(|_| SyntaxError::new(line, "Unclosed block"))?;
    let children = children?;
    if p.position().byte_index() == inner_end {
        return Err(SyntaxError::new(line, "Unclosed block"));
    }
    Ok(children)
}
