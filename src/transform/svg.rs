// src/transform/svg.rs

//! SVG minification over a `roxmltree` parse.
//!
//! The document is re-serialized without the XML declaration, doctype,
//! comments, processing instructions, `<metadata>`, editor namespaces and
//! empty groups. Whitespace between tags is dropped except inside text
//! content elements.

use roxmltree::{Document, Node, NodeType, ParsingOptions};

use crate::errors::{AssetflowError, Result};
use crate::pipeline::{AssetFile, BuildContext, Stage};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

const EDITOR_NAMESPACES: &[&str] = &[
    "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd",
    "http://www.inkscape.org/namespaces/inkscape",
];
const EDITOR_PREFIXES: &[&str] = &["sodipodi", "inkscape"];

/// Elements whose whitespace is rendered.
const TEXT_ELEMENTS: &[&str] = &["text", "tspan", "textPath", "title", "desc", "style", "script"];

#[derive(Debug, Clone, Default)]
pub struct MinifySvg;

impl Stage for MinifySvg {
    fn name(&self) -> &'static str {
        "svg-minify"
    }

    fn apply(&self, mut file: AssetFile, _ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let minified =
            minify_svg(file.text()?).map_err(|message| AssetflowError::parse(&file.path, message))?;
        file.contents = minified.into_bytes();
        Ok(vec![file])
    }
}

/// Minify an SVG document, returning a message for invalid XML or a
/// document whose root is not `<svg>`.
pub fn minify_svg(input: &str) -> std::result::Result<String, String> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(input, options).map_err(|e| format!("invalid SVG: {e}"))?;

    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(format!("root element is <{}>, expected <svg>", root.tag_name().name()));
    }

    let mut out = String::with_capacity(input.len());
    write_element(root, false, &mut out);
    Ok(out)
}

fn is_editor_ns(uri: Option<&str>) -> bool {
    uri.is_some_and(|uri| EDITOR_NAMESPACES.contains(&uri))
}

fn is_dropped_element(node: Node<'_, '_>) -> bool {
    let tag = node.tag_name();
    is_editor_ns(tag.namespace())
        || (tag.name() == "metadata" && tag.namespace().is_none_or(|ns| ns == SVG_NS))
}

/// `prefix:name` for a namespaced name, as declared in scope of `node`.
fn qualified(node: Node<'_, '_>, namespace: Option<&str>, name: &str, is_attribute: bool) -> String {
    let Some(uri) = namespace else {
        return name.to_string();
    };
    if uri == XML_NS {
        return format!("xml:{name}");
    }
    if !is_attribute && node.default_namespace() == Some(uri) {
        return name.to_string();
    }
    match node.lookup_prefix(uri) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
        _ => name.to_string(),
    }
}

fn write_element(node: Node<'_, '_>, keep_whitespace: bool, out: &mut String) {
    let name = qualified(node, node.tag_name().namespace(), node.tag_name().name(), false);
    let keep_whitespace = keep_whitespace || TEXT_ELEMENTS.contains(&node.tag_name().name());

    let mut body = String::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element if !is_dropped_element(child) => {
                write_element(child, keep_whitespace, &mut body);
            }
            NodeType::Text => {
                let text = child.text().unwrap_or_default();
                if keep_whitespace || !text.trim().is_empty() {
                    escape_text(text, &mut body);
                }
            }
            _ => {}
        }
    }

    if name == "g" && body.is_empty() {
        return;
    }

    out.push('<');
    out.push_str(&name);
    write_namespaces(node, out);
    for attr in node.attributes() {
        if is_editor_ns(attr.namespace()) {
            continue;
        }
        out.push(' ');
        out.push_str(&qualified(node, attr.namespace(), attr.name(), true));
        out.push_str("=\"");
        escape_attribute(attr.value(), out);
        out.push('"');
    }

    if body.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        out.push_str(&body);
        out.push_str("</");
        out.push_str(&name);
        out.push('>');
    }
}

/// Declarations new on `node` compared with its parent element.
fn write_namespaces(node: Node<'_, '_>, out: &mut String) {
    let parent = node.parent_element();
    for ns in node.namespaces() {
        if ns.uri() == XML_NS || is_editor_ns(Some(ns.uri())) {
            continue;
        }
        if ns.name().is_some_and(|prefix| EDITOR_PREFIXES.contains(&prefix)) {
            continue;
        }
        let inherited = parent.is_some_and(|p| {
            p.namespaces()
                .any(|other| other.name() == ns.name() && other.uri() == ns.uri())
        });
        if inherited {
            continue;
        }
        match ns.name() {
            Some(prefix) => out.push_str(&format!(" xmlns:{prefix}=\"")),
            None => out.push_str(" xmlns=\""),
        }
        escape_attribute(ns.uri(), out);
        out.push('"');
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
