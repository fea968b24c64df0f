// src/transform/html.rs

//! HTML minification through `minify-html`.
//!
//! [`HtmlMinifyOptions`] keeps the html-minifier option names used in
//! config files. The options `minify-html` can express are mapped onto its
//! [`Cfg`]; the rest are accepted and have no effect, since `minify-html`
//! always collapses whitespace, drops redundant quotes and keeps `pre` and
//! `textarea` content intact.

use minify_html::Cfg;
use serde::Deserialize;

use crate::errors::Result;
use crate::pipeline::{AssetFile, BuildContext, Stage};

/// Options mirroring html-minifier's, in snake_case.
///
/// Defaults are the values the standard `html` task uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HtmlMinifyOptions {
    pub case_sensitive: bool,
    pub collapse_boolean_attributes: bool,
    pub collapse_inline_tag_whitespace: bool,
    pub collapse_whitespace: bool,
    pub conservative_collapse: bool,
    pub decode_entities: bool,
    pub html5: bool,
    pub include_auto_generated_tags: bool,
    pub keep_closing_slash: bool,
    /// Minify `<style>` bodies and `style` attributes.
    pub minify_css: bool,
    /// Minify `<script>` bodies.
    pub minify_js: bool,
    pub minify_urls: bool,
    pub preserve_line_breaks: bool,
    pub prevent_attributes_escaping: bool,
    pub process_conditional_comments: bool,
    pub process_scripts: bool,
    pub quote_character: Option<char>,
    pub remove_attribute_quotes: bool,
    pub remove_comments: bool,
    pub remove_empty_attributes: bool,
    pub remove_empty_elements: bool,
    /// Drop closing tags and `<html>`/`<head>` start tags the parser infers.
    pub remove_optional_tags: bool,
    pub remove_redundant_attributes: bool,
    pub remove_script_type_attributes: bool,
    pub remove_style_link_type_attributes: bool,
    pub remove_tag_whitespace: bool,
    pub sort_attributes: bool,
    pub sort_class_name: bool,
    pub trim_custom_fragments: bool,
    pub use_short_doctype: bool,
    pub site_url: Option<String>,
}

impl Default for HtmlMinifyOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            collapse_boolean_attributes: true,
            collapse_inline_tag_whitespace: false,
            collapse_whitespace: true,
            conservative_collapse: false,
            decode_entities: false,
            html5: true,
            include_auto_generated_tags: false,
            keep_closing_slash: false,
            minify_css: true,
            minify_js: true,
            minify_urls: true,
            preserve_line_breaks: false,
            prevent_attributes_escaping: false,
            process_conditional_comments: false,
            process_scripts: false,
            quote_character: None,
            remove_attribute_quotes: true,
            remove_comments: true,
            remove_empty_attributes: true,
            remove_empty_elements: false,
            remove_optional_tags: true,
            remove_redundant_attributes: false,
            remove_script_type_attributes: true,
            remove_style_link_type_attributes: true,
            remove_tag_whitespace: true,
            sort_attributes: true,
            sort_class_name: true,
            trim_custom_fragments: true,
            use_short_doctype: true,
            site_url: None,
        }
    }
}

impl HtmlMinifyOptions {
    fn to_cfg(&self) -> Cfg {
        Cfg {
            do_not_minify_doctype: true,
            ensure_spec_compliant_unquoted_attribute_values: true,
            keep_closing_tags: !self.remove_optional_tags,
            keep_comments: !self.remove_comments,
            keep_html_and_head_opening_tags: !self.remove_optional_tags,
            minify_css: self.minify_css,
            minify_js: self.minify_js,
            ..Cfg::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MinifyHtml {
    options: HtmlMinifyOptions,
}

impl MinifyHtml {
    pub fn new(options: HtmlMinifyOptions) -> Self {
        Self { options }
    }
}

impl Stage for MinifyHtml {
    fn name(&self) -> &'static str {
        "html-minify"
    }

    fn apply(&self, mut file: AssetFile, _ctx: &BuildContext) -> Result<Vec<AssetFile>> {
        let minified = minify_html(file.text()?, &self.options);
        file.contents = minified.into_bytes();
        Ok(vec![file])
    }
}

/// Minify a document. `minify-html` recovers from malformed markup, so this
/// never fails.
pub fn minify_html(input: &str, options: &HtmlMinifyOptions) -> String {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let out = minify_html::minify(input.as_bytes(), &options.to_cfg());
    String::from_utf8_lossy(&out).into_owned()
}
