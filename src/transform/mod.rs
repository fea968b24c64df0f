// src/transform/mod.rs

//! Content transforms plugged into pipelines as [`Stage`](crate::pipeline::Stage)s.
//!
//! Each stage is a thin wrapper over a compiler crate: lightningcss for
//! stylesheets, oxc for scripts, minify-html, oxipng and the `image`
//! codecs, roxmltree for SVG and serde_json for JSON.

pub mod css;
pub mod html;
pub mod image;
pub mod js;
pub mod json;
pub mod svg;

pub use css::CompileCss;
pub use html::MinifyHtml;
pub use image::OptimizeImage;
pub use js::MinifyJs;
pub use json::MinifyJson;
pub use svg::MinifySvg;
