// src/transform/js/mod.rs

pub mod bundle;
pub mod minify;

pub use bundle::{Bundle, DEFAULT_TARGET, bundle_module_graph, transform_options};
pub use minify::{MinifiedScript, MinifyJs, minify_script};
