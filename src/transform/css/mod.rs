// src/transform/css/mod.rs

//! Stylesheet compilation: `@import` bundling, lowering for the configured
//! browsers and minification, all through lightningcss.

pub mod compile;

pub use compile::{CompileCss, css_targets};
