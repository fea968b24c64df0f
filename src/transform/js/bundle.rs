// src/transform/js/bundle.rs

//! Module graph bundler.
//!
//! Starting at the entry, every module is parsed with oxc, lowered to the
//! configured syntax target, and its `import`, `export ... from` and
//! `require` specifiers are resolved node-style. Each module is then
//! rewritten into a function in a module table that a small prelude
//! evaluates on demand (the entry is module 0).
//!
//! Imports are copied into locals when the importing module starts, so
//! they are not live bindings: reassigning an exported `let` later is not
//! seen by importers.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Argument, BindingPattern, BindingPatternKind, CallExpression, Declaration,
    ExportDefaultDeclarationKind, Expression, ImportDeclarationSpecifier, ModuleExportName,
    Program, Statement,
};
use oxc::ast_visit::{Visit, walk};
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::{GetSpan, SourceType, Span};
use oxc::transformer::{TransformOptions, Transformer};
use tracing::debug;

use crate::errors::{AssetflowError, Result};
use crate::fs::normalize_path;
use crate::pipeline::BuildContext;

const PRELUDE: &[&str] = &[
    "(function (modules) {",
    "var cache = {};",
    "function __default(m) { return m && m.__esModule ? m.default : m; }",
    "function __export(target, source) { Object.keys(source).forEach(function (k) { if (k !== \"default\" && k !== \"__esModule\" && !(k in target)) target[k] = source[k]; }); }",
    "function __require(id) {",
    "if (cache[id]) return cache[id].exports;",
    "var module = cache[id] = { exports: {} };",
    "modules[id].call(module.exports, module, module.exports, __require, __default, __export);",
    "return module.exports;",
    "}",
    "__require(0);",
    "})([",
];

const MODULE_HEADER: &str = "function (module, exports, __require, __default, __export) {";

/// Syntax target used when none is configured.
pub const DEFAULT_TARGET: &str = "es2015";

/// A compiled module graph.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub code: String,
    /// Module paths in id order, entry first.
    pub modules: Vec<PathBuf>,
}

/// Lowering options for a target such as `es2015` or `chrome80`.
pub fn transform_options(target: &str) -> Result<TransformOptions> {
    TransformOptions::from_target(target)
        .map_err(|e| AssetflowError::config(format!("invalid [js].target '{target}': {e}")))
}

struct Module {
    /// Full path (source root joined).
    path: PathBuf,
    /// Lowered code, or the raw text of a JSON module.
    code: String,
    /// Specifier -> module id.
    deps: HashMap<String, usize>,
}

/// Resolve and compile the module graph rooted at `entry` (relative to the
/// source root).
///
/// Any unresolvable specifier or syntax error fails the whole bundle with a
/// parse error.
pub fn bundle_module_graph(ctx: &BuildContext, entry: &Path, target: &str) -> Result<Bundle> {
    let options = transform_options(target)?;
    let entry_path = ctx.source_path(entry);

    if !ctx.fs.is_file(&entry_path) {
        return Err(AssetflowError::parse(entry, "entry module not found"));
    }

    let mut ids: HashMap<PathBuf, usize> = HashMap::new();
    let mut modules: Vec<Module> = Vec::new();
    let mut queue = VecDeque::new();

    let entry_norm = normalize_path(&entry_path).unwrap_or(entry_path);
    ids.insert(entry_norm.clone(), 0);
    queue.push_back(entry_norm);

    while let Some(path) = queue.pop_front() {
        let source = ctx.fs.read_to_string(&path)?;
        let source = source.strip_prefix('\u{feff}').unwrap_or(&source);
        let display = ctx.display_rel(&path);
        let mut deps = HashMap::new();

        let code = if is_json(&path) {
            source.trim_end().to_string()
        } else {
            let code = lower(&path, &display, source, &options)?;
            for spec in module_specifiers(&display, &code)? {
                if deps.contains_key(&spec) {
                    continue;
                }
                let resolved = resolve(ctx, &path, &spec).ok_or_else(|| {
                    AssetflowError::parse(&display, format!("cannot resolve module '{spec}'"))
                })?;
                let next_id = ids.len();
                let id = *ids.entry(resolved.clone()).or_insert_with(|| {
                    queue.push_back(resolved);
                    next_id
                });
                deps.insert(spec, id);
            }
            code
        };

        let module_name = &display;
        debug!(module = %module_name, deps = deps.len(), "module resolved");
        modules.push(Module { path, code, deps });
    }

    let mut code_lines: Vec<String> = PRELUDE.iter().map(|l| l.to_string()).collect();
    for module in &modules {
        let body = if is_json(&module.path) {
            format!("module.exports = {};", module.code)
        } else {
            rewrite_module(&ctx.display_rel(&module.path), &module.code, &module.deps)?
        };
        code_lines.push(MODULE_HEADER.to_string());
        code_lines.push(body);
        code_lines.push("},".to_string());
    }
    code_lines.push("]);".to_string());

    Ok(Bundle {
        code: code_lines.join("\n"),
        modules: modules.into_iter().map(|m| m.path).collect(),
    })
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn parse<'a>(allocator: &'a Allocator, display: &str, code: &'a str) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, code, SourceType::mjs()).parse();
    match ret.errors.first() {
        Some(err) => Err(AssetflowError::parse(display, err.to_string())),
        None => Ok(ret.program),
    }
}

/// Down-level one module's syntax for the configured target.
fn lower(path: &Path, display: &str, source: &str, options: &TransformOptions) -> Result<String> {
    let allocator = Allocator::default();
    let mut program = parse(&allocator, display, source)?;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let ret = Transformer::new(&allocator, path, options).build_with_scoping(scoping, &mut program);
    if let Some(err) = ret.errors.first() {
        return Err(AssetflowError::parse(display, err.to_string()));
    }
    Ok(Codegen::new().build(&program).code)
}

/// `require("...")` calls with a single string argument.
#[derive(Default)]
struct RequireCalls {
    calls: Vec<(Span, String)>,
}

impl<'a> Visit<'a> for RequireCalls {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Some(spec) = require_specifier(call) {
            self.calls.push((call.span, spec.to_string()));
        }
        walk::walk_call_expression(self, call);
    }
}

fn require_specifier<'b>(call: &'b CallExpression<'_>) -> Option<&'b str> {
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    if callee.name.as_str() != "require" || call.arguments.len() != 1 {
        return None;
    }
    match &call.arguments[0] {
        Argument::StringLiteral(lit) => Some(lit.value.as_str()),
        _ => None,
    }
}

/// Every module specifier referenced by `code`, in source order.
fn module_specifiers(display: &str, code: &str) -> Result<Vec<String>> {
    let allocator = Allocator::default();
    let program = parse(&allocator, display, code)?;

    let mut specs = Vec::new();
    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => specs.push(decl.source.value.to_string()),
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(source) = &decl.source {
                    specs.push(source.value.to_string());
                }
            }
            Statement::ExportAllDeclaration(decl) => specs.push(decl.source.value.to_string()),
            _ => {}
        }
    }

    let mut requires = RequireCalls::default();
    requires.visit_program(&program);
    specs.extend(requires.calls.into_iter().map(|(_, spec)| spec));
    Ok(specs)
}

/// Text replacements over a module, applied back to front of the source.
#[derive(Default)]
struct Rewriter {
    edits: Vec<(u32, u32, String)>,
    tail: Vec<String>,
    counter: usize,
}

impl Rewriter {
    fn replace(&mut self, start: u32, end: u32, text: impl Into<String>) {
        self.edits.push((start, end, text.into()));
    }

    fn temp(&mut self) -> String {
        self.counter += 1;
        format!("__m{}", self.counter)
    }

    fn apply(mut self, code: &str, is_es_module: bool) -> String {
        self.edits.sort_by_key(|(start, _, _)| *start);

        let mut out = String::with_capacity(code.len() + 64);
        if is_es_module {
            out.push_str("exports.__esModule = true;\n");
        }
        let mut last = 0usize;
        for (start, end, text) in &self.edits {
            let (start, end) = (*start as usize, *end as usize);
            if start < last {
                continue;
            }
            out.push_str(&code[last..start]);
            out.push_str(text);
            last = end;
        }
        out.push_str(&code[last..]);

        if !self.tail.is_empty() {
            out.push('\n');
            out.push_str(&self.tail.join(" "));
        }
        out
    }
}

/// Rewrite ES module syntax and `require` calls against the module table.
fn rewrite_module(display: &str, code: &str, deps: &HashMap<String, usize>) -> Result<String> {
    let allocator = Allocator::default();
    let program = parse(&allocator, display, code)?;
    let id_of = |spec: &str| {
        deps.get(spec).copied().ok_or_else(|| {
            AssetflowError::parse(display, format!("cannot resolve module '{spec}'"))
        })
    };

    let mut rw = Rewriter::default();
    let mut is_es_module = false;

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                is_es_module = true;
                let id = id_of(decl.source.value.as_str())?;
                let specifiers = decl.specifiers.as_ref().filter(|s| !s.is_empty());
                let Some(specifiers) = specifiers else {
                    rw.replace(decl.span.start, decl.span.end, format!("__require({id});"));
                    continue;
                };

                let tmp = rw.temp();
                let mut bindings = vec![format!("{tmp} = __require({id})")];
                for spec in specifiers {
                    bindings.push(match spec {
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            format!("{} = __default({tmp})", s.local.name)
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            format!("{} = {tmp}", s.local.name)
                        }
                        ImportDeclarationSpecifier::ImportSpecifier(s) => {
                            format!("{} = {}", s.local.name, imported_value(&tmp, &s.imported))
                        }
                    });
                }
                rw.replace(decl.span.start, decl.span.end, format!("var {};", bindings.join(", ")));
            }
            Statement::ExportNamedDeclaration(decl) => {
                is_es_module = true;
                if let Some(source) = &decl.source {
                    let id = id_of(source.value.as_str())?;
                    let tmp = rw.temp();
                    let mut out = format!("var {tmp} = __require({id});");
                    for spec in &decl.specifiers {
                        let value = imported_value(&tmp, &spec.local);
                        out.push(' ');
                        out.push_str(&export_assignment(spec.exported.name().as_str(), &value));
                    }
                    rw.replace(decl.span.start, decl.span.end, out);
                } else if let Some(declaration) = &decl.declaration {
                    rw.replace(decl.span.start, declaration.span().start, "");
                    let mut names = Vec::new();
                    declared_names(declaration, &mut names);
                    for name in names {
                        rw.tail.push(export_assignment(&name, &name));
                    }
                } else {
                    rw.replace(decl.span.start, decl.span.end, "");
                    for spec in &decl.specifiers {
                        let assignment =
                            export_assignment(spec.exported.name().as_str(), spec.local.name().as_str());
                        rw.tail.push(assignment);
                    }
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                is_es_module = true;
                let body = decl.declaration.span();
                let named = match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                        Some(f.id.as_ref().map(|id| id.name.to_string()))
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                        Some(c.id.as_ref().map(|id| id.name.to_string()))
                    }
                    _ => None,
                };
                match named {
                    Some(Some(name)) => {
                        rw.replace(decl.span.start, body.start, "");
                        rw.tail.push(export_assignment("default", &name));
                    }
                    Some(None) => {
                        rw.replace(decl.span.start, body.start, "exports.default = ");
                        rw.replace(body.end, body.end, ";");
                    }
                    None => rw.replace(decl.span.start, body.start, "exports.default = "),
                }
            }
            Statement::ExportAllDeclaration(decl) => {
                is_es_module = true;
                let id = id_of(decl.source.value.as_str())?;
                let text = match &decl.exported {
                    Some(name) => export_assignment(name.name().as_str(), &format!("__require({id})")),
                    None => format!("__export(exports, __require({id}));"),
                };
                rw.replace(decl.span.start, decl.span.end, text);
            }
            _ => {}
        }
    }

    let mut requires = RequireCalls::default();
    requires.visit_program(&program);
    for (span, spec) in requires.calls {
        let id = id_of(&spec)?;
        rw.replace(span.start, span.end, format!("__require({id})"));
    }

    Ok(rw.apply(code, is_es_module))
}

/// Names bound by an exported declaration.
fn declared_names(declaration: &Declaration<'_>, out: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                pattern_names(&declarator.id, out);
            }
        }
        Declaration::FunctionDeclaration(f) => out.extend(f.id.as_ref().map(|id| id.name.to_string())),
        Declaration::ClassDeclaration(c) => out.extend(c.id.as_ref().map(|id| id.name.to_string())),
        _ => {}
    }
}

fn pattern_names(pattern: &BindingPattern<'_>, out: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => out.push(id.name.to_string()),
        BindingPatternKind::ObjectPattern(obj) => {
            for property in &obj.properties {
                pattern_names(&property.value, out);
            }
            if let Some(rest) = &obj.rest {
                pattern_names(&rest.argument, out);
            }
        }
        BindingPatternKind::ArrayPattern(arr) => {
            for element in arr.elements.iter().flatten() {
                pattern_names(element, out);
            }
            if let Some(rest) = &arr.rest {
                pattern_names(&rest.argument, out);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => pattern_names(&assign.left, out),
    }
}

/// Read export `name` of the module object in `tmp`.
fn imported_value(tmp: &str, name: &ModuleExportName<'_>) -> String {
    let name = name.name();
    if name.as_str() == "default" {
        format!("__default({tmp})")
    } else {
        member(tmp, name.as_str())
    }
}

fn export_assignment(exported: &str, value: &str) -> String {
    format!("{} = {value};", member("exports", exported))
}

/// `object.name`, or `object["name"]` for names that are not identifiers.
fn member(object: &str, name: &str) -> String {
    let is_identifier = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        format!("{object}.{name}")
    } else {
        let quoted = serde_json::to_string(name).unwrap_or_else(|_| format!("\"{name}\""));
        format!("{object}[{quoted}]")
    }
}

/// Node-style resolution for `spec` imported from module `from`.
fn resolve(ctx: &BuildContext, from: &Path, spec: &str) -> Option<PathBuf> {
    let base = from.parent().unwrap_or(Path::new(""));

    if spec.starts_with("./") || spec.starts_with("../") || spec == "." || spec == ".." {
        let target = normalize_path(&base.join(spec))?;
        return load_as_file(ctx, &target).or_else(|| load_as_directory(ctx, &target));
    }

    if let Some(rooted) = spec.strip_prefix('/') {
        let target = normalize_path(&ctx.source_root.join(rooted))?;
        return load_as_file(ctx, &target).or_else(|| load_as_directory(ctx, &target));
    }

    let mut dir = Some(base);
    while let Some(current) = dir {
        let candidate = current.join("node_modules").join(spec);
        if let Some(found) = normalize_path(&candidate)
            .and_then(|c| load_as_file(ctx, &c).or_else(|| load_as_directory(ctx, &c)))
        {
            return Some(found);
        }
        dir = current.parent();
    }
    None
}

fn load_as_file(ctx: &BuildContext, target: &Path) -> Option<PathBuf> {
    if ctx.fs.is_file(target) {
        return Some(target.to_path_buf());
    }
    ["js", "mjs", "json"].iter().find_map(|ext| {
        let mut name = target.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        let candidate = PathBuf::from(name);
        ctx.fs.is_file(&candidate).then_some(candidate)
    })
}

fn load_as_directory(ctx: &BuildContext, target: &Path) -> Option<PathBuf> {
    if !ctx.fs.is_dir(target) {
        return None;
    }

    let manifest = target.join("package.json");
    if ctx.fs.is_file(&manifest) {
        if let Some(main) = ctx
            .fs
            .read_to_string(&manifest)
            .ok()
            .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
            .and_then(|json| json.get("main").and_then(|m| m.as_str()).map(str::to_string))
        {
            if let Some(main_path) = normalize_path(&target.join(&main)) {
                if let Some(found) = load_as_file(ctx, &main_path) {
                    return Some(found);
                }
                let index = main_path.join("index.js");
                if ctx.fs.is_file(&index) {
                    return Some(index);
                }
            }
        }
    }

    let index = target.join("index.js");
    ctx.fs.is_file(&index).then_some(index)
}
