//! Pluggable import and module-wrap strategies.
//!
//! The generator lowers Shed constructs the same way for every host. How a
//! module pulls in its imports and how it publishes its exports differ by
//! host, so those two decisions are delegated to the traits here.

use shed_types::ast::ModulePath;

use crate::js::{JsExpr, JsFunction, JsProperty, JsStmt, VarKind};

// ══════════════════════════════════════════════════════════════════════════════
// Traits
// ══════════════════════════════════════════════════════════════════════════════

/// Renders one import declaration.
pub trait ImportGenerator: Send + Sync {
    /// The statement binding `binding` to the module `target`, imported from
    /// the module `from`.
    fn import(&self, binding: &str, from: &ModulePath, target: &ModulePath) -> JsStmt;
}

/// Wraps a generated module body.
pub trait ModuleWrapper: Send + Sync {
    /// Wrap `body` (imports first, then declarations) for `module`,
    /// publishing `exports`.
    fn wrap(&self, module: &ModulePath, body: Vec<JsStmt>, exports: Vec<JsProperty>) -> Vec<JsStmt>;
}

// ══════════════════════════════════════════════════════════════════════════════
// Browser
// ══════════════════════════════════════════════════════════════════════════════

/// `var m = SHED.importModule("a.b.m");`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserImports;

impl ImportGenerator for BrowserImports {
    fn import(&self, binding: &str, _from: &ModulePath, target: &ModulePath) -> JsStmt {
        JsStmt::Var {
            kind: VarKind::Var,
            name: binding.to_string(),
            init: JsExpr::call(
                JsExpr::path("SHED.importModule"),
                vec![JsExpr::string(target.to_string())],
            ),
        }
    }
}

/// `SHED.exportModule("a.b.m", function() { ...; return { exports }; });`
///
/// Every module body runs in its own function scope, so any number of
/// modules can share one script.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserModuleWrapper;

impl ModuleWrapper for BrowserModuleWrapper {
    fn wrap(&self, module: &ModulePath, mut body: Vec<JsStmt>, exports: Vec<JsProperty>) -> Vec<JsStmt> {
        body.push(JsStmt::Return(Some(JsExpr::Object(exports))));
        let factory = JsExpr::Function(Box::new(JsFunction {
            name: None,
            params: Vec::new(),
            body,
        }));
        vec![JsStmt::Expr(JsExpr::call(
            JsExpr::path("SHED.exportModule"),
            vec![JsExpr::string(module.to_string()), factory],
        ))]
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// CommonJS
// ══════════════════════════════════════════════════════════════════════════════

/// `var m = require("../b/m");`, with the path relative to the importing
/// module's own file.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonJsImports;

impl CommonJsImports {
    /// The `require` specifier for `target` as seen from `from`.
    pub fn specifier(from: &ModulePath, target: &ModulePath) -> String {
        let from_dir = &from.segments()[..from.segments().len().saturating_sub(1)];
        let target = target.segments();
        let common = from_dir
            .iter()
            .zip(target.iter())
            .take_while(|(a, b)| a == b)
            .count()
            // The last target segment is a file, never a shared directory.
            .min(target.len().saturating_sub(1));

        let ups = from_dir.len() - common;
        let mut specifier = if ups == 0 {
            "./".to_string()
        } else {
            "../".repeat(ups)
        };
        specifier.push_str(&target[common..].join("/"));
        specifier
    }
}

impl ImportGenerator for CommonJsImports {
    fn import(&self, binding: &str, from: &ModulePath, target: &ModulePath) -> JsStmt {
        JsStmt::Var {
            kind: VarKind::Var,
            name: binding.to_string(),
            init: JsExpr::call(
                JsExpr::ident("require"),
                vec![JsExpr::string(Self::specifier(from, target))],
            ),
        }
    }
}

/// `...; module.exports = { exports };`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonJsModuleWrapper;

impl ModuleWrapper for CommonJsModuleWrapper {
    fn wrap(&self, _module: &ModulePath, mut body: Vec<JsStmt>, exports: Vec<JsProperty>) -> Vec<JsStmt> {
        body.push(JsStmt::Expr(JsExpr::Assign {
            target: "module.exports".to_string(),
            value: Box::new(JsExpr::Object(exports)),
        }));
        body
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// No wrapping
// ══════════════════════════════════════════════════════════════════════════════

/// Emits the body as-is; exports are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWrapper;

impl ModuleWrapper for NoWrapper {
    fn wrap(&self, _module: &ModulePath, body: Vec<JsStmt>, _exports: Vec<JsProperty>) -> Vec<JsStmt> {
        body
    }
}
