//! Module code generator.
//!
//! Orchestrates the generation of one module:
//! 1. Render each import through the [`ImportGenerator`]
//! 2. Lower each top-level declaration (see [`stmt`](crate::stmt) and
//!    [`expr`](crate::expr))
//! 3. Collect the module's exports in declaration order
//! 4. Hand the body and exports to the [`ModuleWrapper`]
//! 5. At [`OptimisationLevel::Simple`], fold constants and drop dead code

use shed_types::ast::{ModulePath, Node, NodeId, SyntaxTree};
use shed_types::ResolutionTable;

use crate::error::{CodegenError, CodegenResult};
use crate::js::{JsExpr, JsProgram, JsProperty};
use crate::level::OptimisationLevel;
use crate::names::js_name;
use crate::optimise;
use crate::strategy::{ImportGenerator, ModuleWrapper};

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Generates JavaScript target trees for checked Shed modules.
///
/// Holds only its strategies and level, so one generator serves any number
/// of modules and threads.
pub struct CodeGenerator<'s> {
    imports: &'s dyn ImportGenerator,
    wrapper: &'s dyn ModuleWrapper,
    level: OptimisationLevel,
}

impl<'s> CodeGenerator<'s> {
    pub fn new(
        imports: &'s dyn ImportGenerator,
        wrapper: &'s dyn ModuleWrapper,
        level: OptimisationLevel,
    ) -> Self {
        Self {
            imports,
            wrapper,
            level,
        }
    }

    pub fn level(&self) -> OptimisationLevel {
        self.level
    }

    /// Generate the target tree for `module`.
    ///
    /// `tree` must have parsed and type checked without errors, and
    /// `resolutions` must be the checker's resolution table for it.
    pub fn generate(
        &self,
        module: &ModulePath,
        tree: &SyntaxTree,
        resolutions: &ResolutionTable,
    ) -> CodegenResult<JsProgram> {
        let lowering = Lowering { tree, resolutions };

        let mut body = Vec::new();
        for (_, import) in tree.imports() {
            let binding = js_name(import.binding_name());
            body.push(self.imports.import(&binding, module, &import.path));
        }

        let mut exports = Vec::new();
        for &decl in &tree.source_file().declarations {
            body.push(lowering.declaration(decl)?);
            exports.push(lowering.export(decl)?);
        }

        let mut program = JsProgram {
            body: self.wrapper.wrap(module, body, exports),
        };
        if self.level == OptimisationLevel::Simple {
            optimise::simplify(&mut program);
        }

        tracing::trace!(
            module = %module,
            statements = program.body.len(),
            level = %self.level,
            "generated module"
        );
        Ok(program)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Lowering context
// ══════════════════════════════════════════════════════════════════════════════

/// Read-only state shared by every lowering function for one module.
pub(crate) struct Lowering<'a> {
    pub(crate) tree: &'a SyntaxTree,
    pub(crate) resolutions: &'a ResolutionTable,
}

impl<'a> Lowering<'a> {
    pub(crate) fn node(&self, id: NodeId) -> &'a Node {
        self.tree.node(id)
    }

    /// The export entry of a top-level declaration. Mutable bindings are
    /// exported through a getter so importers see later assignments.
    pub(crate) fn export(&self, decl: NodeId) -> CodegenResult<JsProperty> {
        let (name, mutable) = match self.node(decl) {
            Node::Let(d) => (&d.name, d.mutable),
            Node::Fun(d) => (&d.name, false),
            Node::Class(d) => (&d.name, false),
            _ => {
                return Err(CodegenError::UnexpectedNode {
                    expected: "declaration",
                    node: decl,
                })
            }
        };
        Ok(property(name, mutable))
    }
}

/// `name: name`, or a getter for a mutable binding.
pub(crate) fn property(name: &str, mutable: bool) -> JsProperty {
    let value = JsExpr::ident(js_name(name));
    if mutable {
        JsProperty::Getter {
            key: name.to_string(),
            value,
        }
    } else {
        JsProperty::Value {
            key: name.to_string(),
            value,
        }
    }
}
