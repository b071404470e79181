//! Module resolution: runs the single-file pipeline across an import graph.
//!
//! One [`Resolver`] serves one compile request. It owns the request's
//! meta-registry and module cache, so nothing it learns leaks into another
//! request. Modules are compiled depth-first and appended to the output
//! after their dependencies.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use shed_codegen::{write, CodeGenerator};
use shed_lexer::{tokenise, PositionedToken};
use shed_parser::parse;
use shed_types::ast::ModulePath;
use shed_types::{
    CompilerError, Diagnostics, ErrorLocation, InternalError, NodeLocations, ReportedError,
    SourcePosition, SourceRange,
};

use crate::builtins::BuiltinProfile;
use crate::checker::type_check;
use crate::env::StaticContext;
use crate::files::{FileSource, FileSourceError};
use crate::registry::{MetaRegistry, TypeId};

/// The generated text of one module that compiled cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledModule {
    pub name: ModulePath,
    pub javascript: String,
    /// Hex SHA-256 of `javascript`.
    pub output_hash: String,
}

/// The outcome of compiling an entry module and everything it imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCompilation {
    /// Every module's diagnostics, in the order they were found.
    pub errors: Vec<ReportedError>,
    /// Compiled modules, dependencies before dependents.
    pub modules: Vec<CompiledModule>,
    /// All module texts joined by newlines; present iff `success`.
    pub javascript: Option<String>,
    pub success: bool,
}

/// Hex SHA-256 of generated text.
pub fn output_hash(javascript: &str) -> String {
    format!("{:x}", Sha256::digest(javascript.as_bytes()))
}

// ══════════════════════════════════════════════════════════════════════════════
// Resolver
// ══════════════════════════════════════════════════════════════════════════════

/// A finished module in the per-request cache.
#[derive(Debug, Clone, Copy)]
enum Unit {
    Compiled { interface: TypeId },
    Failed,
}

/// What an import site gets back from [`Resolver::require`].
enum Required {
    Ready(TypeId),
    /// The module was found but did not compile. Its own errors are
    /// already reported.
    Failed,
    /// Importing the module would close a cycle; carries the chain.
    Cycle(String),
    Missing,
    Unreadable(FileSourceError),
}

pub(crate) struct Resolver<'a> {
    source: &'a dyn FileSource,
    generator: CodeGenerator<'a>,
    entry: ModulePath,
    registry: MetaRegistry,
    base: StaticContext,
    cache: HashMap<ModulePath, Unit>,
    in_progress: Vec<ModulePath>,
    output: Vec<CompiledModule>,
    errors: Vec<ReportedError>,
    entry_tokens: Option<Vec<PositionedToken>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        source: &'a dyn FileSource,
        generator: CodeGenerator<'a>,
        profile: BuiltinProfile,
        entry: ModulePath,
    ) -> Self {
        let mut registry = MetaRegistry::new();
        let base = profile.seed(&mut registry);
        Self {
            source,
            generator,
            entry,
            registry,
            base,
            cache: HashMap::new(),
            in_progress: Vec::new(),
            output: Vec::new(),
            errors: Vec::new(),
            entry_tokens: None,
        }
    }

    /// Compile the entry module and its imports. Consumes the resolver, so
    /// its cache dies with the request.
    pub(crate) fn run(
        mut self,
    ) -> Result<(ModuleCompilation, Option<Vec<PositionedToken>>), InternalError> {
        let entry = self.entry.clone();
        let origin = ErrorLocation::Range(SourceRange::point(SourcePosition::start()));
        let entry_error = match self.require(&entry)? {
            Required::Ready(_) | Required::Failed => None,
            Required::Missing => Some(missing_message(&entry)),
            Required::Unreadable(e) => Some(e.to_string()),
            Required::Cycle(chain) => {
                return Err(InternalError::Invariant(format!(
                    "entry module reported as its own cycle: {chain}"
                )))
            }
        };
        if let Some(message) = entry_error {
            let error = CompilerError::module_resolution(message, origin);
            self.report(&entry, Diagnostics::from_iter([error]), &NodeLocations::default())?;
        }

        let success = self.errors.is_empty();
        let javascript = success.then(|| {
            self.output
                .iter()
                .map(|m| m.javascript.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        });
        tracing::debug!(
            entry = %entry,
            modules = self.output.len(),
            errors = self.errors.len(),
            "resolved module graph"
        );
        Ok((
            ModuleCompilation {
                errors: self.errors,
                modules: self.output,
                javascript,
                success,
            },
            self.entry_tokens,
        ))
    }

    fn require(&mut self, module: &ModulePath) -> Result<Required, InternalError> {
        if let Some(unit) = self.cache.get(module) {
            tracing::debug!(module = %module, "module cache hit");
            return Ok(match *unit {
                Unit::Compiled { interface } => Required::Ready(interface),
                Unit::Failed => Required::Failed,
            });
        }

        if let Some(start) = self.in_progress.iter().position(|m| m == module) {
            let chain: Vec<String> = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(module))
                .map(ModulePath::to_string)
                .collect();
            let chain = chain.join(" -> ");
            tracing::debug!(cycle = %chain, "import cycle");
            return Ok(Required::Cycle(chain));
        }

        let text = match self.source.read(module) {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(Required::Missing),
            Err(e) => return Ok(Required::Unreadable(e)),
        };
        tracing::debug!(module = %module, bytes = text.len(), "read module");

        self.in_progress.push(module.clone());
        let unit = self.compile(module, &text);
        self.in_progress.pop();
        let unit = unit?;

        self.cache.insert(module.clone(), unit);
        Ok(match unit {
            Unit::Compiled { interface } => Required::Ready(interface),
            Unit::Failed => Required::Failed,
        })
    }

    fn compile(&mut self, module: &ModulePath, text: &str) -> Result<Unit, InternalError> {
        let lexed = tokenise(text);
        let parsed = parse(&lexed.tokens);
        tracing::debug!(
            module = %module,
            tokens = lexed.tokens.len(),
            lexical_errors = lexed.errors.len(),
            syntax_errors = parsed.errors.len(),
            "parsed module"
        );
        if *module == self.entry {
            self.entry_tokens = Some(lexed.tokens.clone());
        }

        if !lexed.errors.is_empty() || !parsed.success {
            let mut errors = lexed.errors;
            errors.extend(parsed.errors);
            self.report(module, errors, &parsed.locations)?;
            return Ok(Unit::Failed);
        }

        let tree = parsed.tree;
        let locations = parsed.locations;

        let mut imports = HashMap::new();
        let mut import_errors = Diagnostics::new();
        let mut dependency_failed = false;
        for (node, import) in tree.imports() {
            let location = ErrorLocation::Node(node);
            match self.require(&import.path)? {
                Required::Ready(interface) => {
                    imports.insert(import.path.clone(), interface);
                }
                Required::Failed => dependency_failed = true,
                Required::Cycle(chain) => {
                    dependency_failed = true;
                    import_errors.push(CompilerError::module_resolution(
                        format!("import cycle: {chain}"),
                        location,
                    ));
                }
                Required::Missing => {
                    dependency_failed = true;
                    import_errors.push(CompilerError::module_resolution(
                        missing_message(&import.path),
                        location,
                    ));
                }
                Required::Unreadable(e) => {
                    dependency_failed = true;
                    import_errors
                        .push(CompilerError::module_resolution(e.to_string(), location));
                }
            }
        }
        let import_failed = !import_errors.is_empty();
        self.report(module, import_errors, &locations)?;

        let checked = type_check(
            &tree,
            &locations,
            self.base.clone(),
            &mut self.registry,
            module,
            &imports,
        );
        let checked_ok = checked.success;
        self.report(module, checked.errors, &locations)?;

        if import_failed || dependency_failed || !checked_ok {
            return Ok(Unit::Failed);
        }

        let program = self
            .generator
            .generate(module, &tree, &checked.resolutions)
            .map_err(|e| InternalError::Invariant(e.to_string()))?;
        let javascript = write(&program, self.generator.level());
        if javascript.trim().is_empty() && !tree.source_file().declarations.is_empty() {
            return Err(InternalError::Invariant(format!(
                "module '{module}' generated no code"
            )));
        }
        let hash = output_hash(&javascript);
        tracing::debug!(module = %module, bytes = javascript.len(), hash = %hash, "generated module");

        self.output.push(CompiledModule {
            name: module.clone(),
            javascript,
            output_hash: hash,
        });
        Ok(Unit::Compiled {
            interface: checked.interface,
        })
    }

    /// Resolve `errors` against `module`'s own location table.
    fn report(
        &mut self,
        module: &ModulePath,
        errors: Diagnostics,
        locations: &NodeLocations,
    ) -> Result<(), InternalError> {
        for error in errors {
            let range = error.resolve(locations)?;
            self.errors.push(ReportedError {
                kind: error.kind,
                module: module.to_string(),
                description: error.describe(),
                range,
            });
        }
        Ok(())
    }
}

fn missing_message(module: &ModulePath) -> String {
    format!("cannot find module '{module}'")
}
