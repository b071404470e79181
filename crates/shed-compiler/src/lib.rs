//! Shed compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! Shed source → Tokeniser → Parser → Type Checker → Code Generator → Writer → JavaScript
//! ```
//!
//! [`ShedCompiler`] is the entry point. It holds only configuration and
//! code generation strategies; every request builds its own meta-registry,
//! static context and module cache, so one compiler may serve any number
//! of threads.
//!
//! # Example
//!
//! ```
//! use shed_compiler::{CompilerOptions, ShedCompiler};
//!
//! let compiler = ShedCompiler::new(CompilerOptions::default());
//! let result = compiler.compile_source("let x = 1 + 2").unwrap();
//! assert!(result.success);
//! assert!(result.javascript.is_some());
//! ```

pub mod builtins;
pub mod checker;
pub mod env;
pub mod files;
pub mod modules;
pub mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shed_codegen::{
    BrowserImports, BrowserModuleWrapper, CodeGenerator, CommonJsImports, CommonJsModuleWrapper,
    ImportGenerator, ModuleWrapper, NoWrapper,
};
use shed_lexer::PositionedToken;
use shed_types::ast::ModulePath;
use shed_types::{InternalError, ReportedError};

pub use builtins::{BuiltinProfile, ParseProfileError};
pub use checker::{type_check, CheckResult, TypeTable};
pub use files::{
    BundledFileSource, DirectoryFileSource, FileSource, FileSourceError, InlineFileSource,
    LayeredFileSource,
};
pub use modules::{output_hash, CompiledModule, ModuleCompilation};
pub use shed_codegen::{OptimisationLevel, ParseLevelError};

/// The synthetic module name a submitted snippet is compiled under.
pub const SNIPPET_MODULE: &str = "snippet";

// ══════════════════════════════════════════════════════════════════════════════
// Options
// ══════════════════════════════════════════════════════════════════════════════

/// Where the generated JavaScript will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    /// `SHED.importModule` / `SHED.exportModule` registration.
    #[default]
    Browser,
    /// `require` / `module.exports`.
    CommonJs,
    /// A bare script: no module envelope.
    Script,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Target::Browser => "browser",
            Target::CommonJs => "common-js",
            Target::Script => "script",
        }
    }

    fn strategies(self) -> (Box<dyn ImportGenerator>, Box<dyn ModuleWrapper>) {
        match self {
            Target::Browser => (Box::new(BrowserImports), Box::new(BrowserModuleWrapper)),
            Target::CommonJs => (Box::new(CommonJsImports), Box::new(CommonJsModuleWrapper)),
            Target::Script => (Box::new(BrowserImports), Box::new(NoWrapper)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target '{0}' (expected browser, common-js or script)")]
pub struct ParseTargetError(pub String);

impl FromStr for Target {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(Target::Browser),
            "common-js" | "commonjs" => Ok(Target::CommonJs),
            "script" => Ok(Target::Script),
            _ => Err(ParseTargetError(s.to_string())),
        }
    }
}

/// Compiler configuration, fixed when the compiler is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilerOptions {
    pub profile: BuiltinProfile,
    pub optimisation_level: OptimisationLevel,
    pub target: Target,
}

// ══════════════════════════════════════════════════════════════════════════════
// Results
// ══════════════════════════════════════════════════════════════════════════════

/// The outcome of compiling one snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationResult {
    /// The snippet's tokens, trivia included.
    pub tokens: Vec<PositionedToken>,
    /// Diagnostics from the snippet and any module it imports.
    pub errors: Vec<ReportedError>,
    /// Present iff `success`.
    pub javascript: Option<String>,
    pub success: bool,
    pub modules: Vec<CompiledModule>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Compiler
// ══════════════════════════════════════════════════════════════════════════════

pub struct ShedCompiler {
    options: CompilerOptions,
    imports: Box<dyn ImportGenerator>,
    wrapper: Box<dyn ModuleWrapper>,
}

impl fmt::Debug for ShedCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShedCompiler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for ShedCompiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

impl ShedCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        let (imports, wrapper) = options.target.strategies();
        Self {
            options,
            imports,
            wrapper,
        }
    }

    /// The web configuration: browser builtins and browser module strategies.
    pub fn for_browser(level: OptimisationLevel) -> Self {
        Self::new(CompilerOptions {
            profile: BuiltinProfile::Browser,
            optimisation_level: level,
            target: Target::Browser,
        })
    }

    /// Replace the target's strategies with custom ones.
    pub fn with_strategies(
        mut self,
        imports: Box<dyn ImportGenerator>,
        wrapper: Box<dyn ModuleWrapper>,
    ) -> Self {
        self.imports = imports;
        self.wrapper = wrapper;
        self
    }

    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    /// Compile one snippet. The snippet may import the bundled library.
    ///
    /// Diagnostics are returned in the result; `Err` means a compiler
    /// invariant broke.
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = text.len()))]
    pub fn compile_source(&self, text: &str) -> Result<CompilationResult, InternalError> {
        let entry = ModulePath::parse(SNIPPET_MODULE);
        let source = LayeredFileSource::new()
            .with(InlineFileSource::new(entry.clone(), text))
            .with(BundledFileSource);
        let (compilation, tokens) = self.resolve(&source, entry)?;
        Ok(CompilationResult {
            tokens: tokens.unwrap_or_default(),
            errors: compilation.errors,
            javascript: compilation.javascript,
            success: compilation.success,
            modules: compilation.modules,
        })
    }

    /// Compile `entry` and every module it imports from `source`.
    #[tracing::instrument(level = "debug", skip_all, fields(entry = %entry))]
    pub fn compile_module(
        &self,
        source: &dyn FileSource,
        entry: &ModulePath,
    ) -> Result<ModuleCompilation, InternalError> {
        self.resolve(source, entry.clone())
            .map(|(compilation, _)| compilation)
    }

    fn resolve(
        &self,
        source: &dyn FileSource,
        entry: ModulePath,
    ) -> Result<(ModuleCompilation, Option<Vec<PositionedToken>>), InternalError> {
        let generator = CodeGenerator::new(
            self.imports.as_ref(),
            self.wrapper.as_ref(),
            self.options.optimisation_level,
        );
        modules::Resolver::new(source, generator, self.options.profile, entry).run()
    }
}
