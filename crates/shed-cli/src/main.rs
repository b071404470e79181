//! Shed compiler CLI

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use shed_compiler::{
    BuiltinProfile, BundledFileSource, CompilerOptions, DirectoryFileSource, InlineFileSource,
    LayeredFileSource, ModuleCompilation, OptimisationLevel, ShedCompiler, Target,
};
use shed_types::ast::ModulePath;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shed")]
#[command(author, version, about = "Shed to JavaScript compiler", long_about = None)]
struct Cli {
    /// Source file to compile; its directory is searched for imports
    #[arg(conflicts_with = "module", required_unless_present = "module")]
    file: Option<PathBuf>,

    /// Entry module to compile instead of a file, e.g. `app.main`
    #[arg(short, long)]
    module: Option<String>,

    /// Directory to resolve modules from (repeatable, searched in order)
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,

    /// NONE or SIMPLE
    #[arg(short = 'O', long, default_value = "NONE")]
    optimisation_level: OptimisationLevel,

    /// default or browser
    #[arg(short, long, default_value = "default")]
    profile: BuiltinProfile,

    /// browser, common-js or script
    #[arg(short, long, default_value = "browser")]
    target: Target,

    /// What to write
    #[arg(short, long, value_enum, default_value = "js")]
    emit: Emit,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    /// Generated JavaScript
    Js,
    /// The full compilation result as JSON
    Json,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let compiler = ShedCompiler::new(CompilerOptions {
        profile: cli.profile,
        optimisation_level: cli.optimisation_level,
        target: cli.target,
    });
    tracing::debug!(
        profile = %cli.profile,
        level = %cli.optimisation_level,
        target = %cli.target,
        "compiler configured"
    );

    let result = match (&cli.file, &cli.module) {
        (Some(file), _) => compile_file(&compiler, file, &cli.roots)?,
        (None, Some(module)) => compile_entry(&compiler, module, &cli.roots)?,
        (None, None) => bail!("either a source file or --module is required"),
    };

    for error in &result.errors {
        eprintln!("{error}");
    }

    let rendered = match cli.emit {
        Emit::Js => result.javascript.clone(),
        Emit::Json => Some(
            serde_json::to_string_pretty(&result).context("Failed to serialise result")? + "\n",
        ),
    };
    if let Some(text) = rendered {
        match &cli.output {
            Some(path) => fs::write(path, text)
                .with_context(|| format!("Failed to write output: {}", path.display()))?,
            None => print!("{text}"),
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Layered roots, then the bundled library.
fn layered(roots: &[PathBuf]) -> LayeredFileSource {
    let mut source = LayeredFileSource::new();
    for root in roots {
        source = source.with(DirectoryFileSource::new(root));
    }
    source.with(BundledFileSource)
}

fn compile_file(compiler: &ShedCompiler, file: &Path, roots: &[PathBuf]) -> Result<ModuleCompilation> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Not a module file name: {}", file.display()))?;
    let entry = ModulePath::parse(name);

    let mut search = Vec::with_capacity(roots.len() + 1);
    search.push(
        file.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    );
    search.extend_from_slice(roots);

    let source = LayeredFileSource::new()
        .with(InlineFileSource::new(entry.clone(), text))
        .with(layered(&search));
    compiler
        .compile_module(&source, &entry)
        .with_context(|| format!("Failed to compile {}", file.display()))
}

fn compile_entry(compiler: &ShedCompiler, module: &str, roots: &[PathBuf]) -> Result<ModuleCompilation> {
    let entry = ModulePath::parse(module);
    compiler
        .compile_module(&layered(roots), &entry)
        .with_context(|| format!("Failed to compile module {module}"))
}
