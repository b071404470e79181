//! File sources: where module text comes from.
//!
//! A [`FileSource`] maps a dotted module path to source text. Sources are
//! read-only and `Send + Sync`, so one source may serve any number of
//! concurrent compiles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shed_types::ast::ModulePath;
use thiserror::Error;

/// A failure to read a module that does exist.
#[derive(Debug, Error)]
pub enum FileSourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves module paths to source text.
pub trait FileSource: Send + Sync {
    /// The text of `module`, or `None` if this source does not have it.
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError>;
}

impl<S: FileSource + ?Sized> FileSource for &S {
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError> {
        (**self).read(module)
    }
}

impl<S: FileSource + ?Sized> FileSource for Box<S> {
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError> {
        (**self).read(module)
    }
}

impl<S: FileSource + ?Sized> FileSource for Arc<S> {
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError> {
        (**self).read(module)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Bundled
// ══════════════════════════════════════════════════════════════════════════════

/// The standard library, compiled into the binary.
const BUNDLED: &[(&str, &str)] = &[
    (
        "shed.core.numbers",
        include_str!("../stdlib/shed/core/numbers.shed"),
    ),
    (
        "shed.core.strings",
        include_str!("../stdlib/shed/core/strings.shed"),
    ),
];

/// The read-only standard library that ships with the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledFileSource;

impl BundledFileSource {
    /// Every bundled module name, in a fixed order.
    pub fn modules() -> impl Iterator<Item = ModulePath> {
        BUNDLED.iter().map(|(name, _)| ModulePath::parse(name))
    }
}

impl FileSource for BundledFileSource {
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError> {
        let name = module.to_string();
        Ok(BUNDLED
            .iter()
            .find(|(bundled, _)| *bundled == name)
            .map(|(_, text)| text.to_string()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Inline
// ══════════════════════════════════════════════════════════════════════════════

/// One synthetic module name bound to caller-supplied text.
#[derive(Debug, Clone)]
pub struct InlineFileSource {
    name: ModulePath,
    text: String,
}

impl InlineFileSource {
    pub fn new(name: ModulePath, text: impl Into<String>) -> Self {
        Self {
            name,
            text: text.into(),
        }
    }

    pub fn name(&self) -> &ModulePath {
        &self.name
    }
}

impl FileSource for InlineFileSource {
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError> {
        Ok((*module == self.name).then(|| self.text.clone()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Directory
// ══════════════════════════════════════════════════════════════════════════════

/// Modules on disk: `a.b.c` is `<root>/a/b/c.shed`.
#[derive(Debug, Clone)]
pub struct DirectoryFileSource {
    root: PathBuf,
}

impl DirectoryFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSource for DirectoryFileSource {
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError> {
        // Segments are identifiers when they come from source; anything else
        // could name a path outside the root.
        let valid = module.segments().iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Ok(None);
        }

        let path = self.root.join(module.file_path());
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileSourceError::Io { path, source }),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Layered
// ══════════════════════════════════════════════════════════════════════════════

/// An ordered list of sources; the first one that has a module wins.
#[derive(Default)]
pub struct LayeredFileSource {
    layers: Vec<Box<dyn FileSource>>,
}

impl LayeredFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below the existing ones.
    pub fn with(mut self, layer: impl FileSource + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn push(&mut self, layer: Box<dyn FileSource>) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl FileSource for LayeredFileSource {
    fn read(&self, module: &ModulePath) -> Result<Option<String>, FileSourceError> {
        for layer in &self.layers {
            if let Some(text) = layer.read(module)? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}
