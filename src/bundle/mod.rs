//! Export bundles: named lowered functions plus their constant weights.

mod codec;
pub mod manifest;
mod varint;
pub mod weights;

pub use codec::{load_bundle, save_bundle};
pub use manifest::BundleManifest;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::Tensor;

/// Errors produced by the bundle codec.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The bundle violates a codec precondition (duplicate names, empty
    /// bundle, unusable function name).
    #[error("invalid bundle: {0}")]
    Validation(String),
    /// A required on-disk artifact is missing.
    #[error("missing bundle artifact: {}", path.display())]
    NotFound { path: PathBuf },
    /// An on-disk artifact exists but cannot be parsed, or fails its
    /// checksum.
    #[error("corrupt bundle artifact {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// An opaque lowered program artifact. The codec preserves it
/// byte-for-byte and never inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    Text(String),
    Binary(Vec<u8>),
}

impl Program {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Program::Text(s) => Some(s),
            Program::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Program::Text(s) => s.as_bytes(),
            Program::Binary(b) => b,
        }
    }
}

/// One lowered function: its program artifact and the constant weights it
/// references. Weight equality is order-insensitive over weight names.
#[derive(Debug, Clone, Eq)]
pub struct LoweredFunc {
    pub name: String,
    pub program: Program,
    pub weights: Vec<Tensor>,
}

impl LoweredFunc {
    pub fn new(name: impl Into<String>, program: Program, weights: Vec<Tensor>) -> Self {
        Self { name: name.into(), program, weights }
    }

    pub fn weight(&self, name: &str) -> Option<&Tensor> {
        self.weights.iter().find(|w| w.name == name)
    }

    fn weight_map(&self) -> BTreeMap<&str, &Tensor> {
        self.weights.iter().map(|w| (w.name.as_str(), w)).collect()
    }
}

impl PartialEq for LoweredFunc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.program == other.program
            && self.weight_map() == other.weight_map()
    }
}

/// An ordered collection of uniquely named lowered functions, as produced
/// by one export operation. Equality is order-insensitive over the set of
/// (name, function) pairs.
#[derive(Debug, Clone, Default, Eq)]
pub struct ExportBundle {
    pub funcs: Vec<LoweredFunc>,
}

impl ExportBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, func: LoweredFunc) {
        self.funcs.push(func);
    }

    pub fn get(&self, name: &str) -> Option<&LoweredFunc> {
        self.funcs.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    fn func_map(&self) -> BTreeMap<&str, &LoweredFunc> {
        self.funcs.iter().map(|f| (f.name.as_str(), f)).collect()
    }
}

impl PartialEq for ExportBundle {
    fn eq(&self, other: &Self) -> bool {
        self.func_map() == other.func_map()
    }
}
