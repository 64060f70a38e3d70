//! StableHLO export bundle persistence for MIND.
//!
//! The tracing/lowering step (external to this crate) produces a set of
//! named lowered functions plus the constant weights they reference. This
//! crate persists that set to a directory and reloads an equal bundle.
pub mod bundle;
pub mod inspect;
pub mod pack;
pub mod types;

pub use bundle::{load_bundle, save_bundle, BundleError, ExportBundle, LoweredFunc, Program};
pub use types::{DType, Tensor};
