// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Part of the MIND project (Machine Intelligence Native Design).

//! Directory codec for export bundles.
//!
//! Layout under the bundle directory:
//! ```text
//! bundle.toml                     manifest (see `manifest`)
//! functions/<name>/program.mlir   textual program artifact, or
//! functions/<name>/program.bin    binary program artifact
//! functions/<name>/weights.mwb    weights artifact (see `weights`)
//! ```
//!
//! Writes are additive: only the paths above are touched, so unrelated
//! files already present in the directory survive a save.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::Digest;
use sha2::Sha256;

use crate::types::Tensor;

use super::manifest::{BundleManifest, FuncEntry, ProgramKind, FORMAT_VERSION};
use super::weights::{decode_weights, encode_weights, validate_weights};
use super::{BundleError, ExportBundle, LoweredFunc, Program};

const MANIFEST_FILE: &str = "bundle.toml";
const FUNCTIONS_DIR: &str = "functions";
const WEIGHTS_FILE: &str = "weights.mwb";

/// Persist a bundle into `dir`, creating the directory if absent.
///
/// The result is independent of the bundle's function order: artifacts are
/// keyed by function name and the manifest is name-sorted.
pub fn save_bundle(bundle: &ExportBundle, dir: impl AsRef<Path>) -> Result<(), BundleError> {
    let dir = dir.as_ref();
    validate_bundle(bundle)?;

    fs::create_dir_all(dir)?;
    let mut manifest = BundleManifest { format_version: FORMAT_VERSION, functions: Default::default() };

    for func in &bundle.funcs {
        let func_dir = dir.join(FUNCTIONS_DIR).join(&func.name);
        fs::create_dir_all(&func_dir)?;

        let kind = match &func.program {
            Program::Text(_) => ProgramKind::Text,
            Program::Binary(_) => ProgramKind::Binary,
        };
        let program_bytes = func.program.as_bytes();
        fs::write(func_dir.join(kind.file_name()), program_bytes)?;

        let mut weight_bytes = Vec::new();
        encode_weights(&func.weights, &mut weight_bytes)
            .map_err(|e| BundleError::Validation(format!("function `{}`: {}", func.name, e.message)))?;
        fs::write(func_dir.join(WEIGHTS_FILE), &weight_bytes)?;

        manifest.functions.insert(
            func.name.clone(),
            FuncEntry {
                program: kind,
                program_sha256: sha256_hex(program_bytes),
                weights_sha256: sha256_hex(&weight_bytes),
            },
        );
    }

    let manifest_toml = manifest
        .to_toml()
        .map_err(|e| BundleError::Validation(format!("cannot serialize manifest: {e}")))?;
    fs::write(dir.join(MANIFEST_FILE), manifest_toml.as_bytes())?;
    Ok(())
}

/// Reconstruct a bundle from a directory written by [`save_bundle`] (or
/// any directory with the equivalent structure).
///
/// Functions are returned in manifest (name) order. A missing artifact is
/// [`BundleError::NotFound`]; an unparseable one, or a checksum mismatch,
/// is [`BundleError::Corrupt`]. No partial reconstruction is attempted.
pub fn load_bundle(dir: impl AsRef<Path>) -> Result<ExportBundle, BundleError> {
    let dir = dir.as_ref();

    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_bytes = read_artifact(&manifest_path)?;
    let manifest_text = String::from_utf8(manifest_bytes)
        .map_err(|_| corrupt(&manifest_path, "manifest is not valid UTF-8"))?;
    let manifest = BundleManifest::from_toml(&manifest_text)
        .map_err(|e| corrupt(&manifest_path, format!("manifest does not parse: {e}")))?;
    if manifest.format_version != FORMAT_VERSION {
        return Err(corrupt(
            &manifest_path,
            format!("unsupported format version {}", manifest.format_version),
        ));
    }

    let mut bundle = ExportBundle::new();
    for (name, entry) in &manifest.functions {
        validate_name(name)
            .map_err(|reason| corrupt(&manifest_path, format!("function `{name}`: {reason}")))?;
        let func_dir = dir.join(FUNCTIONS_DIR).join(name);

        let program_path = func_dir.join(entry.program.file_name());
        let program_bytes = read_artifact(&program_path)?;
        verify_checksum(&program_path, &program_bytes, &entry.program_sha256)?;
        let program = match entry.program {
            ProgramKind::Text => Program::Text(
                String::from_utf8(program_bytes)
                    .map_err(|_| corrupt(&program_path, "program text is not valid UTF-8"))?,
            ),
            ProgramKind::Binary => Program::Binary(program_bytes),
        };

        let weights_path = func_dir.join(WEIGHTS_FILE);
        let weight_bytes = read_artifact(&weights_path)?;
        verify_checksum(&weights_path, &weight_bytes, &entry.weights_sha256)?;
        let weights: Vec<Tensor> = decode_weights(&mut weight_bytes.as_slice())
            .map_err(|e| corrupt(&weights_path, e.message))?;

        bundle.push(LoweredFunc::new(name.clone(), program, weights));
    }

    Ok(bundle)
}

fn validate_bundle(bundle: &ExportBundle) -> Result<(), BundleError> {
    if bundle.is_empty() {
        return Err(BundleError::Validation("bundle has no functions".into()));
    }
    let mut seen = BTreeSet::new();
    for func in &bundle.funcs {
        validate_name(&func.name)
            .map_err(|reason| BundleError::Validation(format!("function `{}`: {reason}", func.name)))?;
        if !seen.insert(func.name.as_str()) {
            return Err(BundleError::Validation(format!(
                "duplicate function name `{}`",
                func.name
            )));
        }
        validate_weights(&func.weights)
            .map_err(|e| BundleError::Validation(format!("function `{}`: {}", func.name, e.message)))?;
    }
    Ok(())
}

/// Function names become single path components under `functions/`, so
/// anything that could escape or alias another entry is rejected.
fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".into());
    }
    if name == "." || name == ".." {
        return Err("name is a relative path component".into());
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c == '\0') {
        return Err("name contains a path separator or NUL".into());
    }
    Ok(())
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, BundleError> {
    match fs::read(path) {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BundleError::NotFound { path: path.to_path_buf() })
        }
        Err(e) => Err(BundleError::Io(e)),
    }
}

fn verify_checksum(path: &Path, data: &[u8], expected: &str) -> Result<(), BundleError> {
    let actual = sha256_hex(data);
    if actual != expected {
        return Err(corrupt(
            path,
            format!("checksum mismatch: manifest says {expected}, artifact hashes to {actual}"),
        ));
    }
    Ok(())
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn corrupt(path: &Path, reason: impl Into<String>) -> BundleError {
    BundleError::Corrupt { path: PathBuf::from(path), reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::validate_name;

    #[test]
    fn name_validation() {
        assert!(validate_name("forward").is_ok());
        assert!(validate_name("block_0.attn").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a\\b").is_err());
    }
}
