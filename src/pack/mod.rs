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

//! Packed single-file form of a saved bundle.
//!
//! A bundle directory written by `save_bundle` can be shipped as one
//! `.tar.gz`. Packing is deterministic (entries in sorted path order) and
//! unpacking restores a directory `load_bundle` accepts unchanged.

use std::fs;
use std::fs::File;
use std::io::Cursor;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use tar::Archive;
use tar::Builder;
use tar::Header;

/// Archive a saved bundle directory into `out_path` as a gzipped tar.
pub fn pack_bundle(bundle_dir: impl AsRef<Path>, out_path: impl AsRef<Path>) -> Result<()> {
    let bundle_dir = bundle_dir.as_ref();
    let out_path = out_path.as_ref();

    if !bundle_dir.join("bundle.toml").is_file() {
        return Err(anyhow!(
            "{} is not a saved bundle (no bundle.toml)",
            bundle_dir.display()
        ));
    }

    let mut files = Vec::new();
    collect_files(bundle_dir, Path::new(""), &mut files)
        .with_context(|| format!("unable to walk {}", bundle_dir.display()))?;
    files.sort();

    let out_file = File::create(out_path)
        .with_context(|| format!("unable to create {}", out_path.display()))?;
    let encoder = GzEncoder::new(out_file, Compression::default());
    let mut builder = Builder::new(encoder);

    for rel in &files {
        let data = fs::read(bundle_dir.join(rel))
            .with_context(|| format!("failed to read artifact {}", rel.display()))?;
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, rel, Cursor::new(data))?;
    }

    builder.finish()?;
    let mut encoder = builder.into_inner()?;
    encoder.try_finish()?;
    Ok(())
}

/// Restore a packed bundle into `target_dir`, creating it if absent.
///
/// Rejects archives containing path-traversal entries.
pub fn unpack_bundle(archive_path: impl AsRef<Path>, target_dir: impl AsRef<Path>) -> Result<()> {
    let archive_path = archive_path.as_ref();
    let target_root = target_dir.as_ref();
    fs::create_dir_all(target_root)?;

    let file = File::open(archive_path)
        .with_context(|| format!("unable to open archive {}", archive_path.display()))?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        if entry_path.is_absolute()
            || entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(anyhow!("archive contains invalid path traversal entries"));
        }
        // Packed bundles hold only regular files; link entries could
        // redirect a later write outside the target directory.
        let kind = entry.header().entry_type();
        if !kind.is_file() && !kind.is_dir() {
            return Err(anyhow!(
                "archive contains unsupported entry type {:?} at {}",
                kind,
                entry_path.display()
            ));
        }

        let dest = target_root.join(&entry_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(dest)?;
    }

    Ok(())
}

fn collect_files(root: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for dirent in fs::read_dir(root.join(rel))? {
        let dirent = dirent?;
        let child = rel.join(dirent.file_name());
        if dirent.file_type()?.is_dir() {
            collect_files(root, &child, out)?;
        } else {
            out.push(child);
        }
    }
    Ok(())
}
