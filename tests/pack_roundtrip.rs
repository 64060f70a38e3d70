// Copyright (c) 2025 STARGA Inc. and MIND Language Contributors
// SPDX-License-Identifier: Apache-2.0
// Part of the MIND project (Machine Intelligence Native Design).

use std::fs;

use mind_export::bundle::{load_bundle, save_bundle, ExportBundle, LoweredFunc, Program};

use mind_export::pack::{pack_bundle, unpack_bundle};

use mind_export::types::Tensor;

use tempfile::tempdir;

fn two_func_bundle() -> ExportBundle {
    let mut bundle = ExportBundle::new();
    bundle.push(LoweredFunc::new(
        "forward",
        Program::Text("module @fwd { }".into()),
        vec![Tensor::from_f32("p0", vec![1, 3], &[0.1, 0.2, 0.3])],
    ));
    bundle.push(LoweredFunc::new(
        "backward",
        Program::Text("module @bwd { }".into()),
        vec![],
    ));
    bundle
}

#[test]
fn pack_unpack_preserves_bundle() {
    let src = tempdir().expect("create temp directory");
    let bundle = two_func_bundle();
    save_bundle(&bundle, src.path()).expect("save bundle");

    let archive = src.path().join("export.mwbundle.tar.gz");
    pack_bundle(src.path(), &archive).expect("pack bundle");

    let dst = tempdir().expect("create temp directory");
    unpack_bundle(&archive, dst.path()).expect("unpack bundle");

    let reloaded = load_bundle(dst.path()).expect("load unpacked bundle");
    assert_eq!(reloaded, bundle);
}

#[test]
fn pack_is_deterministic() {
    let src = tempdir().expect("create temp directory");
    save_bundle(&two_func_bundle(), src.path()).expect("save bundle");

    let a = src.path().join("a.tar.gz");
    let b = src.path().join("b.tar.gz");
    pack_bundle(src.path(), &a).expect("pack a");
    // The first archive lands inside the directory; remove it so both
    // packs see the same file set.
    let a_bytes = fs::read(&a).expect("read a");
    fs::remove_file(&a).expect("remove a");
    pack_bundle(src.path(), &b).expect("pack b");
    let b_bytes = fs::read(&b).expect("read b");

    assert_eq!(a_bytes, b_bytes);
}

#[test]
fn packing_a_non_bundle_directory_fails() {
    let dir = tempdir().expect("create temp directory");
    fs::write(dir.path().join("stray.txt"), "not a bundle").expect("write stray");
    let out = dir.path().join("out.tar.gz");
    let err = pack_bundle(dir.path(), &out).unwrap_err();
    assert!(err.to_string().contains("bundle.toml"), "got {err}");
}

#[test]
fn unpacking_archive_with_link_entry_fails() {
    let dir = tempdir().expect("create temp directory");
    let archive = dir.path().join("linked.tar.gz");

    let file = fs::File::create(&archive).expect("create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_cksum();
    builder
        .append_link(&mut header, "functions/forward/weights.mwb", "/etc/passwd")
        .expect("append link entry");
    builder
        .into_inner()
        .expect("finish archive")
        .finish()
        .expect("finish gzip");

    let err = unpack_bundle(&archive, dir.path().join("out")).unwrap_err();
    assert!(err.to_string().contains("entry type"), "got {err}");
}

#[test]
fn unpacking_garbage_fails() {
    let dir = tempdir().expect("create temp directory");
    let junk = dir.path().join("junk.tar.gz");
    fs::write(&junk, b"definitely not gzip").expect("write junk");
    assert!(unpack_bundle(&junk, dir.path().join("out")).is_err());
}
