//! Tests for artifact materialization.

use super::*;
use rstest::rstest;
use std::io::Write;
use std::path::PathBuf;

struct PackFixture {
    _guard: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl PackFixture {
    fn new() -> Self {
        let guard = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(guard.path().to_path_buf()).expect("utf-8 temp path");
        Self {
            _guard: guard,
            root,
        }
    }

    fn pack_dir(&self) -> Utf8PathBuf {
        self.root.join("pack")
    }

    fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

/// Build a zip at `path` containing the given `(entry_name, contents)`
/// pairs. Entries ending in `/` become directory entries.
fn build_zip(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).expect("add dir");
        } else {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(contents).expect("write entry");
        }
    }
    writer.finish().expect("finish zip");
}

/// Build a tar stream of the given entries through `make_writer`'s
/// compressor, finishing both layers explicitly.
fn build_tar_entries<W: Write>(encoder: W, entries: &[(&str, &[u8])]) -> W {
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, *name, *contents)
            .expect("append entry");
    }
    builder.into_inner().expect("finish tar")
}

fn build_tar_gz(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create tar.gz");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let encoder = build_tar_entries(encoder, entries);
    encoder.finish().expect("gzip finish");
}

fn build_tar_xz(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create tar.xz");
    let encoder = xz2::write::XzEncoder::new(file, 6);
    let encoder = build_tar_entries(encoder, entries);
    encoder.finish().expect("xz finish");
}

fn build_tar_zst(path: &Utf8Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).expect("create tar.zst");
    let encoder = zstd::Encoder::new(file, 0).expect("zstd encoder");
    let encoder = build_tar_entries(encoder, entries);
    encoder.finish().expect("zstd finish");
}

fn spec_with<'a>(pack_dir: &'a Utf8Path, subdir: Option<&'a str>) -> MaterializeSpec<'a> {
    MaterializeSpec {
        pack_dir,
        subdir,
        rename_to: None,
        copy_to: None,
    }
}

#[rstest]
#[case::zip("zip", ArchiveKind::Zip)]
#[case::tar_gz("tar.gz", ArchiveKind::TarGz)]
#[case::tar_xz("tar.xz", ArchiveKind::TarXz)]
#[case::tar_zst("tar.zst", ArchiveKind::TarZst)]
#[case::exe("exe", ArchiveKind::Raw)]
#[case::appimage("AppImage", ArchiveKind::Raw)]
fn declared_types_map_to_kinds(#[case] declared: &str, #[case] expected: ArchiveKind) {
    assert_eq!(ArchiveKind::from_declared(declared), expected);
}

#[test]
fn zip_subdir_is_stripped_and_root_entry_skipped() {
    let fx = PackFixture::new();
    let archive = fx.path("asset.zip");
    build_zip(
        &archive,
        &[
            ("pkg/", b""),
            ("pkg/a.txt", b"alpha"),
            ("pkg/sub/", b""),
            ("pkg/sub/b.txt", b"beta"),
        ],
    );

    let pack = fx.pack_dir();
    materialize(&archive, ArchiveKind::Zip, &spec_with(&pack, Some("pkg"))).expect("extract");

    assert_eq!(std::fs::read(pack.join("a.txt")).expect("a.txt"), b"alpha");
    assert_eq!(
        std::fs::read(pack.join("sub/b.txt")).expect("sub/b.txt"),
        b"beta"
    );
    assert!(!pack.join("pkg").exists(), "sub-path prefix must not appear");
}

#[test]
fn zip_entries_outside_subdir_are_ignored() {
    let fx = PackFixture::new();
    let archive = fx.path("asset.zip");
    build_zip(
        &archive,
        &[
            ("pkg/a.txt", b"alpha"),
            ("pkgx/decoy.txt", b"decoy"),
            ("other/c.txt", b"gamma"),
        ],
    );

    let pack = fx.pack_dir();
    materialize(&archive, ArchiveKind::Zip, &spec_with(&pack, Some("pkg"))).expect("extract");

    assert!(pack.join("a.txt").exists());
    assert!(!pack.join("decoy.txt").exists(), "pkgx is not pkg/");
    assert!(!pack.join("c.txt").exists());
    assert!(!pack.join("other").exists());
}

#[test]
fn zip_without_subdir_extracts_everything_as_is() {
    let fx = PackFixture::new();
    let archive = fx.path("asset.zip");
    build_zip(&archive, &[("pkg/a.txt", b"alpha"), ("top.txt", b"top")]);

    let pack = fx.pack_dir();
    materialize(&archive, ArchiveKind::Zip, &spec_with(&pack, None)).expect("extract");

    assert!(pack.join("pkg/a.txt").exists());
    assert!(pack.join("top.txt").exists());
}

#[test]
fn rename_applies_only_to_the_subdir_top_level_file() {
    let fx = PackFixture::new();
    let archive = fx.path("asset.zip");
    build_zip(
        &archive,
        &[("pkg/app.exe", b"binary"), ("pkg/sub/lib.dll", b"library")],
    );

    let pack = fx.pack_dir();
    let spec = MaterializeSpec {
        pack_dir: &pack,
        subdir: Some("pkg"),
        rename_to: Some("renamed.exe"),
        copy_to: None,
    };
    materialize(&archive, ArchiveKind::Zip, &spec).expect("extract");

    assert_eq!(
        std::fs::read(pack.join("renamed.exe")).expect("renamed"),
        b"binary"
    );
    assert!(!pack.join("app.exe").exists(), "original name must be gone");
    assert!(
        pack.join("sub/lib.dll").exists(),
        "nested files keep their names"
    );
}

#[test]
fn rename_is_inert_without_a_subdir() {
    let fx = PackFixture::new();
    let archive = fx.path("asset.zip");
    build_zip(&archive, &[("app.exe", b"binary")]);

    let pack = fx.pack_dir();
    let spec = MaterializeSpec {
        pack_dir: &pack,
        subdir: None,
        rename_to: Some("renamed.exe"),
        copy_to: None,
    };
    materialize(&archive, ArchiveKind::Zip, &spec).expect("extract");

    assert!(pack.join("app.exe").exists());
    assert!(!pack.join("renamed.exe").exists());
}

#[rstest]
#[case::gz(build_tar_gz as fn(&Utf8Path, &[(&str, &[u8])]), ArchiveKind::TarGz)]
#[case::xz(build_tar_xz as fn(&Utf8Path, &[(&str, &[u8])]), ArchiveKind::TarXz)]
#[case::zst(build_tar_zst as fn(&Utf8Path, &[(&str, &[u8])]), ArchiveKind::TarZst)]
fn tar_variants_strip_subdir_like_zip(
    #[case] build: fn(&Utf8Path, &[(&str, &[u8])]),
    #[case] kind: ArchiveKind,
) {
    let fx = PackFixture::new();
    let archive = fx.path("asset.tar");
    build(
        &archive,
        &[("pkg/a.txt", b"alpha"), ("pkg/sub/b.txt", b"beta")],
    );

    let pack = fx.pack_dir();
    materialize(&archive, kind, &spec_with(&pack, Some("pkg"))).expect("extract");

    assert_eq!(std::fs::read(pack.join("a.txt")).expect("a.txt"), b"alpha");
    assert_eq!(
        std::fs::read(pack.join("sub/b.txt")).expect("b.txt"),
        b"beta"
    );
    assert!(!pack.join("pkg").exists());
}

#[test]
fn tar_rename_matches_zip_semantics() {
    let fx = PackFixture::new();
    let archive = fx.path("asset.tar.gz");
    build_tar_gz(
        &archive,
        &[("pkg/app", b"binary"), ("pkg/docs/readme", b"docs")],
    );

    let pack = fx.pack_dir();
    let spec = MaterializeSpec {
        pack_dir: &pack,
        subdir: Some("pkg"),
        rename_to: Some("tool"),
        copy_to: None,
    };
    materialize(&archive, ArchiveKind::TarGz, &spec).expect("extract");

    assert_eq!(std::fs::read(pack.join("tool")).expect("tool"), b"binary");
    assert!(!pack.join("app").exists());
    assert!(pack.join("docs/readme").exists());
}

#[test]
fn raw_assets_are_copied_byte_identical() {
    let fx = PackFixture::new();
    let artifact = fx.path("tool.AppImage");
    std::fs::write(&artifact, b"\x7fELF raw bytes").expect("write artifact");

    let pack = fx.pack_dir();
    materialize(&artifact, ArchiveKind::Raw, &spec_with(&pack, None)).expect("copy");

    assert_eq!(
        std::fs::read(pack.join("tool.AppImage")).expect("copied"),
        b"\x7fELF raw bytes"
    );
}

#[test]
fn raw_copy_honours_rename_and_copy_destination() {
    let fx = PackFixture::new();
    let artifact = fx.path("tool.bin");
    std::fs::write(&artifact, b"raw").expect("write artifact");

    let pack = fx.pack_dir();
    let copy_to = fx.path("pack/bin");
    let spec = MaterializeSpec {
        pack_dir: &pack,
        subdir: None,
        rename_to: Some("tool-latest.bin"),
        copy_to: Some(&copy_to),
    };
    materialize(&artifact, ArchiveKind::Raw, &spec).expect("copy");

    assert_eq!(
        std::fs::read(copy_to.join("tool-latest.bin")).expect("copied"),
        b"raw"
    );
    assert!(!pack.join("tool.bin").exists());
}

#[test]
fn corrupt_zip_is_reported_with_the_file_name() {
    let fx = PackFixture::new();
    let artifact = fx.path("broken.zip");
    std::fs::write(&artifact, b"this is not a zip archive").expect("write artifact");

    let pack = fx.pack_dir();
    let err = materialize(&artifact, ArchiveKind::Zip, &spec_with(&pack, None))
        .expect_err("expected invalid archive");
    assert!(matches!(err, ArchiveError::Invalid { .. }));
    assert!(err.to_string().contains("broken.zip"));
}

#[test]
fn corrupt_tar_gz_is_reported_per_entry() {
    let fx = PackFixture::new();
    let artifact = fx.path("broken.tar.gz");
    std::fs::write(&artifact, b"not gzip data at all").expect("write artifact");

    let pack = fx.pack_dir();
    let result = materialize(&artifact, ArchiveKind::TarGz, &spec_with(&pack, None));
    assert!(result.is_err());
}

#[rstest]
#[case::parent_dir("../escape.txt")]
#[case::nested_parent("foo/../../escape.txt")]
#[case::absolute("/etc/passwd")]
fn entry_paths_escaping_the_destination_are_rejected(#[case] bad_path: &str) {
    let result = validate_entry_path(&PathBuf::from(bad_path));
    assert!(
        matches!(result, Err(ArchiveError::PathTraversal { .. })),
        "expected PathTraversal for {bad_path}"
    );
}

#[test]
fn normal_entry_paths_are_accepted() {
    assert!(validate_entry_path(&PathBuf::from("bin/tool")).is_ok());
}

#[rstest]
#[case::no_subdir("pkg/a.txt", None, Some("pkg/a.txt"))]
#[case::under_subdir("pkg/a.txt", Some("pkg"), Some("a.txt"))]
#[case::nested("pkg/sub/b.txt", Some("pkg"), Some("sub/b.txt"))]
#[case::subdir_root_dir("pkg/", Some("pkg"), None)]
#[case::subdir_bare("pkg", Some("pkg"), None)]
#[case::sibling_prefix("pkgx/a.txt", Some("pkg"), None)]
#[case::outside("other/c.txt", Some("pkg"), None)]
fn entry_destination_follows_strip_rules(
    #[case] entry: &str,
    #[case] subdir: Option<&str>,
    #[case] expected: Option<&str>,
) {
    assert_eq!(
        entry_destination(entry, subdir),
        expected.map(str::to_owned)
    );
}
