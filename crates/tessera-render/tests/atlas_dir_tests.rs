//! Loading atlases from image directories on disk.

use std::path::Path;

use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use tessera_render::{
    AtlasBuilder, AtlasConfig, AtlasError, DirectorySource, ImageSource, InitError,
    MipmapPolicy, RendererConfig, SpriteContext, TextureKey,
};
use tessera_test_utils::MockSpriteBackend;

fn write_png(dir: &Path, relative: &str, size: u32, alpha: u8) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, alpha]))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
}

fn sprite_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_png(dir.path(), "tree.png", 8, 255);
    write_png(dir.path(), "terrain/grass.png", 8, 255);
    write_png(dir.path(), "terrain/deep/water.png", 8, 100);
    write_png(dir.path(), "ROCK.PNG", 8, 255);
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
    dir
}

#[test]
fn test_scan_recurses_and_sorts() {
    let dir = sprite_dir();
    let source = DirectorySource::scan(dir.path(), &AtlasConfig::default()).unwrap();

    let names = (0..source.len())
        .map(|i| source.name(i).to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["ROCK.PNG", "water.png", "grass.png", "tree.png"]);
    assert_eq!(source.root(), dir.path());
}

#[test]
fn test_scan_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = DirectorySource::scan(&missing, &AtlasConfig::default()).unwrap_err();
    match err {
        AtlasError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_stem_keys() {
    let dir = sprite_dir();
    let config = AtlasConfig::default().with_keys(TextureKey::Stem);
    let source = DirectorySource::scan(dir.path(), &config).unwrap();
    let atlas = AtlasBuilder::new(config).build(&source).unwrap();

    assert!(atlas.contains("tree"));
    assert!(atlas.contains("water"));
    assert!(!atlas.contains("tree.png"));
}

#[test]
fn test_build_classifies_directory() {
    let dir = sprite_dir();
    let source = DirectorySource::scan(dir.path(), &AtlasConfig::default()).unwrap();
    let atlas = AtlasBuilder::default().build(&source).unwrap();

    assert_eq!(atlas.len(), 4);
    assert_eq!(atlas.stats().opaque, 3);
    assert_eq!(atlas.stats().transparent, 1);
    assert!(atlas.texture_ref("water.png").unwrap().is_transparent());
    assert!(!atlas.texture_ref("grass.png").unwrap().is_transparent());
    assert_eq!(atlas.pages()[0].mip_levels(), 4);
}

#[test]
fn test_corrupt_file_is_skipped() {
    let dir = sprite_dir();
    std::fs::write(dir.path().join("broken.png"), b"definitely not a png").unwrap();

    let source = DirectorySource::scan(dir.path(), &AtlasConfig::default()).unwrap();
    assert_eq!(source.len(), 5);

    let atlas = AtlasBuilder::default().build(&source).unwrap();
    assert_eq!(atlas.len(), 4);
    assert_eq!(atlas.stats().skipped, 1);
    assert!(!atlas.contains("broken.png"));
}

#[test]
fn test_size_mismatch_fails_build() {
    let dir = sprite_dir();
    write_png(dir.path(), "zebra.png", 16, 255);

    let source = DirectorySource::scan(dir.path(), &AtlasConfig::default()).unwrap();
    let err = AtlasBuilder::default().build(&source).unwrap_err();
    match err {
        AtlasError::SizeMismatch { name, .. } => assert_eq!(name, "zebra.png"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_mipmap_floor_policy() {
    let dir = sprite_dir();
    let config = AtlasConfig::default().with_mipmaps(MipmapPolicy::Floor { min_size: 4 });
    let source = DirectorySource::scan(dir.path(), &config).unwrap();
    let atlas = AtlasBuilder::new(config).build(&source).unwrap();

    // 8 -> 4
    assert_eq!(atlas.pages()[0].mip_levels(), 2);
}

#[test]
fn test_initialize_from_directory() {
    let dir = sprite_dir();
    let backend = MockSpriteBackend::new();
    let recorder = backend.recorder();

    let ctx = SpriteContext::initialize(backend, dir.path(), RendererConfig::default()).unwrap();
    assert_eq!(ctx.atlas().len(), 4);
    assert_eq!(recorder.count_texture_array_creates(), 2);
}

#[test]
fn test_initialize_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = SpriteContext::initialize(
        MockSpriteBackend::new(),
        dir.path().join("missing"),
        RendererConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, InitError::Atlas(AtlasError::Io { .. })));
}
