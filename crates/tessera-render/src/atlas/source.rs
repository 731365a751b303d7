//! Image sources feeding the atlas builder.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::config::AtlasConfig;
use crate::error::AtlasError;

/// An indexed collection of named images.
///
/// Names become the atlas lookup keys. Decoding is deferred to
/// [`decode`](ImageSource::decode) so a failing image can be skipped without
/// aborting the whole build.
pub trait ImageSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookup key of image `index`.
    fn name(&self, index: usize) -> &str;

    /// Decode image `index` to RGBA8.
    fn decode(&self, index: usize) -> Result<RgbaImage, AtlasError>;
}

/// Image files found below a directory.
///
/// The tree is walked recursively and the files are sorted by path, so layer
/// assignment is deterministic across runs and platforms.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    files: Vec<(String, PathBuf)>,
}

impl DirectorySource {
    /// Scan `root` for files with one of the configured extensions.
    ///
    /// Fails only if a directory cannot be listed.
    pub fn scan(root: impl AsRef<Path>, config: &AtlasConfig) -> Result<Self, AtlasError> {
        let root = root.as_ref().to_path_buf();
        let mut paths = Vec::new();
        collect_files(&root, config, &mut paths)?;
        paths.sort();

        let files = paths
            .into_iter()
            .filter_map(|path| match config.keys.key_for(&path) {
                Some(key) => Some((key, path)),
                None => {
                    tracing::warn!("Skipping '{}': no usable file name", path.display());
                    None
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Found {} image file(s) below '{}'",
            files.len(),
            root.display()
        );

        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of image `index`.
    pub fn path(&self, index: usize) -> &Path {
        &self.files[index].1
    }
}

fn collect_files(dir: &Path, config: &AtlasConfig, out: &mut Vec<PathBuf>) -> Result<(), AtlasError> {
    let entries = std::fs::read_dir(dir).map_err(|source| AtlasError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| AtlasError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            collect_files(&path, config, out)?;
        } else if config.matches_extension(&path) {
            out.push(path);
        }
    }

    Ok(())
}

impl ImageSource for DirectorySource {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn name(&self, index: usize) -> &str {
        &self.files[index].0
    }

    fn decode(&self, index: usize) -> Result<RgbaImage, AtlasError> {
        let (name, path) = &self.files[index];
        let image = image::open(path).map_err(|err| AtlasError::Decode {
            name: name.clone(),
            message: err.to_string(),
        })?;
        Ok(image.into_rgba8())
    }
}

/// Images held in memory, for tests and procedurally generated sprites.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    images: Vec<(String, MemoryImage)>,
}

#[derive(Debug, Clone)]
enum MemoryImage {
    Decoded(RgbaImage),
    Encoded(Vec<u8>),
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an already decoded image.
    pub fn push(&mut self, name: impl Into<String>, image: RgbaImage) {
        self.images.push((name.into(), MemoryImage::Decoded(image)));
    }

    /// Add encoded image bytes (any format the `image` crate is built with).
    pub fn push_encoded(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.images.push((name.into(), MemoryImage::Encoded(bytes)));
    }

    pub fn with_image(mut self, name: impl Into<String>, image: RgbaImage) -> Self {
        self.push(name, image);
        self
    }

    /// Add a `width` x `height` image filled with `rgba`.
    pub fn with_solid(self, name: impl Into<String>, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        self.with_image(name, RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }
}

impl ImageSource for MemorySource {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn name(&self, index: usize) -> &str {
        &self.images[index].0
    }

    fn decode(&self, index: usize) -> Result<RgbaImage, AtlasError> {
        let (name, image) = &self.images[index];
        match image {
            MemoryImage::Decoded(image) => Ok(image.clone()),
            MemoryImage::Encoded(bytes) => image::load_from_memory(bytes)
                .map(|image| image.into_rgba8())
                .map_err(|err| AtlasError::Decode {
                    name: name.clone(),
                    message: err.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new()
            .with_solid("a.png", 2, 2, [255, 0, 0, 255])
            .with_solid("b.png", 2, 2, [0, 0, 0, 0]);

        assert_eq!(source.len(), 2);
        assert_eq!(source.name(1), "b.png");
        let image = source.decode(0).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_memory_source_bad_bytes() {
        let mut source = MemorySource::new();
        source.push_encoded("broken.png", vec![1, 2, 3]);

        match source.decode(0) {
            Err(AtlasError::Decode { name, .. }) => assert_eq!(name, "broken.png"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_missing_root() {
        let result = DirectorySource::scan("/definitely/not/here", &AtlasConfig::default());
        assert!(matches!(result, Err(AtlasError::Io { .. })));
    }
}
