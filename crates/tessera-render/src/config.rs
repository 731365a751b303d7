//! Renderer and atlas configuration.
//!
//! Every option has a default matching the common case: square sprites, one
//! texture array per opacity class, split opaque/transparent passes, a full mip
//! chain, and file names as lookup keys.

use std::path::Path;

use tessera_test_utils::ClearColor;

/// Shape of the shared quad mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MeshShape {
    /// Mesh spans `[-1, 1]`; a sprite's size is its half extent and must be uniform.
    #[default]
    Square,
    /// Mesh spans `[-0.5, 0.5]`; a sprite's size is its full width and height.
    Rect,
}

/// How textures are grouped into GPU arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureMode {
    /// One layered array per opacity class; one draw per pass.
    #[default]
    Array,
    /// One single-layer array per image; one draw per run of equal textures.
    PerTexture,
}

/// How blended sprites are separated from opaque ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransparencyMode {
    /// Depth-tested opaque pass followed by a sorted blended pass.
    #[default]
    Split,
    /// Every sprite goes through the sorted blended pass.
    Unified,
}

/// Depth of the mipmap chain allocated for each texture array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipmapPolicy {
    /// Halve down to 1x1.
    #[default]
    FullChain,
    /// Halve while the larger side stays at or above `min_size`.
    Floor { min_size: u32 },
}

/// Lookup key derived from an image path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKey {
    /// `"tree.png"`.
    #[default]
    FileName,
    /// `"tree"`.
    Stem,
}

impl TextureKey {
    /// Key for `path`, or `None` if the path has no usable final component.
    pub fn key_for(self, path: &Path) -> Option<String> {
        let component = match self {
            TextureKey::FileName => path.file_name(),
            TextureKey::Stem => path.file_stem(),
        }?;
        Some(component.to_string_lossy().into_owned())
    }
}

/// Atlas construction options.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasConfig {
    pub mipmaps: MipmapPolicy,
    pub keys: TextureKey,
    /// File extensions scanned by the directory loader, without the dot.
    pub extensions: Vec<String>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            mipmaps: MipmapPolicy::default(),
            keys: TextureKey::default(),
            extensions: vec!["png".to_string()],
        }
    }
}

impl AtlasConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mipmaps(mut self, mipmaps: MipmapPolicy) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    pub fn with_keys(mut self, keys: TextureKey) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `path` has one of the configured extensions (case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = ext.to_string_lossy();
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
    }
}

/// Renderer options.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub mesh: MeshShape,
    pub textures: TextureMode,
    pub transparency: TransparencyMode,
    pub atlas: AtlasConfig,
    /// Instances reserved per queue and in the initial instance buffer.
    pub initial_capacity: usize,
    pub clear_color: ClearColor,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mesh: MeshShape::default(),
            textures: TextureMode::default(),
            transparency: TransparencyMode::default(),
            atlas: AtlasConfig::default(),
            initial_capacity: 32,
            clear_color: ClearColor::BLACK,
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, mesh: MeshShape) -> Self {
        self.mesh = mesh;
        self
    }

    pub fn with_textures(mut self, textures: TextureMode) -> Self {
        self.textures = textures;
        self
    }

    pub fn with_transparency(mut self, transparency: TransparencyMode) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn with_atlas(mut self, atlas: AtlasConfig) -> Self {
        self.atlas = atlas;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_clear_color(mut self, color: ClearColor) -> Self {
        self.clear_color = color;
        self
    }
}
