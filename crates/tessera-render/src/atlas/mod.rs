//! Layered texture atlas.
//!
//! Same-sized images are packed one per layer into 2D texture arrays. Each
//! image is classified as opaque (every alpha is 255) or transparent, and the
//! class decides which array, and later which render pass, it belongs to.
//!
//! # Example
//!
//! ```rust
//! use tessera_render::atlas::{AtlasBuilder, MemorySource};
//! use tessera_render::config::AtlasConfig;
//!
//! let source = MemorySource::new()
//!     .with_solid("grass.png", 16, 16, [0, 200, 0, 255])
//!     .with_solid("glass.png", 16, 16, [200, 200, 255, 96]);
//!
//! let atlas = AtlasBuilder::new(AtlasConfig::default()).build(&source).unwrap();
//!
//! let grass = atlas.texture_ref("grass.png").unwrap();
//! let glass = atlas.texture_ref("glass.png").unwrap();
//! assert!(!grass.is_transparent());
//! assert!(glass.is_transparent());
//! assert_eq!(atlas.page(grass).unwrap().mip_levels(), 5);
//! ```

mod mipmap;
mod source;

pub use mipmap::{mip_extent, mip_level_count};
pub use source::{DirectorySource, ImageSource, MemorySource};

use std::fmt;

use image::RgbaImage;
use tessera_core::alloc::HashMap;
use tessera_core::profiling::profile_function;
use tessera_test_utils::{SpriteBackend, TextureArrayDescriptor, TextureArrayId};

use crate::config::{AtlasConfig, MipmapPolicy, RendererConfig, TextureMode, TransparencyMode};
use crate::error::AtlasError;

/// Handle to a loaded texture: its page, its layer within the page, and its
/// opacity class. Repeated lookups of the same name return equal refs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureRef {
    page: u32,
    layer: u32,
    transparent: bool,
}

impl TextureRef {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }
}

impl fmt::Display for TextureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {} layer {}", self.page, self.layer)
    }
}

/// A named texture and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub name: String,
    pub texture: TextureRef,
}

/// One GPU texture array and the images packed into it.
#[derive(Debug)]
pub struct AtlasPage {
    label: String,
    transparent: bool,
    width: u32,
    height: u32,
    mip_levels: u32,
    names: Vec<String>,
    /// Level-0 pixels per layer, released once uploaded.
    pending: Vec<RgbaImage>,
    array: TextureArrayId,
}

impl AtlasPage {
    fn new(label: impl Into<String>, transparent: bool) -> Self {
        Self {
            label: label.into(),
            transparent,
            width: 0,
            height: 0,
            mip_levels: 1,
            names: Vec::new(),
            pending: Vec::new(),
            array: TextureArrayId::NONE,
        }
    }

    /// Append `image` as the next layer, enforcing a uniform extent.
    fn push(&mut self, name: &str, image: RgbaImage) -> Result<u32, AtlasError> {
        let found = image.dimensions();
        if self.names.is_empty() {
            self.width = found.0;
            self.height = found.1;
        } else if found != (self.width, self.height) {
            return Err(AtlasError::SizeMismatch {
                name: name.to_string(),
                expected: (self.width, self.height),
                found,
            });
        }

        let layer = self.names.len() as u32;
        self.names.push(name.to_string());
        self.pending.push(image);
        Ok(layer)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the page is drawn in the blended pass.
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn layer_count(&self) -> u32 {
        self.names.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in layer order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Backend handle; `NONE` until uploaded, and forever for an empty page.
    pub fn array(&self) -> TextureArrayId {
        self.array
    }

    pub fn is_uploaded(&self) -> bool {
        self.array.is_some()
    }
}

/// Counters gathered while building an atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtlasStats {
    pub opaque: u32,
    pub transparent: u32,
    /// Images that failed to decode or were empty.
    pub skipped: u32,
    /// Images whose key was already taken.
    pub duplicates: u32,
}

impl AtlasStats {
    pub fn loaded(&self) -> u32 {
        self.opaque + self.transparent
    }
}

/// Builds an [`Atlas`] from an [`ImageSource`].
#[derive(Debug, Clone, Default)]
pub struct AtlasBuilder {
    config: AtlasConfig,
    textures: TextureMode,
    transparency: TransparencyMode,
}

impl AtlasBuilder {
    pub fn new(config: AtlasConfig) -> Self {
        Self {
            config,
            textures: TextureMode::default(),
            transparency: TransparencyMode::default(),
        }
    }

    /// Builder matching a renderer's texture and transparency modes.
    pub fn from_renderer_config(config: &RendererConfig) -> Self {
        Self {
            config: config.atlas.clone(),
            textures: config.textures,
            transparency: config.transparency,
        }
    }

    pub fn with_texture_mode(mut self, textures: TextureMode) -> Self {
        self.textures = textures;
        self
    }

    pub fn with_transparency(mut self, transparency: TransparencyMode) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Decode, classify and pack every image of `source`.
    ///
    /// Undecodable or empty images are skipped with a warning. A key that was
    /// already taken keeps its first image. Fails if two images routed to the
    /// same page differ in size.
    pub fn build<S: ImageSource + ?Sized>(&self, source: &S) -> Result<Atlas, AtlasError> {
        profile_function!();
        let mut atlas = Atlas {
            pages: Vec::new(),
            opaque: HashMap::default(),
            transparent: HashMap::default(),
            stats: AtlasStats::default(),
        };

        if self.textures == TextureMode::Array {
            match self.transparency {
                TransparencyMode::Split => {
                    atlas.pages.push(AtlasPage::new("atlas_opaque", false));
                    atlas.pages.push(AtlasPage::new("atlas_transparent", true));
                }
                TransparencyMode::Unified => {
                    atlas.pages.push(AtlasPage::new("atlas", true));
                }
            }
        }

        for index in 0..source.len() {
            let name = source.name(index);
            if atlas.contains(name) {
                tracing::warn!("Duplicate texture key '{}', keeping the first image", name);
                atlas.stats.duplicates += 1;
                continue;
            }

            let image = match source.decode(index) {
                Ok(image) => image,
                Err(err) => {
                    tracing::warn!("Skipping image: {}", err);
                    atlas.stats.skipped += 1;
                    continue;
                }
            };
            if image.width() == 0 || image.height() == 0 {
                tracing::warn!("Skipping empty image '{}'", name);
                atlas.stats.skipped += 1;
                continue;
            }

            let transparent = !is_opaque(&image);
            let page = self.route(&mut atlas.pages, name, transparent);
            let layer = atlas.pages[page].push(name, image)?;
            let texture = TextureRef {
                page: page as u32,
                layer,
                transparent,
            };

            if transparent {
                atlas.transparent.insert(name.to_string(), texture);
                atlas.stats.transparent += 1;
            } else {
                atlas.opaque.insert(name.to_string(), texture);
                atlas.stats.opaque += 1;
            }
            tracing::debug!(
                "Loaded texture '{}' into {} ({})",
                name,
                texture,
                if transparent { "transparent" } else { "opaque" }
            );
        }

        for page in &mut atlas.pages {
            page.mip_levels = mip_levels_for(page, self.config.mipmaps);
        }

        tracing::info!(
            "Built texture atlas: {} opaque, {} transparent, {} skipped, {} page(s)",
            atlas.stats.opaque,
            atlas.stats.transparent,
            atlas.stats.skipped,
            atlas.pages.len()
        );

        Ok(atlas)
    }

    fn route(&self, pages: &mut Vec<AtlasPage>, name: &str, transparent: bool) -> usize {
        match (self.textures, self.transparency) {
            (TextureMode::Array, TransparencyMode::Split) => transparent as usize,
            (TextureMode::Array, TransparencyMode::Unified) => 0,
            (TextureMode::PerTexture, transparency) => {
                let blended = transparent || transparency == TransparencyMode::Unified;
                pages.push(AtlasPage::new(name, blended));
                pages.len() - 1
            }
        }
    }
}

fn is_opaque(image: &RgbaImage) -> bool {
    image.pixels().all(|pixel| pixel[3] == u8::MAX)
}

fn mip_levels_for(page: &AtlasPage, policy: MipmapPolicy) -> u32 {
    mip_level_count(page.width.max(page.height), policy)
}

/// Texture pages plus the name index.
#[derive(Debug)]
pub struct Atlas {
    pages: Vec<AtlasPage>,
    opaque: HashMap<String, TextureRef>,
    transparent: HashMap<String, TextureRef>,
    stats: AtlasStats,
}

impl Atlas {
    /// Resolve a name. Opaque textures are searched first.
    pub fn texture_ref(&self, name: &str) -> Option<TextureRef> {
        self.opaque
            .get(name)
            .or_else(|| self.transparent.get(name))
            .copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.opaque.contains_key(name) || self.transparent.contains_key(name)
    }

    /// Whether `texture` points at an existing layer of this atlas.
    pub fn contains_ref(&self, texture: TextureRef) -> bool {
        self.pages
            .get(texture.page as usize)
            .is_some_and(|page| texture.layer < page.layer_count())
    }

    pub fn entry(&self, name: &str) -> Option<TextureEntry> {
        self.texture_ref(name).map(|texture| TextureEntry {
            name: name.to_string(),
            texture,
        })
    }

    /// Every entry, ordered by page then layer.
    pub fn entries(&self) -> Vec<TextureEntry> {
        let mut entries = self
            .opaque
            .iter()
            .chain(self.transparent.iter())
            .map(|(name, texture)| TextureEntry {
                name: name.clone(),
                texture: *texture,
            })
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| (entry.texture.page, entry.texture.layer));
        entries
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pages(&self) -> &[AtlasPage] {
        &self.pages
    }

    pub fn page(&self, texture: TextureRef) -> Option<&AtlasPage> {
        self.pages.get(texture.page as usize)
    }

    /// Backend array holding `texture`, `NONE` if not uploaded.
    pub fn array_for(&self, texture: TextureRef) -> TextureArrayId {
        self.page(texture)
            .map(AtlasPage::array)
            .unwrap_or(TextureArrayId::NONE)
    }

    pub fn stats(&self) -> AtlasStats {
        self.stats
    }

    /// Allocate a texture array per non-empty page, upload each layer and
    /// generate mipmaps. Empty pages stay unallocated. Pixel data is released
    /// after upload; calling this again only uploads pages that failed before.
    pub fn upload<B: SpriteBackend + ?Sized>(&mut self, backend: &mut B) -> Result<(), AtlasError> {
        profile_function!();
        for page in &mut self.pages {
            if page.is_empty() || page.is_uploaded() {
                continue;
            }

            let array = backend.create_texture_array(&TextureArrayDescriptor {
                label: Some(&page.label),
                width: page.width,
                height: page.height,
                layers: page.layer_count(),
                mip_levels: page.mip_levels,
            })?;

            for (layer, image) in page.pending.drain(..).enumerate() {
                backend.write_layer(array, layer as u32, image.as_raw());
            }
            if page.mip_levels > 1 {
                backend.generate_mipmaps(array);
            }
            page.array = array;

            tracing::debug!(
                "Uploaded '{}': {} layer(s) of {}x{}, {} mip level(s)",
                page.label,
                page.layer_count(),
                page.width,
                page.height,
                page.mip_levels
            );
        }
        Ok(())
    }
}
