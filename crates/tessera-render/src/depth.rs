//! Depth target for the sprite passes.

/// Depth format used by every sprite pipeline.
pub const DEFAULT_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A depth texture sized to the current render target.
///
/// # Example
///
/// ```ignore
/// let mut depth = DepthTexture::new(device, 800, 600, DEFAULT_DEPTH_FORMAT);
///
/// // Later, if the target resizes:
/// if depth.needs_resize(new_width, new_height) {
///     depth.resize(device, new_width, new_height);
/// }
/// ```
pub struct DepthTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
    format: wgpu::TextureFormat,
}

impl DepthTexture {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let (texture, view) = create_depth_texture(device, width, height, format);
        Self {
            texture,
            view,
            size: (width, height),
            format,
        }
    }

    /// Recreate the texture if the dimensions changed.
    ///
    /// Passes already submitted keep the old texture alive until they finish.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if !self.needs_resize(width, height) {
            return;
        }

        let (texture, view) = create_depth_texture(device, width, height, self.format);
        self.texture = texture;
        self.view = view;
        self.size = (width, height);
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Get the current size as (width, height).
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn needs_resize(&self, width: u32, height: u32) -> bool {
        self.size != (width, height)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

impl std::fmt::Debug for DepthTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthTexture")
            .field("size", &self.size)
            .field("format", &self.format)
            .finish()
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("sprite_depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    (texture, view)
}
