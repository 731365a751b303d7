//! Headless Sprites - batched sprite rendering into an offscreen texture
//!
//! Builds an atlas, spins the camera and renders a field of opaque and
//! translucent sprites for a number of frames, logging per-frame statistics.
//!
//! Run with a procedural atlas:
//!   cargo run -p tessera-render --example headless_sprites
//!
//! Run with a directory of same-sized PNGs:
//!   cargo run -p tessera-render --example headless_sprites -- path/to/sprites
//!
//! Connect puffin_viewer to 127.0.0.1:8585 to inspect the frame profile.

use glam::Vec2;
use image::{Rgba, RgbaImage};
use tessera_core::logging;
use tessera_core::profiling::{ProfilingBackend, init_profiling, new_frame, profile_scope};
use tessera_render::{
    ClearColor, GraphicsContext, MemorySource, RendererConfig, Sprite, SpriteContext,
    WgpuSpriteBackend, wgpu,
};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const FRAMES: u32 = 120;

fn checkerboard(size: u32, a: [u8; 4], b: [u8; 4]) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgba(a)
        } else {
            Rgba(b)
        }
    })
}

fn procedural_atlas() -> MemorySource {
    MemorySource::new()
        .with_image("checker.png", checkerboard(64, [230, 230, 230, 255], [40, 40, 40, 255]))
        .with_solid("grass.png", 64, 64, [60, 170, 60, 255])
        .with_image("glass.png", checkerboard(64, [120, 180, 255, 96], [255, 255, 255, 32]))
        .with_solid("smoke.png", 64, 64, [200, 200, 200, 128])
}

fn main() {
    logging::init();
    init_profiling(ProfilingBackend::PuffinHttp);

    let context = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let mut backend = WgpuSpriteBackend::new(context.clone(), TARGET_FORMAT);

    let target = context.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("headless_target"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    backend.set_target(
        target.create_view(&wgpu::TextureViewDescriptor::default()),
        WIDTH,
        HEIGHT,
    );

    let config = RendererConfig::default().with_clear_color(ClearColor::rgb(0.1, 0.1, 0.15));
    let mut sprites = match std::env::args().nth(1) {
        Some(path) => SpriteContext::initialize(backend, path, config),
        None => SpriteContext::from_source(backend, &procedural_atlas(), config),
    }
    .expect("Failed to initialize sprites");

    let names = sprites
        .atlas()
        .entries()
        .into_iter()
        .map(|entry| entry.name)
        .collect::<Vec<_>>();
    if names.is_empty() {
        tracing::warn!("Atlas is empty, nothing to draw");
        return;
    }

    let aspect = WIDTH as f32 / HEIGHT as f32;
    sprites
        .set_camera_size(Vec2::new(20.0 * aspect, 20.0))
        .expect("valid camera size");

    for frame in 0..FRAMES {
        new_frame();
        profile_scope!("frame");

        let t = frame as f32 / 60.0;
        sprites.set_camera_angle(t * 0.2);
        sprites.clear_scene();

        for i in 0..400 {
            let name = &names[i % names.len()];
            let x = (i % 20) as f32 - 9.5;
            let y = (i / 20) as f32 - 9.5;
            let sprite = Sprite::new(Vec2::new(x, y), 0.45)
                .with_rotation(t + i as f32 * 0.1)
                .with_depth((i % 97) as f32 / 97.0);
            if let Err(err) = sprites.submit_named(sprite, name) {
                tracing::warn!("{}", err);
            }
        }

        let stats = sprites.draw();
        if frame % 30 == 0 {
            tracing::info!(
                "Frame {}: {} sprites in {} draw call(s), {} pass(es)",
                frame,
                stats.instances,
                stats.draw_calls,
                stats.passes
            );
        }
    }

    let _ = context.device().poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    });
    tracing::info!("Rendered {} frames", FRAMES);
}
