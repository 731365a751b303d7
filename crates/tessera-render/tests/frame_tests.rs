//! End-to-end frame recording against the mock backend.

use glam::Vec2;
use tessera_render::{
    ClearColor, InitError, MemorySource, PassState, RendererConfig, Sprite, SpriteContext,
    SpriteInstance, SubmitError, TextureMode, TransparencyMode,
};
use tessera_test_utils::{
    BackendCall, BackendError, MockRecorder, MockSpriteBackend, ShaderStage,
};

fn source() -> MemorySource {
    MemorySource::new()
        .with_solid("grass.png", 4, 4, [40, 200, 40, 255])
        .with_solid("stone.png", 4, 4, [120, 120, 120, 255])
        .with_solid("smoke.png", 4, 4, [200, 200, 200, 128])
        .with_solid("glass.png", 4, 4, [180, 220, 255, 64])
}

fn context_with(
    config: RendererConfig,
) -> (SpriteContext<MockSpriteBackend>, MockRecorder) {
    let backend = MockSpriteBackend::new();
    let recorder = backend.recorder();
    let ctx = SpriteContext::from_source(backend, &source(), config).unwrap();
    recorder.clear_calls();
    (ctx, recorder)
}

fn context() -> (SpriteContext<MockSpriteBackend>, MockRecorder) {
    context_with(RendererConfig::default())
}

fn sprite(x: f32, depth: f32) -> Sprite {
    Sprite::new(Vec2::new(x, 0.0), 0.5).with_depth(depth)
}

/// Decode the first `count` instances of the current instance buffer.
fn uploaded(
    ctx: &SpriteContext<MockSpriteBackend>,
    recorder: &MockRecorder,
    count: usize,
) -> Vec<SpriteInstance> {
    recorder
        .buffer_contents(ctx.renderer().instance_buffer())
        .chunks_exact(SpriteInstance::SIZE as usize)
        .take(count)
        .map(bytemuck::pod_read_unaligned::<SpriteInstance>)
        .collect()
}

#[test]
fn test_initialization_uploads_atlas() {
    let backend = MockSpriteBackend::new();
    let recorder = backend.recorder();
    let ctx = SpriteContext::from_source(backend, &source(), RendererConfig::default()).unwrap();

    assert_eq!(ctx.atlas().len(), 4);
    assert_eq!(recorder.count_texture_array_creates(), 2);

    let opaque = ctx.atlas().array_for(ctx.texture_ref("grass.png").unwrap());
    let array = recorder.texture_array(opaque).unwrap();
    assert_eq!((array.width, array.height, array.layers), (4, 4, 2));
    assert_eq!(array.mip_levels, 3);
    assert_eq!(array.written_layers, vec![0, 1]);
    assert!(array.mipmaps_generated);

    // program, mesh and instance buffer
    assert_eq!(recorder.count_buffer_creates(), 2);
    assert!(matches!(
        recorder.calls().first(),
        Some(BackendCall::CreateProgram { .. })
    ));
}

#[test]
fn test_opaque_sprites_single_draw() {
    let (mut ctx, recorder) = context();
    let grass = ctx.texture_ref("grass.png").unwrap();
    let stone = ctx.texture_ref("stone.png").unwrap();

    for i in 0..10 {
        let texture = if i % 2 == 0 { grass } else { stone };
        ctx.submit(sprite(i as f32, 0.5), texture).unwrap();
    }
    let stats = ctx.draw();

    assert_eq!(stats.instances, 10);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(recorder.count_draws(), 1);
    assert_eq!(recorder.draws(), vec![0..10]);
    assert_eq!(recorder.pass_states(), vec![PassState::OPAQUE]);
    assert!(ctx.scene().is_empty());

    let layers = uploaded(&ctx, &recorder, 10)
        .iter()
        .map(|instance| instance.layer)
        .collect::<Vec<_>>();
    assert_eq!(layers, vec![grass.layer(), stone.layer()].repeat(5));
}

#[test]
fn test_transparent_uploaded_back_to_front() {
    let (mut ctx, recorder) = context();
    let smoke = ctx.texture_ref("smoke.png").unwrap();

    for depth in [0.2, 0.8, 0.5] {
        ctx.submit(sprite(0.0, depth), smoke).unwrap();
    }
    ctx.draw();

    let depths = uploaded(&ctx, &recorder, 3)
        .iter()
        .map(|instance| instance.depth)
        .collect::<Vec<_>>();
    assert_eq!(depths, vec![0.8, 0.5, 0.2]);
    assert_eq!(recorder.pass_states(), vec![PassState::TRANSPARENT]);
}

#[test]
fn test_transparent_equal_depth_keeps_submission_order() {
    let (mut ctx, recorder) = context();
    let smoke = ctx.texture_ref("smoke.png").unwrap();
    let glass = ctx.texture_ref("glass.png").unwrap();

    ctx.submit(sprite(0.0, 0.5), smoke).unwrap();
    ctx.submit(sprite(1.0, 0.5), glass).unwrap();
    ctx.submit(sprite(2.0, 0.5), smoke).unwrap();
    ctx.draw();

    let xs = uploaded(&ctx, &recorder, 3)
        .iter()
        .map(|instance| instance.world_pos[0])
        .collect::<Vec<_>>();
    assert_eq!(xs, vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_mixed_frame_two_passes() {
    let (mut ctx, recorder) = context();
    let grass = ctx.texture_ref("grass.png").unwrap();
    let smoke = ctx.texture_ref("smoke.png").unwrap();

    ctx.submit(sprite(0.0, 0.1), smoke).unwrap();
    for i in 0..3 {
        ctx.submit(sprite(i as f32, 0.5), grass).unwrap();
    }
    ctx.submit(sprite(1.0, 0.9), smoke).unwrap();
    let stats = ctx.draw();

    assert_eq!(stats.opaque, 3);
    assert_eq!(stats.transparent, 2);
    assert_eq!(stats.passes, 2);
    assert_eq!(recorder.draws(), vec![0..3, 3..5]);
    assert_eq!(
        recorder.pass_states(),
        vec![PassState::OPAQUE, PassState::TRANSPARENT]
    );
    assert_eq!(recorder.count_passes(), recorder.count_pass_ends());
    assert!(!recorder.is_pass_open());

    let instances = uploaded(&ctx, &recorder, 5);
    assert_eq!(instances[3].depth, 0.9);
    assert_eq!(instances[4].depth, 0.1);
}

#[test]
fn test_empty_scene_records_nothing() {
    let (mut ctx, recorder) = context();
    let stats = ctx.draw();

    assert_eq!(stats, Default::default());
    assert_eq!(recorder.count_draws(), 0);
    assert_eq!(recorder.count_texture_binds(), 0);
    assert_eq!(recorder.count_passes(), 0);
}

#[test]
fn test_queues_cleared_between_frames() {
    let (mut ctx, recorder) = context();
    let grass = ctx.texture_ref("grass.png").unwrap();

    ctx.submit(sprite(0.0, 0.5), grass).unwrap();
    ctx.draw();
    recorder.clear_calls();

    ctx.draw();
    assert_eq!(recorder.count_draws(), 0);
}

#[test]
fn test_compile_error_fails_initialization() {
    let backend = MockSpriteBackend::new().with_compile_error(ShaderStage::Fragment, "bad token");
    let err = SpriteContext::from_source(backend, &source(), RendererConfig::default())
        .unwrap_err();

    match err {
        InitError::Backend(BackendError::Compile { stage, message }) => {
            assert_eq!(stage, ShaderStage::Fragment);
            assert_eq!(message, "bad token");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_link_error_fails_initialization() {
    let backend = MockSpriteBackend::new().with_link_error("interface mismatch");
    let err = SpriteContext::from_source(backend, &source(), RendererConfig::default())
        .unwrap_err();
    assert!(matches!(err, InitError::Backend(BackendError::Link { .. })));
}

#[test]
fn test_layer_limit_fails_initialization() {
    let backend = MockSpriteBackend::new().with_max_texture_layers(1);
    let err = SpriteContext::from_source(backend, &source(), RendererConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        InitError::Backend(BackendError::ResourceLimit {
            requested: 2,
            limit: 1,
            ..
        })
    ));
}

#[test]
fn test_submit_rejects_unknown_texture() {
    let (mut ctx, _recorder) = context();
    let err = ctx.submit_named(sprite(0.0, 0.5), "missing.png").unwrap_err();
    assert_eq!(
        err,
        SubmitError::UnknownTexture {
            texture: "missing.png".to_string()
        }
    );
    assert!(ctx.scene().is_empty());
}

#[test]
fn test_submit_rejects_invalid_depth() {
    let (mut ctx, _recorder) = context();
    let grass = ctx.texture_ref("grass.png").unwrap();

    for depth in [1.0, -0.1, f32::NAN] {
        let err = ctx.submit(sprite(0.0, depth), grass).unwrap_err();
        assert!(matches!(err, SubmitError::InvalidDepth { .. }));
    }
    assert!(ctx.submit(sprite(0.0, 0.0), grass).is_ok());
    assert_eq!(ctx.scene().len(), 1);
}

#[test]
fn test_instance_buffer_grows_to_power_of_two() {
    let config = RendererConfig::default().with_initial_capacity(4);
    let (mut ctx, recorder) = context_with(config);
    let grass = ctx.texture_ref("grass.png").unwrap();
    let old = ctx.renderer().instance_buffer();

    for i in 0..5 {
        ctx.submit(sprite(i as f32, 0.5), grass).unwrap();
    }
    ctx.draw();

    assert_eq!(ctx.renderer().capacity(), 8);
    assert_ne!(ctx.renderer().instance_buffer(), old);
    assert!(recorder.is_buffer_destroyed(old));
    assert_eq!(
        recorder.buffer_contents(ctx.renderer().instance_buffer()).len(),
        8 * SpriteInstance::SIZE as usize
    );
    assert_eq!(recorder.draws(), vec![0..5]);

    // No further growth while the frame fits.
    recorder.clear_calls();
    for i in 0..8 {
        ctx.submit(sprite(i as f32, 0.5), grass).unwrap();
    }
    ctx.draw();
    assert_eq!(recorder.count_buffer_creates(), 0);
}

#[test]
fn test_unified_transparency_sorts_everything() {
    let config = RendererConfig::default().with_transparency(TransparencyMode::Unified);
    let (mut ctx, recorder) = context_with(config);
    assert_eq!(ctx.atlas().pages().len(), 1);

    let grass = ctx.texture_ref("grass.png").unwrap();
    let smoke = ctx.texture_ref("smoke.png").unwrap();
    ctx.submit(sprite(0.0, 0.3), grass).unwrap();
    ctx.submit(sprite(1.0, 0.7), smoke).unwrap();
    ctx.draw();

    assert_eq!(recorder.pass_states(), vec![PassState::TRANSPARENT]);
    assert_eq!(recorder.draws(), vec![0..2]);
    let depths = uploaded(&ctx, &recorder, 2)
        .iter()
        .map(|instance| instance.depth)
        .collect::<Vec<_>>();
    assert_eq!(depths, vec![0.7, 0.3]);
}

#[test]
fn test_per_texture_mode_binds_each_page() {
    let config = RendererConfig::default().with_textures(TextureMode::PerTexture);
    let (mut ctx, recorder) = context_with(config);
    assert_eq!(ctx.atlas().pages().len(), 4);

    let grass = ctx.texture_ref("grass.png").unwrap();
    let stone = ctx.texture_ref("stone.png").unwrap();
    ctx.submit(sprite(0.0, 0.5), grass).unwrap();
    ctx.submit(sprite(1.0, 0.5), stone).unwrap();
    ctx.submit(sprite(2.0, 0.5), grass).unwrap();
    let stats = ctx.draw();

    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.texture_binds, 2);
    assert_eq!(recorder.draws(), vec![0..2, 2..3]);
    assert_eq!(
        recorder.texture_binds(),
        vec![ctx.atlas().array_for(grass), ctx.atlas().array_for(stone)]
    );
}

#[test]
fn test_camera_uploaded_only_when_changed() {
    let (mut ctx, recorder) = context();
    let grass = ctx.texture_ref("grass.png").unwrap();

    ctx.set_camera_position(Vec2::new(1.0, 2.0));
    ctx.set_camera_size(Vec2::new(8.0, 4.0)).unwrap();
    ctx.submit(sprite(0.0, 0.5), grass).unwrap();
    ctx.draw();
    assert_eq!(recorder.count_camera_uploads(), 1);
    assert_eq!(recorder.last_camera(), Some(ctx.camera().uniform()));

    ctx.submit(sprite(0.0, 0.5), grass).unwrap();
    ctx.draw();
    assert_eq!(recorder.count_camera_uploads(), 1);

    ctx.set_camera_angle(0.25);
    ctx.submit(sprite(0.0, 0.5), grass).unwrap();
    ctx.draw();
    assert_eq!(recorder.count_camera_uploads(), 2);
}

#[test]
fn test_invalid_camera_size_keeps_previous() {
    let (mut ctx, _recorder) = context();
    ctx.set_camera_size(Vec2::new(4.0, 4.0)).unwrap();

    assert!(ctx.set_camera_size(Vec2::new(0.0, 4.0)).is_err());
    assert!(ctx.set_camera_size(Vec2::new(4.0, f32::INFINITY)).is_err());
    assert_eq!(ctx.camera().size(), Vec2::new(4.0, 4.0));
}

#[test]
fn test_clear_scene_uses_clear_color() {
    let (mut ctx, recorder) = context();
    ctx.clear_scene();
    ctx.set_clear_color(ClearColor::rgb(0.1, 0.2, 0.3));
    ctx.clear_scene();

    let clears = recorder
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            BackendCall::Clear { color } => Some(color),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(clears, vec![ClearColor::BLACK, ClearColor::rgb(0.1, 0.2, 0.3)]);
}

#[test]
fn test_frame_call_sequence() {
    let (mut ctx, recorder) = context();
    let grass = ctx.texture_ref("grass.png").unwrap();
    let smoke = ctx.texture_ref("smoke.png").unwrap();
    ctx.submit(sprite(0.0, 0.5), grass).unwrap();
    ctx.submit(sprite(0.0, 0.4), smoke).unwrap();
    ctx.draw();

    let frame = recorder
        .calls()
        .into_iter()
        .skip_while(|call| !matches!(call, BackendCall::BeginFrame { .. }))
        .collect::<Vec<_>>();
    let opaque = ctx.atlas().array_for(grass);
    let transparent = ctx.atlas().array_for(smoke);
    assert_eq!(
        frame,
        vec![
            BackendCall::BeginFrame {
                bindings: tessera_test_utils::FrameBindings {
                    program: ctx.renderer().program(),
                    mesh: ctx.renderer().mesh_buffer(),
                    instances: ctx.renderer().instance_buffer(),
                }
            },
            BackendCall::BeginPass {
                state: PassState::OPAQUE
            },
            BackendCall::BindTextureArray { array: opaque },
            BackendCall::Draw {
                vertices: 0..6,
                instances: 0..1
            },
            BackendCall::EndPass,
            BackendCall::BeginPass {
                state: PassState::TRANSPARENT
            },
            BackendCall::BindTextureArray { array: transparent },
            BackendCall::Draw {
                vertices: 0..6,
                instances: 1..2
            },
            BackendCall::EndPass,
            BackendCall::EndFrame,
        ]
    );
}
