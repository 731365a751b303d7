//! Frame planning: ordering, packing and grouping.
//!
//! The instance buffer is laid out as `[opaque | transparent]`. Opaque
//! instances keep submission order (stable-grouped by page in per-texture
//! mode); the depth test resolves their overlap. Transparent instances are
//! sorted farthest first and never regrouped, since blending depends on order.

use tessera_core::profiling::profile_scope;

use super::sort::back_to_front;
use super::types::{DrawGroup, SpriteInstance};
use crate::config::TextureMode;
use crate::scene::{QueuedSprite, SceneBuffer};

/// Reusable per-frame plan. Buffers keep their capacity between frames.
#[derive(Debug, Default)]
pub struct FramePlan {
    instances: Vec<SpriteInstance>,
    opaque: Vec<DrawGroup>,
    transparent: Vec<DrawGroup>,
    opaque_count: u32,
    scratch: Vec<QueuedSprite>,
}

impl FramePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a frame from `scene`. The scene itself is not modified.
    pub fn build(&mut self, scene: &SceneBuffer, mode: TextureMode) {
        self.instances.clear();
        self.opaque.clear();
        self.transparent.clear();

        {
            profile_scope!("plan_opaque");
            self.scratch.clear();
            self.scratch.extend_from_slice(scene.opaque());
            if mode == TextureMode::PerTexture {
                self.scratch.sort_by_key(|queued| queued.texture.page());
            }
            self.append(false);
        }
        self.opaque_count = self.instances.len() as u32;

        {
            profile_scope!("plan_transparent");
            self.scratch.clear();
            self.scratch.extend_from_slice(scene.transparent());
            back_to_front(&mut self.scratch, QueuedSprite::depth);
            self.append(true);
        }
    }

    fn append(&mut self, transparent: bool) {
        let groups = if transparent {
            &mut self.transparent
        } else {
            &mut self.opaque
        };

        for queued in &self.scratch {
            let index = self.instances.len() as u32;
            let page = queued.texture.page();
            match groups.last_mut() {
                Some(group) if group.page == page => group.count += 1,
                _ => groups.push(DrawGroup {
                    page,
                    start: index,
                    count: 1,
                }),
            }
            self.instances.push(SpriteInstance::from_queued(queued));
        }
    }

    /// Packed instances, opaque first.
    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    pub fn opaque_groups(&self) -> &[DrawGroup] {
        &self.opaque
    }

    pub fn transparent_groups(&self) -> &[DrawGroup] {
        &self.transparent
    }

    pub fn opaque_count(&self) -> u32 {
        self.opaque_count
    }

    pub fn transparent_count(&self) -> u32 {
        self.instances.len() as u32 - self.opaque_count
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
