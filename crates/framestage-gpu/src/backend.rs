//! [`TextureBackend`] over wgpu.

use crate::context::GpuContext;
use crate::texture::{GpuTexture, PLANE_FORMAT};
use crate::texture_pool::{PoolKey, TexturePool};
use framestage_core::{FramePlane, FrameStageError, PlaneKind, Result};
use framestage_render::TextureBackend;
use std::sync::Arc;
use tracing::debug;

/// Default budget for parked textures: three 1080p 4:2:0 slots.
pub const DEFAULT_POOL_BUDGET: usize = 3 * 1920 * 1080 * 3 / 2;

/// Stores every plane in an `R8Unorm` texture and uploads with
/// `Queue::write_texture`.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pool: TexturePool<GpuTexture>,
    max_dimension: u32,
}

impl WgpuBackend {
    pub fn new(context: &GpuContext) -> Self {
        Self::with_pool_budget(context, DEFAULT_POOL_BUDGET)
    }

    pub fn with_pool_budget(context: &GpuContext, pool_budget: usize) -> Self {
        Self {
            device: Arc::clone(&context.device),
            queue: Arc::clone(&context.queue),
            pool: TexturePool::new(pool_budget),
            max_dimension: context.max_texture_dimension(),
        }
    }

    pub fn pool(&self) -> &TexturePool<GpuTexture> {
        &self.pool
    }

    /// Drop every parked texture.
    pub fn trim_pool(&mut self) {
        self.pool.clear();
    }
}

impl TextureBackend for WgpuBackend {
    type Texture = GpuTexture;

    fn create_plane_texture(&mut self, width: u32, height: u32, kind: PlaneKind) -> Result<GpuTexture> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension {
            return Err(FrameStageError::Allocation(format!(
                "{:?} texture {}x{} outside 1..={}",
                kind, width, height, self.max_dimension
            )));
        }

        let key = PoolKey {
            width,
            height,
            format: PLANE_FORMAT,
        };
        if let Some(mut texture) = self.pool.take(key) {
            texture.kind = kind;
            return Ok(texture);
        }

        debug!(?kind, width, height, "Creating plane texture");
        Ok(GpuTexture::for_plane(&self.device, width, height, kind))
    }

    fn upload_plane(&mut self, texture: &mut GpuTexture, plane: &FramePlane) -> Result<()> {
        texture.upload_plane(&self.queue, plane)
    }

    fn release_texture(&mut self, texture: GpuTexture) {
        if !self.pool.put(texture) {
            debug!("Texture pool full, dropping texture");
        }
    }

    fn name(&self) -> &str {
        "wgpu"
    }
}
