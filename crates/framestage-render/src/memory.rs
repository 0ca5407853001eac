//! CPU texture backend.
//!
//! Keeps tightly packed copies of every uploaded plane. Used headless and
//! in tests, where the optional memory budget makes allocation failures
//! reproducible.

use crate::backend::TextureBackend;
use framestage_core::{FramePlane, FrameStageError, PlaneKind, Result};
use tracing::debug;

/// A plane texture held in system memory.
#[derive(Debug, Clone)]
pub struct MemoryTexture {
    pub kind: PlaneKind,
    pub width: u32,
    pub height: u32,
    /// Packed samples, `width` bytes per row
    pub data: Vec<u8>,
    /// Number of uploads received
    pub uploads: u64,
}

impl MemoryTexture {
    pub fn row(&self, y: u32) -> &[u8] {
        let start = (y * self.width) as usize;
        &self.data[start..start + self.width as usize]
    }

    pub fn memory_size(&self) -> usize {
        self.data.len()
    }
}

/// Backend storing textures in `Vec<u8>`s.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Byte budget across live textures, unlimited when `None`
    max_memory: Option<usize>,
    total_memory: usize,
    live_textures: usize,
    total_uploads: u64,
}

impl MemoryBackend {
    /// Backend without a memory limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses to allocate past `max_memory` bytes.
    pub fn with_budget(max_memory: usize) -> Self {
        Self {
            max_memory: Some(max_memory),
            ..Self::default()
        }
    }

    /// Change the budget. Existing textures are kept.
    pub fn set_budget(&mut self, max_memory: Option<usize>) {
        self.max_memory = max_memory;
    }

    /// Bytes held by live textures.
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn texture_count(&self) -> usize {
        self.live_textures
    }

    pub fn upload_count(&self) -> u64 {
        self.total_uploads
    }
}

impl TextureBackend for MemoryBackend {
    type Texture = MemoryTexture;

    fn create_plane_texture(&mut self, width: u32, height: u32, kind: PlaneKind) -> Result<MemoryTexture> {
        let size = width as usize * height as usize;
        if let Some(max) = self.max_memory {
            if self.total_memory + size > max {
                return Err(FrameStageError::Allocation(format!(
                    "{:?} texture {}x{} exceeds budget ({} of {} bytes used)",
                    kind, width, height, self.total_memory, max
                )));
            }
        }

        self.total_memory += size;
        self.live_textures += 1;
        debug!(?kind, width, height, "Created memory texture");

        Ok(MemoryTexture {
            kind,
            width,
            height,
            data: vec![kind.clear_value(); size],
            uploads: 0,
        })
    }

    fn upload_plane(&mut self, texture: &mut MemoryTexture, plane: &FramePlane) -> Result<()> {
        if plane.width != texture.width || plane.height != texture.height {
            return Err(FrameStageError::InvalidParameter(format!(
                "plane size {}x{} doesn't match texture size {}x{}",
                plane.width, plane.height, texture.width, texture.height
            )));
        }

        let w = texture.width as usize;
        for (y, dst) in texture.data.chunks_exact_mut(w.max(1)).enumerate() {
            dst.copy_from_slice(plane.row(y as u32));
        }
        texture.uploads += 1;
        self.total_uploads += 1;
        Ok(())
    }

    fn release_texture(&mut self, texture: MemoryTexture) {
        self.total_memory = self.total_memory.saturating_sub(texture.memory_size());
        self.live_textures = self.live_textures.saturating_sub(1);
    }

    fn name(&self) -> &str {
        "memory"
    }
}
