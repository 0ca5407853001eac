//! Single-plane 8-bit GPU textures.

use framestage_core::{FramePlane, FrameStageError, PlaneKind, Result};

/// Format every video and OSD plane is stored in.
pub const PLANE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Bytes per texel of the formats this crate creates.
pub fn bytes_per_texel(format: wgpu::TextureFormat) -> usize {
    match format {
        wgpu::TextureFormat::R8Unorm | wgpu::TextureFormat::R8Uint => 1,
        wgpu::TextureFormat::Rg8Unorm => 2,
        _ => 4,
    }
}

/// Layout of a staged plane for `Queue::write_texture`.
pub fn plane_layout(plane: &FramePlane) -> wgpu::ImageDataLayout {
    wgpu::ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(plane.stride as u32),
        rows_per_image: Some(plane.height),
    }
}

/// One plane of a video or OSD slot on the GPU.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub kind: PlaneKind,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl GpuTexture {
    /// Create a sampled texture that accepts queue uploads.
    pub fn for_plane(device: &wgpu::Device, width: u32, height: u32, kind: PlaneKind) -> Self {
        let label = match kind {
            PlaneKind::Luma => "Luma Plane",
            PlaneKind::ChromaU => "Cb Plane",
            PlaneKind::ChromaV => "Cr Plane",
            PlaneKind::Alpha => "OSD Alpha Plane",
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PLANE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            kind,
            width,
            height,
            format: PLANE_FORMAT,
        }
    }

    /// Upload a staged plane of the same size.
    pub fn upload_plane(&self, queue: &wgpu::Queue, plane: &FramePlane) -> Result<()> {
        if plane.width != self.width || plane.height != self.height {
            return Err(FrameStageError::Gpu(format!(
                "Plane size {}x{} doesn't match texture size {}x{}",
                plane.width, plane.height, self.width, self.height
            )));
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &plane.data,
            plane_layout(plane),
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    pub fn memory_size(&self) -> usize {
        (self.width * self.height) as usize * bytes_per_texel(self.format)
    }
}
