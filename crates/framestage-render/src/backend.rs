//! Texture storage behind the buffer rings.

use framestage_core::{FramePlane, PlaneKind, Result};

/// Creates, fills and frees single-plane 8-bit textures.
///
/// Pixels are staged in a [`FramePlane`] while a slot is locked and handed
/// to [`upload_plane`](TextureBackend::upload_plane) when it is released.
pub trait TextureBackend: Send {
    /// Backend texture handle, owned by the slot that created it.
    type Texture: Send;

    /// Create a texture for one plane of a `width x height` plane.
    fn create_plane_texture(&mut self, width: u32, height: u32, kind: PlaneKind) -> Result<Self::Texture>;

    /// Copy the staged plane into the texture.
    fn upload_plane(&mut self, texture: &mut Self::Texture, plane: &FramePlane) -> Result<()>;

    /// Give a texture back to the backend.
    fn release_texture(&mut self, texture: Self::Texture);

    /// Short name for logging.
    fn name(&self) -> &str;
}
