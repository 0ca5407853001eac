//! FrameStage GPU - wgpu texture backend
//!
//! Video and OSD planes live in single channel textures. Released textures
//! are pooled so slot rebuilds after a resize reuse GPU memory.

pub mod backend;
pub mod context;
pub mod texture;
pub mod texture_pool;

pub use backend::WgpuBackend;
pub use context::{GpuContext, GpuOptions};
pub use texture::GpuTexture;
pub use texture_pool::{PoolKey, Poolable, TexturePool};
