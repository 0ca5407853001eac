//! FrameStage Render - buffer management and the video renderer
//!
//! Decoded frames are staged in CPU planes and uploaded through a
//! [`TextureBackend`]. The frame ring rotates decode and display slots;
//! the OSD ring double-buffers subtitle bitmaps.

pub mod backend;
pub mod buffer_ring;
pub mod memory;
pub mod osd_ring;
pub mod renderer;

pub use backend::TextureBackend;
pub use buffer_ring::{FrameBufferRing, ImageFlags, ImageSource, SlotState, VideoSlot, YuvImage};
pub use memory::{MemoryBackend, MemoryTexture};
pub use osd_ring::{OsdBufferRing, OsdPlacement, OsdQuad, OsdSlot};
pub use renderer::{RenderOutput, RenderedFrame, SharedRenderer, VideoRenderer, YuvRenderer};
