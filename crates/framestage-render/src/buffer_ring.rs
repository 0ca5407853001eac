//! Ring of YUV 4:2:0 video slots shared between decoder and presentation.
//!
//! The decoder locks a slot with [`FrameBufferRing::get_image`], fills its
//! planes and hands it back with [`FrameBufferRing::release_image`], which
//! uploads the planes through the backend. [`FrameBufferRing::flip_page`]
//! then makes it the displayed slot. The displayed index lives in an
//! `Arc<AtomicUsize>` so presentation can read it without the renderer lock.

use crate::backend::TextureBackend;
use framestage_core::frame::{alloc_planes, PlaneSet};
use framestage_core::limits::{MAX_DYNAMIC_VIDEO_BUFFERS, MAX_VIDEO_BUFFERS};
use framestage_core::{BufferCount, FramePlane, FrameStageError, PlaneKind, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::ops::BitOr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Which slot `get_image` should lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// Next slot after the displayed one
    Auto,
    Index(usize),
}

/// Per-slot lock and status bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ImageFlags(u8);

impl ImageFlags {
    /// Locked for reading
    pub const READING: Self = Self(0x01);
    /// Locked for writing
    pub const WRITING: Self = Self(0x02);
    pub const IN_USE: Self = Self(0x03);
    /// Holds a complete frame
    pub const READY: Self = Self(0x04);
    /// Released with `preserve`
    pub const RESERVED: Self = Self(0x08);
    /// Added on demand past the regular slots, kept until `reset`
    pub const DYNAMIC: Self = Self(0x10);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ImageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Role a slot currently plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Free,
    /// Locked by the decoder
    DecodeTarget,
    /// Shown by presentation
    RenderTarget,
}

/// One video slot: three plane textures plus their staging planes.
#[derive(Debug)]
pub struct VideoSlot<T> {
    textures: SmallVec<[T; 3]>,
    planes: PlaneSet,
    flags: ImageFlags,
    flip_index: u64,
}

impl<T> VideoSlot<T> {
    pub fn textures(&self) -> &[T] {
        &self.textures
    }

    pub fn planes(&self) -> &[FramePlane] {
        &self.planes
    }

    pub fn luma(&self) -> &FramePlane {
        &self.planes[0]
    }

    pub fn flags(&self) -> ImageFlags {
        self.flags
    }

    /// Flip count at which this slot was last displayed, 0 if never.
    pub fn flip_index(&self) -> u64 {
        self.flip_index
    }

    fn in_use(&self) -> bool {
        self.flags.intersects(ImageFlags::IN_USE)
    }

    fn upload<B: TextureBackend<Texture = T>>(&mut self, backend: &mut B) -> Result<()> {
        for (texture, plane) in self.textures.iter_mut().zip(self.planes.iter()) {
            backend.upload_plane(texture, plane)?;
        }
        Ok(())
    }
}

/// A locked slot handed to the decoder.
#[derive(Debug)]
pub struct YuvImage<'a> {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub readonly: bool,
    /// Luma, Cb, Cr
    pub planes: &'a mut [FramePlane],
}

impl YuvImage<'_> {
    fn plane_index(kind: PlaneKind) -> usize {
        match kind {
            PlaneKind::Luma | PlaneKind::Alpha => 0,
            PlaneKind::ChromaU => 1,
            PlaneKind::ChromaV => 2,
        }
    }

    pub fn plane(&self, kind: PlaneKind) -> &FramePlane {
        &self.planes[Self::plane_index(kind)]
    }

    pub fn plane_mut(&mut self, kind: PlaneKind) -> &mut FramePlane {
        &mut self.planes[Self::plane_index(kind)]
    }
}

/// Video slot ring.
#[derive(Debug)]
pub struct FrameBufferRing<T> {
    slots: Vec<Option<VideoSlot<T>>>,
    /// Slots taking part in selection; lingering in-use slots past this
    /// are freed by a later `manage_textures`
    active: usize,
    mode: BufferCount,
    width: u32,
    height: u32,
    render_index: Arc<AtomicUsize>,
    flip_count: u64,
}

impl<T> Default for FrameBufferRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameBufferRing<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            active: 0,
            mode: BufferCount::default(),
            width: 0,
            height: 0,
            render_index: Arc::new(AtomicUsize::new(0)),
            flip_count: 0,
        }
    }

    /// Index of the displayed slot.
    pub fn render_index(&self) -> usize {
        self.render_index.load(Ordering::Acquire)
    }

    /// Shared handle to the displayed index for lock-free readers.
    pub fn render_index_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.render_index)
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn mode(&self) -> BufferCount {
        self.mode
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn flip_count(&self) -> u64 {
        self.flip_count
    }

    pub fn slot(&self, index: usize) -> Option<&VideoSlot<T>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// The displayed slot, if it exists.
    pub fn displayed(&self) -> Option<&VideoSlot<T>> {
        self.slot(self.render_index())
    }

    /// State of an allocated slot.
    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        let slot = self.slot(index)?;
        Some(if slot.in_use() {
            SlotState::DecodeTarget
        } else if index == self.render_index() && index < self.active {
            SlotState::RenderTarget
        } else {
            SlotState::Free
        })
    }

    fn is_in_use(&self, index: usize) -> bool {
        self.slot(index).is_some_and(VideoSlot::in_use)
    }

    /// Slot the decoder should fill next.
    ///
    /// Double buffering always takes the slot after the displayed one.
    /// Triple buffering skips slots that are still locked.
    fn next_index(&self) -> Option<usize> {
        if self.active == 0 {
            return None;
        }
        let render = self.render_index();
        match self.mode {
            BufferCount::Double => Some((render + 1) % self.active),
            BufferCount::Triple => (1..self.active)
                .map(|k| (render + k) % self.active)
                .find(|&i| !self.is_in_use(i)),
        }
    }

    fn dynamic_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.flags.contains(ImageFlags::DYNAMIC))
            .count()
    }

    /// True when triple buffering has no free slot besides the displayed one.
    pub fn wants_dynamic_slot(&self) -> bool {
        self.mode == BufferCount::Triple
            && self.active > 0
            && self.slots.len() == self.active
            && self.next_index().is_none()
    }

    /// Append an extra slot past the regular ones.
    ///
    /// The slot takes part in selection right away and survives
    /// `manage_textures` until [`FrameBufferRing::reset`] drops its flag.
    /// Returns the new slot's index.
    pub fn add_dynamic_slot<B>(&mut self, backend: &mut B) -> Result<usize>
    where
        B: TextureBackend<Texture = T>,
    {
        let render = self.render_index();
        if self.active == 0 || self.slots.len() != self.active {
            return Err(FrameStageError::BufferBusy(render));
        }
        if self.dynamic_count() >= MAX_DYNAMIC_VIDEO_BUFFERS {
            warn!(limit = MAX_DYNAMIC_VIDEO_BUFFERS, "Dynamic slot limit reached");
            return Err(FrameStageError::BufferBusy(render));
        }

        let index = self.slots.len();
        let mut slot = self.create_slot(backend, index).ok_or_else(|| {
            FrameStageError::Allocation(format!("dynamic video slot {} of {}x{}", index, self.width, self.height))
        })?;
        slot.flags.insert(ImageFlags::DYNAMIC);
        self.slots.push(Some(slot));
        self.active = self.slots.len();
        info!(slot = index, "Added dynamic video slot");
        Ok(index)
    }

    /// Lock a slot for the decoder.
    pub fn get_image(&mut self, source: ImageSource, readonly: bool) -> Result<YuvImage<'_>> {
        if self.active == 0 {
            return Err(FrameStageError::NoBuffers);
        }

        let render = self.render_index();
        let index = match source {
            ImageSource::Auto => self.next_index().ok_or(FrameStageError::BufferBusy(render))?,
            ImageSource::Index(i) => i,
        };
        if index >= self.active {
            return Err(FrameStageError::InvalidParameter(format!(
                "buffer index {} out of range (0..{})",
                index, self.active
            )));
        }
        if !readonly && index == render {
            debug!(slot = index, "Refusing to write the displayed slot");
            return Err(FrameStageError::BufferBusy(index));
        }

        let (width, height) = (self.width, self.height);
        let slot = self.slots[index]
            .as_mut()
            .ok_or(FrameStageError::NoSuchBuffer(index))?;
        if slot.in_use() {
            return Err(FrameStageError::BufferBusy(index));
        }

        if readonly {
            slot.flags.insert(ImageFlags::READING);
        } else {
            slot.flags.insert(ImageFlags::WRITING);
            slot.flags.remove(ImageFlags::READY);
        }

        Ok(YuvImage {
            index,
            width,
            height,
            readonly,
            planes: &mut slot.planes,
        })
    }

    /// Unlock a slot. Written planes are uploaded first.
    ///
    /// Only a written slot becomes ready; releasing a read lock leaves the
    /// ready bit as it was.
    ///
    /// `preserve` marks the slot reserved; locking and selection ignore it.
    pub fn release_image<B>(&mut self, backend: &mut B, index: usize, preserve: bool) -> Result<()>
    where
        B: TextureBackend<Texture = T>,
    {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| FrameStageError::InvalidParameter(format!("buffer index {} out of range", index)))?
            .as_mut()
            .ok_or(FrameStageError::NoSuchBuffer(index))?;

        let written = slot.flags.contains(ImageFlags::WRITING);
        let upload = if written { slot.upload(backend) } else { Ok(()) };

        slot.flags.remove(ImageFlags::IN_USE);
        if written {
            slot.flags.insert(ImageFlags::READY);
        }
        if preserve {
            slot.flags.insert(ImageFlags::RESERVED);
        }

        if let Err(e) = &upload {
            warn!(slot = index, error = %e, "Upload failed on release");
        }
        upload
    }

    /// Make `source` (or the next slot) the displayed one.
    ///
    /// Returns the new render index, `None` without slots.
    pub fn flip_page(&mut self, source: Option<usize>) -> Option<usize> {
        if self.active == 0 {
            return None;
        }
        let index = match source {
            Some(i) if i < self.active => i,
            _ => self.next_index().unwrap_or_else(|| self.render_index()),
        };

        self.render_index.store(index, Ordering::Release);
        self.flip_count += 1;
        if let Some(slot) = self.slots[index].as_mut() {
            slot.flip_index = self.flip_count;
        }
        Some(index)
    }

    /// Resize the ring to `count` slots.
    ///
    /// New slots are cleared to black, or copy the displayed slot when
    /// `seed_from_displayed` is set. Shrinking stops at the first locked
    /// or dynamic slot from the top. The render index is clamped into range.
    pub fn manage_textures<B>(&mut self, backend: &mut B, count: BufferCount, seed_from_displayed: bool)
    where
        B: TextureBackend<Texture = T>,
    {
        self.mode = count;
        let needed = count.get().min(MAX_VIDEO_BUFFERS);
        if self.width == 0 || self.height == 0 {
            return;
        }

        let first_new = self.slots.len();
        while self.slots.len() < needed {
            let slot = self.create_slot(backend, self.slots.len());
            self.slots.push(slot);
        }
        if seed_from_displayed {
            let displayed = self.render_index();
            for index in first_new..self.slots.len() {
                if let Err(e) = self.copy_slot(backend, displayed, index) {
                    debug!(slot = index, error = %e, "Could not seed new slot");
                }
            }
        }

        while self.slots.len() > needed {
            let top = self.slots.len() - 1;
            if self.is_in_use(top) {
                debug!(slot = top, "Slot in use, postponing shrink");
                break;
            }
            if self.slot(top).is_some_and(|s| s.flags.contains(ImageFlags::DYNAMIC)) {
                break;
            }
            if let Some(slot) = self.slots.pop().flatten() {
                release_slot(backend, slot);
                debug!(slot = top, "Deleted video slot");
            }
        }

        self.active = if self.dynamic_count() > 0 {
            self.slots.len()
        } else {
            needed
        };
        let render = self.render_index();
        if render >= self.active {
            self.render_index.store(render % self.active, Ordering::Release);
        }
    }

    fn create_slot<B>(&self, backend: &mut B, index: usize) -> Option<VideoSlot<T>>
    where
        B: TextureBackend<Texture = T>,
    {
        let mut slot = VideoSlot {
            textures: SmallVec::new(),
            planes: alloc_planes(&PlaneKind::YUV420, self.width, self.height),
            flags: ImageFlags::empty(),
            flip_index: 0,
        };

        let mut created = Ok(());
        for kind in PlaneKind::YUV420 {
            let (w, h) = kind.dimensions(self.width, self.height);
            match backend.create_plane_texture(w, h, kind) {
                Ok(texture) => slot.textures.push(texture),
                Err(e) => {
                    created = Err(e);
                    break;
                }
            }
        }
        let result = created.and_then(|()| slot.upload(backend));

        match result {
            Ok(()) => {
                info!(
                    slot = index,
                    width = self.width,
                    height = self.height,
                    backend = backend.name(),
                    "Created video slot"
                );
                Some(slot)
            }
            Err(e) => {
                error!(slot = index, error = %e, "Unable to create video slot");
                release_slot(backend, slot);
                None
            }
        }
    }

    /// Copy a sub-rectangle of planar 4:2:0 data into the next decode slot.
    ///
    /// `x`, `y`, `width` and `height` are in luma samples; chroma uses half
    /// of each. An unlocked slot is uploaded right away, a locked one on
    /// release. Returns the slot written.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_slice<B>(
        &mut self,
        backend: &mut B,
        src: [&[u8]; 3],
        strides: [usize; 3],
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    ) -> Result<usize>
    where
        B: TextureBackend<Texture = T>,
    {
        if self.active == 0 {
            return Err(FrameStageError::NoBuffers);
        }
        let render = self.render_index();
        let index = self.next_index().ok_or(FrameStageError::BufferBusy(render))?;
        if index == render {
            return Err(FrameStageError::BufferBusy(index));
        }
        let slot = self.slots[index]
            .as_mut()
            .ok_or(FrameStageError::NoSuchBuffer(index))?;

        for (p, plane) in slot.planes.iter_mut().enumerate() {
            let shift = u32::from(p != 0);
            plane.copy_from(
                src[p],
                strides[p],
                x >> shift,
                y >> shift,
                (width >> shift) as usize,
                (height >> shift) as usize,
            );
        }

        if !slot.flags.contains(ImageFlags::WRITING) {
            slot.upload(backend)?;
            slot.flags.insert(ImageFlags::READY);
        }
        Ok(index)
    }

    /// Clear a slot to black.
    pub fn clear_slot<B>(&mut self, backend: &mut B, index: usize) -> Result<()>
    where
        B: TextureBackend<Texture = T>,
    {
        let slot = self
            .slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(FrameStageError::NoSuchBuffer(index))?;
        for (kind, plane) in PlaneKind::YUV420.iter().zip(slot.planes.iter_mut()) {
            plane.fill(kind.clear_value());
        }
        slot.upload(backend)
    }

    /// Duplicate the pixels of `src` into `dst`.
    pub fn copy_slot<B>(&mut self, backend: &mut B, src: usize, dst: usize) -> Result<()>
    where
        B: TextureBackend<Texture = T>,
    {
        if src == dst {
            return Ok(());
        }
        let planes = self
            .slot(src)
            .map(|s| s.planes.clone())
            .ok_or(FrameStageError::NoSuchBuffer(src))?;
        let slot = self
            .slots
            .get_mut(dst)
            .and_then(Option::as_mut)
            .ok_or(FrameStageError::NoSuchBuffer(dst))?;
        if slot.in_use() {
            return Err(FrameStageError::BufferBusy(dst));
        }
        slot.planes = planes;
        slot.upload(backend)
    }

    /// Drop every lock and status flag. Dynamic slots lose their flag and
    /// are freed by the next `manage_textures`.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.flags = ImageFlags::empty();
        }
    }

    /// Set the frame size. A change frees all slots so the next
    /// `manage_textures` recreates them.
    pub fn set_frame_size<B>(&mut self, backend: &mut B, width: u32, height: u32)
    where
        B: TextureBackend<Texture = T>,
    {
        if (width, height) != (self.width, self.height) {
            self.uninit(backend);
            self.width = width;
            self.height = height;
        }
    }

    /// Release every slot unconditionally.
    pub fn uninit<B>(&mut self, backend: &mut B)
    where
        B: TextureBackend<Texture = T>,
    {
        let count = self.slots.len();
        for slot in self.slots.drain(..).flatten() {
            release_slot(backend, slot);
        }
        self.active = 0;
        self.flip_count = 0;
        self.render_index.store(0, Ordering::Release);
        if count > 0 {
            debug!(count, "Released video slots");
        }
    }
}

fn release_slot<B: TextureBackend>(backend: &mut B, slot: VideoSlot<B::Texture>) {
    for texture in slot.textures {
        backend.release_texture(texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, MemoryTexture};
    use proptest::prelude::*;

    fn ring(backend: &mut MemoryBackend, count: BufferCount) -> FrameBufferRing<MemoryTexture> {
        let mut ring = FrameBufferRing::new();
        ring.set_frame_size(backend, 64, 32);
        ring.manage_textures(backend, count, false);
        ring
    }

    #[test]
    fn test_slots_created_black() {
        let mut backend = MemoryBackend::new();
        let ring = ring(&mut backend, BufferCount::Triple);
        assert_eq!(ring.active_count(), 3);
        assert_eq!(backend.texture_count(), 9);
        let slot = ring.slot(2).unwrap();
        assert!(slot.textures()[0].data.iter().all(|&v| v == 0));
        assert!(slot.textures()[1].data.iter().all(|&v| v == 128));
        assert_eq!(slot.textures()[2].width, 32);
    }

    #[test]
    fn test_no_buffers() {
        let mut ring: FrameBufferRing<MemoryTexture> = FrameBufferRing::new();
        assert!(matches!(
            ring.get_image(ImageSource::Auto, false),
            Err(FrameStageError::NoBuffers)
        ));
        assert_eq!(ring.flip_page(None), None);
    }

    #[test]
    fn test_decode_and_flip() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);

        let image = ring.get_image(ImageSource::Auto, false).unwrap();
        assert_eq!(image.index, 1);
        let index = image.index;
        image.planes[0].row_mut(0).fill(200);
        assert_eq!(ring.slot_state(1), Some(SlotState::DecodeTarget));

        ring.release_image(&mut backend, index, false).unwrap();
        let slot = ring.slot(1).unwrap();
        assert_eq!(slot.textures()[0].row(0), &[200u8; 64]);
        assert!(slot.flags().contains(ImageFlags::READY));

        assert_eq!(ring.flip_page(Some(1)), Some(1));
        assert_eq!(ring.slot_state(1), Some(SlotState::RenderTarget));
        assert_eq!(ring.slot_state(0), Some(SlotState::Free));
        assert_eq!(ring.displayed().unwrap().flip_index(), 1);
    }

    #[test]
    fn test_auto_never_returns_displayed() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        for target in [2, 0, 1, 1] {
            ring.flip_page(Some(target));
            let index = ring.get_image(ImageSource::Auto, false).unwrap().index;
            assert_ne!(index, target);
            ring.release_image(&mut backend, index, false).unwrap();
        }
    }

    #[test]
    fn test_triple_skips_locked_slots() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        let a = ring.get_image(ImageSource::Auto, false).unwrap().index;
        let b = ring.get_image(ImageSource::Auto, false).unwrap().index;
        assert_eq!((a, b), (1, 2));
        assert!(matches!(
            ring.get_image(ImageSource::Auto, false),
            Err(FrameStageError::BufferBusy(_))
        ));

        ring.release_image(&mut backend, a, false).unwrap();
        ring.flip_page(Some(a));
        assert_eq!(ring.get_image(ImageSource::Auto, false).unwrap().index, 0);
    }

    #[test]
    fn test_dynamic_slot_when_all_busy() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        assert!(!ring.wants_dynamic_slot());
        ring.get_image(ImageSource::Auto, false).unwrap();
        ring.get_image(ImageSource::Auto, false).unwrap();
        assert!(ring.wants_dynamic_slot());

        assert_eq!(ring.add_dynamic_slot(&mut backend).unwrap(), 3);
        assert_eq!(ring.active_count(), 4);
        assert_eq!(backend.texture_count(), 12);
        let image = ring.get_image(ImageSource::Auto, false).unwrap();
        assert_eq!(image.index, 3);
        ring.release_image(&mut backend, 3, false).unwrap();
        assert!(ring.slot(3).unwrap().flags().contains(ImageFlags::DYNAMIC | ImageFlags::READY));

        // survives the per-frame resize
        ring.manage_textures(&mut backend, BufferCount::Triple, false);
        assert_eq!(ring.active_count(), 4);
        ring.flip_page(Some(3));
        assert_eq!(ring.render_index(), 3);

        ring.release_image(&mut backend, 1, false).unwrap();
        ring.release_image(&mut backend, 2, false).unwrap();
        ring.reset();
        ring.manage_textures(&mut backend, BufferCount::Triple, false);
        assert!(ring.slot(3).is_none());
        assert_eq!(ring.active_count(), 3);
        assert_eq!(ring.render_index(), 0);
        assert_eq!(backend.texture_count(), 9);
    }

    #[test]
    fn test_dynamic_slot_limit() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        let mut locked = Vec::new();
        for _ in 0..2 + MAX_DYNAMIC_VIDEO_BUFFERS {
            if ring.wants_dynamic_slot() {
                ring.add_dynamic_slot(&mut backend).unwrap();
            }
            locked.push(ring.get_image(ImageSource::Auto, false).unwrap().index);
        }
        assert_eq!(locked, vec![1, 2, 3, 4, 5]);
        assert!(ring.wants_dynamic_slot());
        assert!(matches!(
            ring.add_dynamic_slot(&mut backend),
            Err(FrameStageError::BufferBusy(0))
        ));
        assert_eq!(ring.active_count(), 6);
    }

    #[test]
    fn test_no_dynamic_slot_when_double() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);
        ring.get_image(ImageSource::Auto, false).unwrap();
        assert!(!ring.wants_dynamic_slot());
    }

    #[test]
    fn test_read_release_does_not_mark_ready() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);
        ring.get_image(ImageSource::Index(1), true).unwrap();
        ring.release_image(&mut backend, 1, false).unwrap();
        assert!(!ring.slot(1).unwrap().flags().contains(ImageFlags::READY));

        // a ready slot stays ready across a read
        ring.get_image(ImageSource::Index(1), false).unwrap();
        ring.release_image(&mut backend, 1, false).unwrap();
        ring.get_image(ImageSource::Index(1), true).unwrap();
        ring.release_image(&mut backend, 1, false).unwrap();
        assert!(ring.slot(1).unwrap().flags().contains(ImageFlags::READY));
    }

    #[test]
    fn test_explicit_index_errors() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);
        assert!(matches!(
            ring.get_image(ImageSource::Index(5), false),
            Err(FrameStageError::InvalidParameter(_))
        ));
        assert!(matches!(
            ring.get_image(ImageSource::Index(0), false),
            Err(FrameStageError::BufferBusy(0))
        ));
        // the displayed slot may still be read
        let image = ring.get_image(ImageSource::Index(0), true).unwrap();
        assert!(image.readonly);
        assert!(matches!(
            ring.get_image(ImageSource::Index(0), true),
            Err(FrameStageError::BufferBusy(0))
        ));
    }

    #[test]
    fn test_preserve_marks_reserved() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);
        let index = ring.get_image(ImageSource::Auto, false).unwrap().index;
        ring.release_image(&mut backend, index, true).unwrap();
        let flags = ring.slot(index).unwrap().flags();
        assert!(flags.contains(ImageFlags::RESERVED));
        assert!(!flags.intersects(ImageFlags::IN_USE));
        // reserved slots remain selectable
        assert_eq!(ring.get_image(ImageSource::Auto, false).unwrap().index, index);
    }

    #[test]
    fn test_allocation_failure_leaves_slot_absent() {
        // room for one slot of 64x32 (2048 + 2 * 512 bytes)
        let mut backend = MemoryBackend::with_budget(3072);
        let mut ring = ring(&mut backend, BufferCount::Double);
        assert!(ring.slot(0).is_some());
        assert!(ring.slot(1).is_none());
        assert_eq!(backend.texture_count(), 3);
        assert!(matches!(
            ring.get_image(ImageSource::Auto, false),
            Err(FrameStageError::NoSuchBuffer(1))
        ));
    }

    #[test]
    fn test_shrink_clamps_render_index() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        ring.flip_page(Some(2));
        ring.manage_textures(&mut backend, BufferCount::Double, false);
        assert_eq!(ring.active_count(), 2);
        assert_eq!(ring.render_index(), 0);
        assert_eq!(backend.texture_count(), 6);
    }

    #[test]
    fn test_shrink_stops_at_locked_slot() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        ring.get_image(ImageSource::Index(2), false).unwrap();
        ring.manage_textures(&mut backend, BufferCount::Double, false);
        assert!(ring.slot(2).is_some());
        assert_eq!(ring.active_count(), 2);

        ring.release_image(&mut backend, 2, false).unwrap();
        ring.manage_textures(&mut backend, BufferCount::Double, false);
        assert!(ring.slot(2).is_none());
        assert_eq!(backend.texture_count(), 6);
    }

    #[test]
    fn test_grow_seeds_from_displayed() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);
        let index = {
            let mut image = ring.get_image(ImageSource::Auto, false).unwrap();
            image.plane_mut(PlaneKind::Luma).fill(90);
            image.index
        };
        ring.release_image(&mut backend, index, false).unwrap();
        ring.flip_page(Some(index));

        ring.manage_textures(&mut backend, BufferCount::Triple, true);
        assert_eq!(ring.slot(2).unwrap().textures()[0].row(5), &[90u8; 64]);
    }

    #[test]
    fn test_draw_slice_halves_chroma() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);
        let y = vec![50u8; 16 * 8];
        let u = vec![60u8; 8 * 4];
        let v = vec![70u8; 8 * 4];
        let index = ring
            .draw_slice(&mut backend, [&y, &u, &v], [16, 8, 8], 16, 8, 8, 4)
            .unwrap();
        assert_eq!(index, 1);
        let slot = ring.slot(1).unwrap();
        assert_eq!(slot.textures()[0].row(4)[8..24], [50u8; 16]);
        assert_eq!(slot.textures()[0].row(3)[8], 0);
        assert_eq!(slot.textures()[1].row(2)[4..12], [60u8; 8]);
        assert_eq!(slot.textures()[2].row(5)[4], 70);
        assert_eq!(slot.textures()[2].row(6)[4], 128);
    }

    #[test]
    fn test_clear_and_copy() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Double);
        let index = ring.get_image(ImageSource::Auto, false).unwrap().index;
        ring.release_image(&mut backend, index, false).unwrap();
        {
            let image = ring.get_image(ImageSource::Index(1), false).unwrap();
            image.planes[1].fill(10);
        }
        ring.release_image(&mut backend, 1, false).unwrap();
        ring.copy_slot(&mut backend, 1, 0).unwrap();
        assert_eq!(ring.slot(0).unwrap().textures()[1].row(0)[0], 10);
        ring.clear_slot(&mut backend, 0).unwrap();
        assert_eq!(ring.slot(0).unwrap().textures()[1].row(0)[0], 128);
    }

    #[test]
    fn test_reset_and_uninit() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        ring.get_image(ImageSource::Auto, false).unwrap();
        ring.reset();
        assert_eq!(ring.slot(1).unwrap().flags(), ImageFlags::empty());

        ring.flip_page(Some(2));
        ring.uninit(&mut backend);
        assert_eq!(ring.active_count(), 0);
        assert_eq!(ring.render_index(), 0);
        assert_eq!(backend.texture_count(), 0);
        assert_eq!(backend.memory_usage(), 0);
    }

    #[test]
    fn test_render_index_handle_tracks_flips() {
        let mut backend = MemoryBackend::new();
        let mut ring = ring(&mut backend, BufferCount::Triple);
        let handle = ring.render_index_handle();
        ring.flip_page(Some(2));
        assert_eq!(handle.load(Ordering::Acquire), 2);
        ring.flip_page(None);
        assert_eq!(handle.load(Ordering::Acquire), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Get(bool),
        Release(usize),
        Flip(Option<usize>),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Get),
            (0usize..3).prop_map(Op::Release),
            proptest::option::of(0usize..4).prop_map(Op::Flip),
        ]
    }

    proptest! {
        #[test]
        fn prop_writer_never_gets_displayed_slot(ops in proptest::collection::vec(op(), 1..40)) {
            let mut backend = MemoryBackend::new();
            let mut ring = ring(&mut backend, BufferCount::Triple);
            for op in ops {
                match op {
                    Op::Get(readonly) => {
                        let render = ring.render_index();
                        if let Ok(image) = ring.get_image(ImageSource::Auto, readonly) {
                            prop_assert_ne!(image.index, render);
                        }
                    }
                    Op::Release(i) => {
                        let _ = ring.release_image(&mut backend, i, false);
                    }
                    Op::Flip(source) => {
                        ring.flip_page(source);
                    }
                }
                prop_assert!(ring.render_index() < ring.active_count());
                let displayed = (0..3)
                    .filter(|&i| ring.slot_state(i) == Some(SlotState::RenderTarget))
                    .count();
                prop_assert!(displayed <= 1);
            }
        }
    }
}
