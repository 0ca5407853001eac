//! Double-buffered subtitle and OSD overlay.
//!
//! Bitmaps arrive as separate luma and alpha planes authored 720 samples
//! wide. They are drawn into the slot after the displayed one and shown
//! from the next page flip on.

use crate::backend::TextureBackend;
use framestage_core::frame::{alloc_planes, PlaneSet};
use framestage_core::limits::{NUM_OSD_BUFFERS, OSD_LOGICAL_WIDTH};
use framestage_core::{FrameStageError, PixelRect, PlaneKind, Rect, Result, Vec2};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, error, info};

/// Where on screen an overlay bitmap lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsdPlacement {
    /// View window the video is drawn in
    pub view: Rect,
    /// Pixel ratio of the output resolution
    pub pixel_ratio: f32,
    pub overscan: PixelRect,
    pub subtitle_line: i32,
    pub source_frame_ratio: f32,
    pub source_width: u32,
    pub source_height: u32,
}

impl OsdPlacement {
    /// Screen rectangle for a `width x height` bitmap.
    ///
    /// Bitmaps share the pixel aspect of the movie and are scaled to the
    /// view width, centered, with their bottom on the subtitle line.
    pub fn place(&self, width: u32, height: u32) -> Rect {
        let view = self.view;
        let pixel_aspect = if self.source_width > 0 && self.source_height > 0 {
            self.source_frame_ratio * self.source_height as f32 / self.source_width as f32
        } else {
            1.0
        };
        let xscale = view.width / OSD_LOGICAL_WIDTH;
        let scale = Vec2::new(xscale, xscale * self.pixel_ratio / pixel_aspect);
        let size = Vec2::new(width as f32, height as f32) * scale;

        let overscan_height = self.overscan.height();
        let rel_bottom = if overscan_height > 0 {
            (self.subtitle_line - self.overscan.top) as f32 / overscan_height as f32
        } else {
            1.0
        };
        let left = view.x + (view.width - size.x) / 2.0;
        let bottom = view.y + view.height * rel_bottom;

        Rect::from_min_size(Vec2::new(left, bottom - size.y), size)
    }
}

/// Overlay ready to be composited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OsdQuad {
    pub slot: usize,
    /// Area of the slot textures holding the bitmap
    pub source: PixelRect,
    /// Screen rectangle
    pub dest: Rect,
}

/// Luma and alpha textures of one overlay slot.
#[derive(Debug)]
pub struct OsdSlot<T> {
    textures: SmallVec<[T; 2]>,
    planes: PlaneSet,
}

impl<T> OsdSlot<T> {
    pub fn textures(&self) -> &[T] {
        &self.textures
    }
}

#[derive(Debug)]
pub struct OsdBufferRing<T> {
    slots: [Option<OsdSlot<T>>; NUM_OSD_BUFFERS],
    /// Texture height per slot, 0 when the slot must be (re)created
    heights: [u32; NUM_OSD_BUFFERS],
    /// Texture width shared by both slots
    width: u32,
    render_index: usize,
    rendered: bool,
    rect: Rect,
    drawn_width: u32,
    drawn_height: u32,
}

impl<T> Default for OsdBufferRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OsdBufferRing<T> {
    pub fn new() -> Self {
        Self {
            slots: [None, None],
            heights: [0; NUM_OSD_BUFFERS],
            width: 0,
            render_index: 0,
            rendered: false,
            rect: Rect::default(),
            drawn_width: 0,
            drawn_height: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn slot_height(&self, index: usize) -> u32 {
        self.heights.get(index).copied().unwrap_or(0)
    }

    pub fn slot(&self, index: usize) -> Option<&OsdSlot<T>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn render_index(&self) -> usize {
        self.render_index
    }

    /// Size of the last drawn bitmap, zero once a flip passed without one.
    pub fn drawn_size(&self) -> (u32, u32) {
        (self.drawn_width, self.drawn_height)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Seed the slot width and force both slots to be recreated.
    pub fn setup_subtitles(&mut self, width: u32) {
        self.width = width;
        self.heights = [0; NUM_OSD_BUFFERS];
        debug!(width, "Subtitle width set");
    }

    /// Draw an overlay bitmap into the back slot.
    ///
    /// `src` holds luma and `src_alpha` the matching alpha, both with
    /// `stride` bytes per row. Zero sizes are skipped.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_alpha<B>(
        &mut self,
        backend: &mut B,
        placement: &OsdPlacement,
        width: u32,
        height: u32,
        src: &[u8],
        src_alpha: &[u8],
        stride: usize,
    ) -> Result<()>
    where
        B: TextureBackend<Texture = T>,
    {
        if width == 0 || height == 0 {
            info!("Zero dimensions specified to draw_alpha, skipping");
            return Ok(());
        }

        let mut height = height;
        if width > self.width {
            for index in 0..NUM_OSD_BUFFERS {
                self.delete_slot(backend, index);
            }
            self.width = width;
        } else {
            let max_height = placement.overscan.height().max(0) as u32;
            height = height.min(max_height);
            if height == 0 {
                return Ok(());
            }
        }

        let rect = placement.place(width, height);
        let target = (self.render_index + 1) % NUM_OSD_BUFFERS;

        if height > self.heights[target] {
            self.delete_slot(backend, target);
            let slot = create_slot(backend, self.width, height).map_err(|e| {
                error!(slot = target, error = %e, "Could not create OSD textures");
                e
            })?;
            self.slots[target] = Some(slot);
            self.heights[target] = height;
            debug!(slot = target, width = self.width, height, "Created OSD textures");
        }

        let slot = self.slots[target]
            .as_mut()
            .ok_or(FrameStageError::NoSuchBuffer(target))?;
        for plane in slot.planes.iter_mut() {
            plane.fill(0);
        }
        slot.planes[0].copy_from(src, stride, 0, 0, width as usize, height as usize);
        slot.planes[1].copy_from(src_alpha, stride, 0, 0, width as usize, height as usize);
        for (texture, plane) in slot.textures.iter_mut().zip(slot.planes.iter()) {
            backend.upload_plane(texture, plane)?;
        }

        self.rect = rect;
        self.drawn_width = width;
        self.drawn_height = height;
        self.rendered = true;
        Ok(())
    }

    /// Advance to the slot drawn since the last flip.
    pub fn flip(&mut self) {
        self.render_index = (self.render_index + 1) % NUM_OSD_BUFFERS;
        if !self.rendered {
            self.drawn_width = 0;
            self.drawn_height = 0;
        }
        self.rendered = false;
    }

    /// Overlay to composite this frame, if any.
    pub fn render_osd(&self) -> Option<OsdQuad> {
        self.slot(self.render_index)?;
        if self.drawn_width == 0 || self.drawn_height == 0 {
            return None;
        }
        Some(OsdQuad {
            slot: self.render_index,
            source: PixelRect::from_size(self.drawn_width as i32, self.drawn_height as i32),
            dest: self.rect,
        })
    }

    fn delete_slot<B>(&mut self, backend: &mut B, index: usize)
    where
        B: TextureBackend<Texture = T>,
    {
        if let Some(slot) = self.slots[index].take() {
            for texture in slot.textures {
                backend.release_texture(texture);
            }
            debug!(slot = index, "Deleted OSD textures");
        }
        self.heights[index] = 0;
    }

    /// Release both slots and forget the last bitmap.
    pub fn uninit<B>(&mut self, backend: &mut B)
    where
        B: TextureBackend<Texture = T>,
    {
        for index in 0..NUM_OSD_BUFFERS {
            self.delete_slot(backend, index);
        }
        self.width = 0;
        self.render_index = 0;
        self.rendered = false;
        self.drawn_width = 0;
        self.drawn_height = 0;
    }
}

fn create_slot<B: TextureBackend>(backend: &mut B, width: u32, height: u32) -> Result<OsdSlot<B::Texture>> {
    let mut textures = SmallVec::new();
    for kind in PlaneKind::OSD {
        match backend.create_plane_texture(width, height, kind) {
            Ok(texture) => textures.push(texture),
            Err(e) => {
                for texture in textures {
                    backend.release_texture(texture);
                }
                return Err(e);
            }
        }
    }
    Ok(OsdSlot {
        textures,
        planes: alloc_planes(&PlaneKind::OSD, width, height),
    })
}
