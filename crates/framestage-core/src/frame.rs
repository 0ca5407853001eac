//! CPU-side plane storage for YUV 4:2:0 frames and OSD bitmaps.
//!
//! Every texture backend stages pixels in a `FramePlane` while a slot is
//! locked and uploads it when the slot is released.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Which plane of a slot a texture holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneKind {
    /// Full resolution luma
    Luma,
    /// Half resolution Cb
    ChromaU,
    /// Half resolution Cr
    ChromaV,
    /// OSD alpha mask
    Alpha,
}

impl PlaneKind {
    /// Planes making up a YUV 4:2:0 video slot, in upload order.
    pub const YUV420: [PlaneKind; 3] = [PlaneKind::Luma, PlaneKind::ChromaU, PlaneKind::ChromaV];

    /// Planes making up an OSD slot.
    pub const OSD: [PlaneKind; 2] = [PlaneKind::Luma, PlaneKind::Alpha];

    /// Size of this plane for a frame of the given dimensions.
    pub fn dimensions(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::Luma | Self::Alpha => (width, height),
            Self::ChromaU | Self::ChromaV => (width / 2, height / 2),
        }
    }

    /// Value a freshly cleared plane holds (black, transparent).
    pub fn clear_value(self) -> u8 {
        match self {
            Self::ChromaU | Self::ChromaV => crate::limits::CHROMA_NEUTRAL,
            Self::Luma | Self::Alpha => 0,
        }
    }
}

/// YUV quantization range signalled by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum YuvRange {
    /// 16-235 luma, 16-240 chroma
    #[default]
    Limited,
    /// 0-255
    Full,
}

/// YUV to RGB matrix signalled by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum YuvMatrix {
    #[default]
    Bt601,
    Bt709,
    Smpte240m,
    Ebu,
}

/// Colorimetry of a configured stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct YuvColorimetry {
    pub range: YuvRange,
    pub matrix: YuvMatrix,
}

impl YuvColorimetry {
    /// Configure flag: full range YUV.
    pub const FLAG_FULL_RANGE: u32 = 0x01;
    /// Configure flag mask selecting the matrix.
    pub const FLAG_MATRIX_MASK: u32 = 0x1e;
    pub const FLAG_MATRIX_BT709: u32 = 0x02;
    pub const FLAG_MATRIX_BT601: u32 = 0x04;
    pub const FLAG_MATRIX_SMPTE240M: u32 = 0x06;
    pub const FLAG_MATRIX_EBU: u32 = 0x08;

    /// Decode the colorimetry bits of a `configure` flag word.
    ///
    /// Unknown matrix values fall back to BT.601.
    pub fn from_flags(flags: u32) -> Self {
        let range = if flags & Self::FLAG_FULL_RANGE != 0 {
            YuvRange::Full
        } else {
            YuvRange::Limited
        };
        let matrix = match flags & Self::FLAG_MATRIX_MASK {
            Self::FLAG_MATRIX_BT709 => YuvMatrix::Bt709,
            Self::FLAG_MATRIX_SMPTE240M => YuvMatrix::Smpte240m,
            Self::FLAG_MATRIX_EBU => YuvMatrix::Ebu,
            _ => YuvMatrix::Bt601,
        };
        Self { range, matrix }
    }
}

/// A plane of 8-bit samples with stride information.
#[derive(Debug, Clone)]
pub struct FramePlane {
    /// Raw sample data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub stride: usize,
    /// Width in samples
    pub width: u32,
    /// Height in rows
    pub height: u32,
}

impl FramePlane {
    /// Create a zeroed plane with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        // Align stride to 64 bytes for SIMD and GPU compatibility
        let stride = (width as usize + 63) & !63;
        let data = vec![0u8; stride * height as usize];
        Self {
            data,
            stride,
            width,
            height,
        }
    }

    /// Create a plane sized for `kind` of a `width x height` frame.
    pub fn for_kind(kind: PlaneKind, width: u32, height: u32) -> Self {
        let (w, h) = kind.dimensions(width, height);
        let mut plane = Self::new(w, h);
        plane.fill(kind.clear_value());
        plane
    }

    /// Get a row of sample data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize]
    }

    /// Get a mutable row of sample data.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.width as usize]
    }

    /// Set every sample, padding included.
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Copy `rows` rows of `row_len` bytes from `src` (with `src_stride`)
    /// into this plane at `(x, y)`. Rows and columns outside the plane are
    /// clipped.
    pub fn copy_from(&mut self, src: &[u8], src_stride: usize, x: u32, y: u32, row_len: usize, rows: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let row_len = row_len.min((self.width - x) as usize);
        let rows = rows.min((self.height - y) as usize);
        for r in 0..rows {
            let s = r * src_stride;
            if s + row_len > src.len() {
                break;
            }
            let d = (y as usize + r) * self.stride + x as usize;
            self.data[d..d + row_len].copy_from_slice(&src[s..s + row_len]);
        }
    }

    /// Total memory usage in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }
}

/// Planes of one slot, up to three.
pub type PlaneSet = SmallVec<[FramePlane; 3]>;

/// Allocate the planes for `kinds` at the given frame size, pre-cleared.
pub fn alloc_planes(kinds: &[PlaneKind], width: u32, height: u32) -> PlaneSet {
    kinds
        .iter()
        .map(|&k| FramePlane::for_kind(k, width, height))
        .collect()
}
