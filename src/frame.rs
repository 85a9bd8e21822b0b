//! Frame and coordinate types.
//!
//! - `Frame`: one captured pixel buffer. Borrowed by the pipeline for one inference cycle.
//! - `NormalizedRect`: detector-space rectangle in [0,1]², origin bottom-left.
//! - `RegionRect`: raster-space rectangle in pixels, origin top-left.
//!
//! The only place the two coordinate systems meet is `NormalizedRect::to_region`, which
//! flips the vertical axis and clips to the frame bounds.

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use std::time::Instant;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// Pixel layout of a frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel, R G B.
    Rgb8,
    /// 4 bytes per pixel, B G R A (camera native on most mobile sensors).
    Bgra8,
    /// 1 byte per pixel, luminance.
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Bgra8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One captured image buffer.
///
/// There is no `Clone`: a frame is moved from the source into exactly one cycle and
/// dropped when that cycle resolves.
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Monotonic capture instant.
    pub captured_at: Instant,
    /// Sequence number assigned by the source.
    pub sequence: u64,
}

impl Frame {
    /// Build a frame, checking the buffer length against the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(format.bytes_per_pixel()))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected_len {
            return Err(anyhow!(
                "expected {} bytes for {}x{} {:?}, received {}",
                expected_len,
                width,
                height,
                format,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            captured_at: Instant::now(),
            sequence: 0,
        })
    }

    pub fn from_rgb_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            format: PixelFormat::Rgb8,
            captured_at: Instant::now(),
            sequence: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Convert to an owned RGB image. Inference backends consume RGB.
    pub fn to_rgb_image(&self) -> RgbImage {
        self.crop_rgb(0, 0, self.width, self.height)
    }

    /// Copy a pixel rectangle out as RGB. The rectangle must lie inside the frame
    /// (see `RegionRect::pixel_bounds`).
    pub fn crop_rgb(&self, x0: u32, y0: u32, width: u32, height: u32) -> RgbImage {
        let bpp = self.format.bytes_per_pixel();
        RgbImage::from_fn(width, height, |dx, dy| {
            let (x, y) = (x0 + dx, y0 + dy);
            let idx = (y as usize * self.width as usize + x as usize) * bpp;
            match self.format {
                PixelFormat::Rgb8 => Rgb([self.data[idx], self.data[idx + 1], self.data[idx + 2]]),
                PixelFormat::Bgra8 => Rgb([self.data[idx + 2], self.data[idx + 1], self.data[idx]]),
                PixelFormat::Gray8 => Rgb([self.data[idx]; 3]),
            }
        })
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Pixel content is deliberately omitted.
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Rectangles
// ----------------------------------------------------------------------------

/// Rectangle in normalized frame coordinates, origin bottom-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl NormalizedRect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn min_x(&self) -> f32 {
        self.x
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    pub fn mid_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Map into raster pixels of a `width`×`height` frame and clip to its bounds.
    ///
    /// Returns `None` when the clipped rectangle is empty or any coordinate is not finite.
    pub fn to_region(&self, width: u32, height: u32) -> Option<RegionRect> {
        if !self.is_finite() {
            return None;
        }
        let w = width as f64;
        let h = height as f64;
        let raw = RegionRect {
            x: self.min_x() as f64 * w,
            y: (1.0 - self.max_y() as f64) * h,
            width: self.w as f64 * w,
            height: self.h as f64 * h,
        };
        raw.intersection(&RegionRect {
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
        })
    }
}

/// Rectangle in raster pixel coordinates, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RegionRect {
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Intersection with `other`, or `None` if they do not overlap.
    pub fn intersection(&self, other: &RegionRect) -> Option<RegionRect> {
        // f64::max/min swallow NaN, so a non-finite side would otherwise span the other rect.
        if !self.is_finite() || !other.is_finite() {
            return None;
        }
        // Negative extents are normalized first so a flipped box still intersects correctly.
        let a = self.standardized();
        let b = other.standardized();
        let x0 = a.x.max(b.x);
        let y0 = a.y.max(b.y);
        let x1 = a.max_x().min(b.max_x());
        let y1 = a.max_y().min(b.max_y());
        let rect = RegionRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        };
        if rect.is_empty() || !rect.width.is_finite() || !rect.height.is_finite() {
            None
        } else {
            Some(rect)
        }
    }

    fn standardized(&self) -> RegionRect {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        RegionRect {
            x,
            y,
            width,
            height,
        }
    }

    /// Whole-pixel crop bounds `(x, y, width, height)` covering this region.
    ///
    /// Fractional edges are expanded outwards, then clamped to `frame_width`×`frame_height`.
    pub fn pixel_bounds(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.floor().max(0.0) as u32;
        let y0 = self.y.floor().max(0.0) as u32;
        let x1 = (self.max_x().ceil() as u32).min(frame_width);
        let y1 = (self.max_y().ceil() as u32).min(frame_height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
