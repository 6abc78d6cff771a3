//! Design-space to device-pixel scaling
//!
//! Each game simulates in CSS pixels of a canvas whose aspect ratio is fixed by
//! its design size. The scale is recomputed only when the host reports a resize.

use serde::{Deserialize, Serialize};

/// Padding kept around the canvas when not fullscreen (px per side)
pub const WINDOW_PADDING: f32 = 8.0;
/// Smallest available area considered when fitting
pub const MIN_AVAILABLE_WIDTH: f32 = 320.0;
pub const MIN_AVAILABLE_HEIGHT: f32 = 480.0;

/// Fixed logical canvas size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignSize {
    pub width: f32,
    pub height: f32,
}

impl DesignSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Resize / fullscreen notification from the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportNotice {
    pub available_width: f32,
    pub available_height: f32,
    pub pixel_ratio: f32,
    pub fullscreen_active: bool,
}

impl ViewportNotice {
    fn is_well_formed(&self) -> bool {
        self.available_width.is_finite()
            && self.available_height.is_finite()
            && self.pixel_ratio.is_finite()
            && self.available_width > 0.0
            && self.available_height > 0.0
    }
}

/// Result of fitting a design size into the available area
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub design: DesignSize,
    pub scale: f32,
    /// Canvas size in CSS pixels (the simulation's coordinate space)
    pub width_px: f32,
    pub height_px: f32,
    pub pixel_ratio: f32,
    /// Backing buffer size in device pixels
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl Viewport {
    /// Identity layout: one design unit per CSS pixel
    pub fn unscaled(design: DesignSize) -> Self {
        Self::with_scale(design, 1.0, 1.0)
    }

    fn with_scale(design: DesignSize, scale: f32, pixel_ratio: f32) -> Self {
        let width_px = design.width * scale;
        let height_px = design.height * scale;
        Self {
            design,
            scale,
            width_px,
            height_px,
            pixel_ratio,
            buffer_width: (width_px * pixel_ratio).round() as u32,
            buffer_height: (height_px * pixel_ratio).round() as u32,
        }
    }

    /// Fit `design` into the area described by `notice`
    ///
    /// Returns `None` for malformed notices so the caller keeps its old layout.
    pub fn fit(design: DesignSize, notice: &ViewportNotice) -> Option<Self> {
        if !notice.is_well_formed() {
            log::warn!("Ignoring malformed viewport notice: {:?}", notice);
            return None;
        }
        let pad = if notice.fullscreen_active {
            0.0
        } else {
            WINDOW_PADDING
        };
        let avail_w = (notice.available_width - pad * 2.0).max(MIN_AVAILABLE_WIDTH);
        let avail_h = (notice.available_height - pad * 2.0).max(MIN_AVAILABLE_HEIGHT);
        let scale = (avail_w / design.width).min(avail_h / design.height);
        let pixel_ratio = notice.pixel_ratio.max(1.0);
        Some(Self::with_scale(design, scale, pixel_ratio))
    }

    /// Convert a design-unit distance to CSS pixels
    #[inline]
    pub fn px(&self, design_units: f32) -> f32 {
        design_units * self.scale
    }

    /// Whether a CSS-pixel point lies on the canvas
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x.is_finite()
            && y.is_finite()
            && (0.0..=self.width_px).contains(&x)
            && (0.0..=self.height_px).contains(&y)
    }
}
