//! Perspective camera and viewport sizing.
//!
//! The camera sits on the +z axis looking at the origin, where the
//! assembled image lies in the xy plane. Resizing only touches the aspect
//! ratio and projection; the particle data is unaffected.

use glam::{Mat4, Vec2, Vec3};

use crate::error::PortraitError;

pub const FOV_Y_DEGREES: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const EYE_DISTANCE: f32 = 12.0;
/// Device pixel ratios above this are clamped when sizing the drawing buffer.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Size of the rendering surface in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Result<Self, PortraitError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(PortraitError::InvalidViewport);
        }
        let pixel_ratio = if valid(pixel_ratio) { pixel_ratio } else { 1.0 };
        Ok(Self {
            width,
            height,
            pixel_ratio,
        })
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Drawing-buffer size in device pixels, with the ratio capped at 2.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio.min(MAX_PIXEL_RATIO);
        (
            (self.width * ratio).round().max(1.0) as u32,
            (self.height * ratio).round().max(1.0) as u32,
        )
    }
}

/// Perspective camera looking down -z from `(0, 0, 12)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    viewport: Viewport,
    projection: Mat4,
    view: Mat4,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            projection: Self::perspective(viewport.aspect()),
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, EYE_DISTANCE), Vec3::ZERO, Vec3::Y),
        }
    }

    fn perspective(aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), aspect, NEAR, FAR)
    }

    /// Adopts a new surface size and recomputes the projection.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.projection = Self::perspective(viewport.aspect());
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.aspect()
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Depth of a world point in front of the camera (positive when visible).
    pub fn depth(&self, model: Mat4, point: Vec3) -> f32 {
        -(self.view * model).transform_point3(point).z
    }

    /// Projects a model-space point to CSS pixel coordinates (origin top-left).
    ///
    /// Returns `None` for points behind the near plane.
    pub fn project(&self, model: Mat4, point: Vec3) -> Option<Vec2> {
        let clip = self.projection * self.view * model * point.extend(1.0);
        if clip.w <= NEAR {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
        ))
    }
}
