//=========================================================================
// Render Abstractions
//=========================================================================
//
// Backend-agnostic drawing surface used by stages and eye-catches.
//
// Architecture:
// ```text
//   GraphicsBackend (render thread only)
//     ├─ create_surface / resize_surface / destroy_surface
//     ├─ begin_frame() → &mut dyn DrawContext
//     └─ present()     → Err(SurfaceLost) triggers recovery
// ```
//
// All layout maths happens in design space (`DesignSize`, 1920×1080 by
// default); the backend scales to the physical client area.
//
//=========================================================================

//=== Module Declarations =================================================

mod headless;

//=== Public API ==========================================================

pub use headless::{DrawOp, HeadlessBackend};

//=== External Dependencies ===============================================

use glam::Affine2;
use thiserror::Error;
use winit::dpi::PhysicalSize;
use winit::window::WindowId;

//=== Host & Sizes ========================================================

/// Opaque identifier of the host window a surface is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostHandle(pub u64);

impl From<WindowId> for HostHandle {
    fn from(id: WindowId) -> Self {
        Self(u64::from(id))
    }
}

/// Physical client-area size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (minimized or collapsed window).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<PhysicalSize<u32>> for SurfaceSize {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// Fixed logical canvas all stages lay out against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignSize {
    pub width: f32,
    pub height: f32,
}

impl DesignSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for DesignSize {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

//=== Primitives ==========================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }
}

/// Axis-aligned rectangle in design space (before transform).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle of the given size centred on the origin.
    pub fn centered(width: f32, height: f32) -> Self {
        Self::new(-width / 2.0, -height / 2.0, width, height)
    }
}

/// Name of an image resource owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub &'static str);

//=== DrawContext =========================================================

/// Per-frame drawing target handed to stages and eye-catches.
pub trait DrawContext {
    fn design_size(&self) -> DesignSize;

    fn fill_rect(&mut self, rect: Rect, transform: Affine2, color: Color);

    fn draw_image(&mut self, image: ImageId, dest: Rect, transform: Affine2, opacity: f32);
}

//=== GraphicsBackend =====================================================

/// Device and swap-chain owner. Lives on the render thread only.
pub trait GraphicsBackend: Send {
    /// Creates the device surface for `host` at `size`.
    fn create_surface(
        &mut self,
        host: HostHandle,
        size: SurfaceSize,
        design: DesignSize,
    ) -> Result<(), RenderError>;

    /// Recreates the swap chain at `size`. The surface must exist.
    fn resize_surface(&mut self, size: SurfaceSize) -> Result<(), RenderError>;

    /// Drops the surface. No-op when none exists.
    fn destroy_surface(&mut self);

    /// Starts a frame and returns the drawing target.
    fn begin_frame(&mut self) -> &mut dyn DrawContext;

    /// Presents the frame.
    fn present(&mut self) -> Result<(), RenderError>;
}

//=== RenderError =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Device or swap chain was lost; recoverable by recreating the surface.
    #[error("surface lost")]
    SurfaceLost,

    #[error("no surface has been created")]
    NoSurface,

    #[error("graphics device error: {0}")]
    Device(String),
}

//=========================================================================
// Unit Tests
//=========================================================================
