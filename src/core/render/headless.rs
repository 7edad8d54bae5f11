//=========================================================================
// Headless Backend
//=========================================================================
//
// GraphicsBackend that records draw calls instead of rasterizing.
// Used by the demo binary on machines without a GPU path and by tests to
// assert what stages and eye-catches composited.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Affine2;
use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::{
    Color, DesignSize, DrawContext, GraphicsBackend, HostHandle, ImageId, Rect, RenderError,
    SurfaceSize,
};

//=== DrawOp ==============================================================

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        transform: Affine2,
        color: Color,
    },
    Image {
        image: ImageId,
        dest: Rect,
        transform: Affine2,
        opacity: f32,
    },
}

//=== HeadlessBackend =====================================================

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    host: Option<HostHandle>,
    surface: Option<SurfaceSize>,
    design: DesignSize,
    ops: Vec<DrawOp>,
    frames_presented: u64,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface_size(&self) -> Option<SurfaceSize> {
        self.surface
    }

    pub fn host(&self) -> Option<HostHandle> {
        self.host
    }

    /// Draw calls recorded since the last `begin_frame`.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl DrawContext for HeadlessBackend {
    fn design_size(&self) -> DesignSize {
        self.design
    }

    fn fill_rect(&mut self, rect: Rect, transform: Affine2, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, transform, color });
    }

    fn draw_image(&mut self, image: ImageId, dest: Rect, transform: Affine2, opacity: f32) {
        self.ops.push(DrawOp::Image {
            image,
            dest,
            transform,
            opacity,
        });
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_surface(
        &mut self,
        host: HostHandle,
        size: SurfaceSize,
        design: DesignSize,
    ) -> Result<(), RenderError> {
        if size.is_empty() {
            return Err(RenderError::SurfaceCreation(format!(
                "empty client area {}x{}",
                size.width, size.height
            )));
        }

        debug!(target: "render", "Headless surface created for {:?} at {}x{}", host, size.width, size.height);
        self.host = Some(host);
        self.surface = Some(size);
        self.design = design;
        Ok(())
    }

    fn resize_surface(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
        match self.surface.as_mut() {
            Some(surface) => {
                *surface = size;
                debug!(target: "render", "Headless surface resized to {}x{}", size.width, size.height);
                Ok(())
            }
            None => Err(RenderError::NoSurface),
        }
    }

    fn destroy_surface(&mut self) {
        if self.surface.take().is_some() {
            debug!(target: "render", "Headless surface destroyed");
        }
        self.ops.clear();
    }

    fn begin_frame(&mut self) -> &mut dyn DrawContext {
        self.ops.clear();
        self
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if self.surface.is_none() {
            return Err(RenderError::NoSurface);
        }

        self.frames_presented += 1;
        trace!(target: "render", "Presented frame {} ({} ops)", self.frames_presented, self.ops.len());
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
