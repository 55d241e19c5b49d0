//! wgpu-backed drawing surface.
//!
//! [`Gpu`] owns the instance-level objects and the swapchain; [`WgpuSurface`]
//! wraps it behind the [`DrawSurface`] trait the session lifecycle consumes,
//! pairing it with the mesh renderer.

mod gpu;

pub use gpu::{DEPTH_FORMAT, Gpu, GpuFrame, GpuInit, SurfaceErrorAction};

use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::camera::PerspectiveCamera;
use crate::host::Extent;
use crate::render::MeshRenderer;
use crate::scene::Scene;
use crate::surface::DrawSurface;

/// GPU-backed drawing surface presented into a window.
pub struct WgpuSurface {
    gpu: Gpu,
    renderer: MeshRenderer,
    disposed: bool,
}

impl WgpuSurface {
    /// Creates the surface with `buffer` as the initial drawing-buffer size.
    pub async fn new(window: Arc<Window>, buffer: Extent) -> Result<Self> {
        let gpu = Gpu::new(window, buffer, GpuInit::default()).await?;
        let renderer = MeshRenderer::new();
        Ok(Self {
            gpu,
            renderer,
            disposed: false,
        })
    }
}

impl DrawSurface for WgpuSurface {
    fn buffer_size(&self) -> Extent {
        self.gpu.size()
    }

    fn resize_buffer(&mut self, size: Extent) {
        if self.disposed {
            return;
        }
        self.gpu.resize(size);
    }

    fn draw(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> Result<()> {
        if self.disposed || self.gpu.size().is_zero() {
            return Ok(());
        }
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err.clone());
                return frame_error_result(action, &err);
            }
        };
        self.renderer.render(&self.gpu, &mut frame, scene, camera);
        self.gpu.submit(frame);
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.renderer.release();
    }
}

/// Maps a failed frame acquisition to the draw outcome. Recoverable errors
/// drop the frame and let the loop carry on; out of memory is fatal.
fn frame_error_result(action: SurfaceErrorAction, err: &wgpu::SurfaceError) -> Result<()> {
    match action {
        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
            log::warn!("skipping frame after surface error: {err}");
            Ok(())
        }
        SurfaceErrorAction::Fatal => Err(anyhow::anyhow!("surface out of memory: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_surface_errors_skip_the_frame() {
        let timeout = wgpu::SurfaceError::Timeout;
        assert!(frame_error_result(SurfaceErrorAction::SkipFrame, &timeout).is_ok());
        let lost = wgpu::SurfaceError::Lost;
        assert!(frame_error_result(SurfaceErrorAction::Reconfigured, &lost).is_ok());
    }

    #[test]
    fn out_of_memory_fails_the_draw() {
        let oom = wgpu::SurfaceError::OutOfMemory;
        assert!(frame_error_result(SurfaceErrorAction::Fatal, &oom).is_err());
    }
}
