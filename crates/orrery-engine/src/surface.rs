use anyhow::Result;

use crate::camera::PerspectiveCamera;
use crate::host::Extent;
use crate::scene::Scene;

/// GPU-backed rendering context bound to a canvas element.
///
/// A surface exclusively owns its canvas and, indirectly, every GPU buffer
/// created for drawn content. Exactly one session owns a surface for its
/// lifetime; the production implementation is
/// [`crate::device::WgpuSurface`], tests substitute an in-memory stub.
pub trait DrawSurface {
    /// Current drawing-buffer size in physical pixels.
    fn buffer_size(&self) -> Extent;

    /// Resizes the drawing buffer. The displayed size is untouched: the
    /// canvas keeps filling its container and the buffer is scaled
    /// independently.
    fn resize_buffer(&mut self, size: Extent);

    /// Draws one frame of `scene` through `camera`.
    ///
    /// The scene is mutable so per-frame vertex updates can be flushed to
    /// the GPU (dirty flags cleared after upload).
    fn draw(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> Result<()>;

    /// Releases GPU resources and removes the canvas from its container.
    /// Idempotent; a disposed surface ignores further calls.
    fn dispose(&mut self);
}
