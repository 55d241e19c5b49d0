use crate::host::ContainerId;
use crate::scene::Color;

/// Reference to the container element a session renders into.
#[derive(Debug, Clone)]
pub enum ContainerRef {
    /// Resolved through the host's query mechanism at construction.
    Selector(String),
    /// A live element handle, used as-is.
    Element(ContainerId),
}

impl From<&str> for ContainerRef {
    fn from(selector: &str) -> Self {
        ContainerRef::Selector(selector.to_string())
    }
}

impl From<String> for ContainerRef {
    fn from(selector: String) -> Self {
        ContainerRef::Selector(selector)
    }
}

impl From<ContainerId> for ContainerRef {
    fn from(id: ContainerId) -> Self {
        ContainerRef::Element(id)
    }
}

/// Requested session parameters.
///
/// Plain data; immutable once a session has been constructed from it.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where to render. Must resolve to exactly one live element.
    pub container: ContainerRef,
    /// Explicit drawing width in logical pixels. Falls back to the
    /// container's live layout size.
    pub width: Option<u32>,
    /// Explicit drawing height in logical pixels.
    pub height: Option<u32>,
    /// Scene background color. `None` leaves the default clear color.
    pub background: Option<Color>,
    /// Add the coordinate-axes visual aid to the scene.
    pub axes_helper: bool,
    /// Attach the interactive orbit controller to the camera.
    pub camera_controls: bool,
}

impl SessionConfig {
    /// Configuration with defaults: no explicit size, no background, axes
    /// helper and camera controls enabled.
    pub fn new(container: impl Into<ContainerRef>) -> Self {
        Self {
            container: container.into(),
            width: None,
            height: None,
            background: None,
            axes_helper: true,
            camera_controls: true,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn without_axes_helper(mut self) -> Self {
        self.axes_helper = false;
        self
    }

    pub fn without_camera_controls(mut self) -> Self {
        self.camera_controls = false;
        self
    }
}
