//! Orrery engine crate.
//!
//! This crate owns the rendering-session lifecycle used by every
//! visualization in the gallery: acquiring a drawing surface, building the
//! scene graph and camera, driving the per-frame loop, adapting to container
//! resizes, and tearing GPU-backed resources down deterministically.
//!
//! Concrete visualizations plug in through [`session::Visualization`] and
//! only ever touch the session's accessor layer; the host platform (window,
//! frame scheduling, GPU surface creation) is injected through [`host::Host`]
//! so sessions can be driven by the winit runtime or by a test host.

pub mod camera;
pub mod config;
pub mod controls;
pub mod device;
pub mod error;
pub mod host;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod scene;
pub mod session;
pub mod surface;
pub mod time;
