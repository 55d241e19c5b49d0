//! Gallery visualizations.
//!
//! Each view implements [`orrery_engine::session::Visualization`] and only
//! touches the scene/camera/controls handed to it through the hook contexts.

pub mod frustum;
pub mod materials;
pub mod model;
pub mod primitives;
pub mod tank;
pub mod terrain;
