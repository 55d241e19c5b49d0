//! Frame timing.
//!
//! One [`FrameClock`] per driven session; `tick()` once per fired frame
//! callback produces the [`FrameTime`] handed to render hooks and the
//! camera controller.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
