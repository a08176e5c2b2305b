//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame to
//! obtain the elapsed seconds fed to the simulation.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
