//! Particle simulation, on the CPU and as a compute kernel.
//!
//! Both variants integrate `p += v * dt` and reflect off the `[-1, 1]` box.

mod gpu;
mod particles;

pub use gpu::{GpuParticles, PARTICLE_WORKGROUP_SIZE};
pub use particles::{integrate_axis, ParticleSystem, BOUND};
