use rand::Rng;

use crate::error::GalleryError;

/// Lower and upper bound of the simulation domain on both axes.
pub const BOUND: f32 = 1.0;

/// Advances one axis by `dt` and reflects it off `[-BOUND, BOUND]`.
///
/// The position moves with the velocity it had at the start of the step. When
/// it reaches or passes a bound while moving outward, the velocity is negated
/// and the position is clamped onto the bound. A particle already heading back
/// inside is never flipped a second time.
#[inline]
pub fn integrate_axis(position: &mut f32, velocity: &mut f32, dt: f32) {
    *position += *velocity * dt;

    let outward = (*position >= BOUND && *velocity > 0.0) || (*position <= -BOUND && *velocity < 0.0);
    if outward {
        *velocity = -*velocity;
    }
    *position = position.clamp(-BOUND, BOUND);
}

/// Fixed-size particle pool updated on the CPU.
///
/// Storage is split per attribute so `positions` and `colors` can be uploaded
/// as-is into the shape renderer's centers and colors buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    positions: Vec<[f32; 2]>,
    velocities: Vec<[f32; 2]>,
    colors: Vec<[f32; 4]>,
}

impl ParticleSystem {
    /// Builds a pool from explicit attributes, one entry per particle in each.
    pub fn from_parts(
        positions: Vec<[f32; 2]>,
        velocities: Vec<[f32; 2]>,
        colors: Vec<[f32; 4]>,
    ) -> Result<Self, GalleryError> {
        if positions.len() != velocities.len() || positions.len() != colors.len() {
            return Err(GalleryError::ParticleLayout {
                positions: positions.len(),
                velocities: velocities.len(),
                colors: colors.len(),
            });
        }
        Ok(Self {
            positions,
            velocities,
            colors,
        })
    }

    /// Random pool: positions in `[-1, 1]²`, velocities in `[-0.5, 0.5]²`,
    /// light opaque colors (rgb in `[0.5, 1]`).
    pub fn random<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for _ in 0..count {
            positions.push([rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0)]);
            velocities.push([rng.gen_range(-0.5..=0.5), rng.gen_range(-0.5..=0.5)]);
            colors.push([
                rng.gen_range(0.5..=1.0),
                rng.gen_range(0.5..=1.0),
                rng.gen_range(0.5..=1.0),
                1.0,
            ]);
        }

        Self {
            positions,
            velocities,
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    pub fn velocities(&self) -> &[[f32; 2]] {
        &self.velocities
    }

    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    /// Advances every particle by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        for (p, v) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            let [px, py] = p;
            let [vx, vy] = v;
            integrate_axis(px, vx, dt);
            integrate_axis(py, vy, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single(p: [f32; 2], v: [f32; 2]) -> ParticleSystem {
        ParticleSystem::from_parts(vec![p], vec![v], vec![[1.0; 4]]).unwrap()
    }

    #[test]
    fn interior_step_is_plain_integration() {
        let mut sys = single([0.1, -0.2], [0.5, 0.25]);
        sys.step(0.016);
        assert_eq!(sys.positions()[0], [0.1 + 0.5 * 0.016, -0.2 + 0.25 * 0.016]);
        assert_eq!(sys.velocities()[0], [0.5, 0.25]);
    }

    #[test]
    fn crossing_flips_only_that_axis() {
        let mut sys = single([0.995, 0.0], [0.5, 0.3]);
        sys.step(0.016);
        assert_eq!(sys.velocities()[0], [-0.5, 0.3]);
        assert_eq!(sys.positions()[0][0], 1.0);
        assert_eq!(sys.positions()[0][1], 0.3 * 0.016);
    }

    #[test]
    fn crossing_uses_pre_flip_velocity_for_the_step() {
        let mut sys = single([0.0, -0.999], [0.0, -0.5]);
        sys.step(0.005);
        // -0.999 + -0.5 * 0.005 = -1.0015: past the bound, so clamped and flipped.
        assert_eq!(sys.positions()[0][1], -1.0);
        assert_eq!(sys.velocities()[0][1], 0.5);

        // The next step moves inward with the flipped velocity.
        sys.step(0.005);
        assert_eq!(sys.positions()[0][1], -1.0 + 0.5 * 0.005);
        assert_eq!(sys.velocities()[0][1], 0.5);
    }

    #[test]
    fn mismatched_attributes_are_rejected() {
        let err = ParticleSystem::from_parts(vec![[0.0; 2]; 2], vec![[0.0; 2]], vec![[1.0; 4]; 2])
            .unwrap_err();
        assert!(matches!(
            err,
            GalleryError::ParticleLayout {
                positions: 2,
                velocities: 1,
                colors: 2
            }
        ));
    }

    #[test]
    fn particle_exactly_on_bound_reflects_once() {
        for bound in [BOUND, -BOUND] {
            let outward = bound.signum() * 0.4;
            let mut sys = single([bound, 0.0], [outward, 0.0]);

            sys.step(0.0);
            assert_eq!(sys.velocities()[0][0], -outward, "one reflection at the bound");

            sys.step(0.0);
            assert_eq!(sys.velocities()[0][0], -outward, "no second reflection");

            sys.step(0.016);
            assert!(sys.positions()[0][0].abs() < BOUND);
            assert_eq!(sys.velocities()[0][0], -outward);
        }
    }

    #[test]
    fn inward_particle_on_bound_is_not_flipped() {
        let mut sys = single([1.0, -1.0], [-0.2, 0.2]);
        sys.step(0.0);
        assert_eq!(sys.velocities()[0], [-0.2, 0.2]);
    }

    #[test]
    fn random_pool_respects_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let sys = ParticleSystem::random(512, &mut rng);
        assert_eq!(sys.len(), 512);
        for ((p, v), c) in sys.positions().iter().zip(sys.velocities()).zip(sys.colors()) {
            assert!(p.iter().all(|x| (-1.0..=1.0).contains(x)));
            assert!(v.iter().all(|x| (-0.5..=0.5).contains(x)));
            assert!(c[..3].iter().all(|x| (0.5..=1.0).contains(x)));
            assert_eq!(c[3], 1.0);
        }
    }

    #[test]
    fn pool_stays_bounded_over_long_runs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut sys = ParticleSystem::random(256, &mut rng);

        for _ in 0..1000 {
            sys.step(0.016);
            assert!(sys
                .positions()
                .iter()
                .all(|p| p.iter().all(|x| (-1.0..=1.0).contains(x))));
        }
    }

    #[test]
    fn empty_pool_steps() {
        let mut sys = ParticleSystem::from_parts(vec![], vec![], vec![]).unwrap();
        sys.step(0.016);
        assert!(sys.is_empty());
    }
}
