use nalgebra::Vector3;

use crate::{BodySet, Result};

/// A source of initial conditions.
///
/// The core only consumes the resulting [`BodySet`]; how bodies are sampled
/// is up to the implementor.
pub trait BodyCreator {
    fn create_body(&mut self) -> (f64, Vector3<f64>, Vector3<f64>);

    fn create_bodies(&mut self, n: usize) -> Result<BodySet> {
        BodySet::from_rows((0..n).map(|_| self.create_body()))
    }
}

#[cfg(feature = "randomization")]
pub use random::*;

#[cfg(feature = "randomization")]
mod random {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rand_distr::{Distribution, Uniform};

    use super::*;
    use crate::Error;

    /// Sample every mass and every coordinate independently from a distribution.
    pub struct DistrBodyCreator<R, MD, PD, VD>
    where
        R: Rng,
        MD: Distribution<f64>,
        PD: Distribution<f64>,
        VD: Distribution<f64>,
    {
        rng: R,
        mass_distr: MD,
        position_distr: PD,
        velocity_distr: VD,
    }

    impl<R, MD, PD, VD> DistrBodyCreator<R, MD, PD, VD>
    where
        R: Rng,
        MD: Distribution<f64>,
        PD: Distribution<f64>,
        VD: Distribution<f64>,
    {
        pub fn new(mass_distr: MD, position_distr: PD, velocity_distr: VD, rng: R) -> Self {
            Self {
                rng,
                mass_distr,
                position_distr,
                velocity_distr,
            }
        }
    }

    impl<R, MD, PD, VD> BodyCreator for DistrBodyCreator<R, MD, PD, VD>
    where
        R: Rng,
        MD: Distribution<f64>,
        PD: Distribution<f64>,
        VD: Distribution<f64>,
    {
        fn create_body(&mut self) -> (f64, Vector3<f64>, Vector3<f64>) {
            let rng = &mut self.rng;

            let m = self.mass_distr.sample(rng);
            let pos = Vector3::new(
                self.position_distr.sample(rng),
                self.position_distr.sample(rng),
                self.position_distr.sample(rng),
            );
            let vel = Vector3::new(
                self.velocity_distr.sample(rng),
                self.velocity_distr.sample(rng),
                self.velocity_distr.sample(rng),
            );

            (m, pos, vel)
        }
    }

    /// `n` bodies spread uniformly over the cube `[-half_width, half_width]³`,
    /// with masses in `[0.5, 1.5)` and small random velocities.
    ///
    /// The same seed always produces the same set.
    /// Fails with [`Error::InvalidHalfWidth`] unless `half_width` is positive and finite.
    pub fn random_cube(n: usize, half_width: f64, seed: u64) -> Result<BodySet> {
        if !(half_width > 0.) || !half_width.is_finite() {
            return Err(Error::InvalidHalfWidth(half_width));
        }

        let mut creator = DistrBodyCreator::new(
            Uniform::new(0.5, 1.5),
            Uniform::new(-half_width, half_width),
            Uniform::new(-0.1, 0.1),
            StdRng::seed_from_u64(seed),
        );
        creator.create_bodies(n)
    }

}
