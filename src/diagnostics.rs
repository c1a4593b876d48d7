//! Conserved quantities and equilibrium measures of a [`BodySet`].
//!
//! Everything here only reads the bodies. Calling the same function twice on an
//! unchanged body set gives bit-identical results.

use nalgebra::Vector3;

use crate::{gravity, BodySet, SimulationParameters};

/// How the `O(N²)` potential energy sum is evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PotentialEstimate {
    /// Sum over every pair.
    #[default]
    Exact,
    /// Sum over the pairs of `sample_size` bodies taken at an even stride
    /// through the index range, scaled up by the ratio of pair counts
    /// `N(N-1) / (k(k-1))`.
    ///
    /// This assumes the sample is representative of the whole set. For a
    /// strongly clustered or ordered body set the estimate is biased; its error
    /// is of the order of the pair potential's spread divided by `k`.
    /// Falls back to [`PotentialEstimate::Exact`] when `sample_size >= N`.
    Sampled { sample_size: usize },
}

/// A snapshot of the global state of a body set.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub kinetic_energy: f64,
    pub potential_energy: f64,
    pub total_energy: f64,
    pub angular_momentum: Vector3<f64>,
    pub center_of_mass: Vector3<f64>,
    /// `2 KE / |PE|`, `None` if the potential energy is zero.
    pub virial_ratio: Option<f64>,
    /// Factor applied to the sampled potential energy, 1 when exact.
    pub potential_scale: f64,
}

/// Compute all diagnostics at once.
#[must_use]
pub fn snapshot(
    bodies: &BodySet,
    params: &SimulationParameters,
    estimate: PotentialEstimate,
) -> Diagnostics {
    let kinetic_energy = kinetic_energy(bodies);
    let (potential_energy, potential_scale) = match estimate {
        PotentialEstimate::Exact => (potential_energy(bodies, params), 1.),
        PotentialEstimate::Sampled { sample_size } => {
            sampled_potential_energy(bodies, params, sample_size)
        }
    };

    Diagnostics {
        kinetic_energy,
        potential_energy,
        total_energy: kinetic_energy + potential_energy,
        angular_momentum: angular_momentum(bodies),
        center_of_mass: center_of_mass(bodies),
        virial_ratio: virial_ratio(kinetic_energy, potential_energy),
        potential_scale,
    }
}

/// `KE = 1/2 Σ m |v|²`
#[must_use]
pub fn kinetic_energy(bodies: &BodySet) -> f64 {
    0.5 * bodies
        .iter()
        .map(|(m, _, v)| m * v.norm_squared())
        .sum::<f64>()
}

/// `PE = -Σ_(i<j) G m_i m_j / sqrt(|x_j - x_i|² + ε²)`, summed exactly.
#[must_use]
pub fn potential_energy(bodies: &BodySet, params: &SimulationParameters) -> f64 {
    pair_potential(bodies, params, &(0..bodies.len()).collect::<Vec<_>>())
}

/// Potential energy estimated from at most `sample_size` bodies.
///
/// Returns the estimate and the scale factor that was applied to the sampled sum.
#[must_use]
pub fn sampled_potential_energy(
    bodies: &BodySet,
    params: &SimulationParameters,
    sample_size: usize,
) -> (f64, f64) {
    let n = bodies.len();
    if sample_size >= n || sample_size < 2 {
        return (potential_energy(bodies, params), 1.);
    }

    let stride = n as f64 / sample_size as f64;
    let sample: Vec<usize> = (0..sample_size)
        .map(|s| ((s as f64 * stride) as usize).min(n - 1))
        .collect();

    let scale = (n as f64 * (n - 1) as f64) / (sample_size as f64 * (sample_size - 1) as f64);
    (pair_potential(bodies, params, &sample) * scale, scale)
}

fn pair_potential(bodies: &BodySet, params: &SimulationParameters, indices: &[usize]) -> f64 {
    let masses = bodies.masses();
    let positions = bodies.positions();

    let mut potential = 0.;
    for (k, &i) in indices.iter().enumerate() {
        for &j in &indices[k + 1..] {
            potential +=
                gravity::potential(&positions[i], masses[i], &positions[j], masses[j], params);
        }
    }
    potential
}

/// `L = Σ m (x × v)`
#[must_use]
pub fn angular_momentum(bodies: &BodySet) -> Vector3<f64> {
    bodies
        .iter()
        .fold(Vector3::zeros(), |l, (m, x, v)| l + x.cross(v) * m)
}

/// Mass-weighted mean position, the origin for an empty set.
#[must_use]
pub fn center_of_mass(bodies: &BodySet) -> Vector3<f64> {
    let total_mass = bodies.total_mass();
    if total_mass == 0. {
        return Vector3::zeros();
    }
    bodies
        .iter()
        .fold(Vector3::zeros(), |c, (m, x, _)| c + x * m)
        / total_mass
}

/// `2 KE / |PE|`, close to 1 for a system in dynamical equilibrium.
#[must_use]
pub fn virial_ratio(kinetic_energy: f64, potential_energy: f64) -> Option<f64> {
    if potential_energy == 0. {
        None
    } else {
        Some(2. * kinetic_energy / potential_energy.abs())
    }
}

/// Relative energy drift `|E - E0| / |E0|`.
///
/// Falls back to the absolute difference when `E0` is zero.
#[must_use]
pub fn energy_drift(initial_energy: f64, energy: f64) -> f64 {
    let delta = (energy - initial_energy).abs();
    if initial_energy == 0. {
        delta
    } else {
        delta / initial_energy.abs()
    }
}
