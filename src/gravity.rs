use nalgebra::Vector3;

use crate::SimulationParameters;

/// Softened gravitational force exerted on a body at `position1` with mass `mass1`
/// by a (pseudo-)body at `position2` with mass `mass2`.
///
/// `F = G m1 m2 dr / (|dr|² + ε²)^(3/2)` with `dr = position2 - position1`.
///
/// Coincident positions without softening contribute no force instead of NaN.
#[inline]
pub fn force(
    position1: &Vector3<f64>,
    mass1: f64,
    position2: &Vector3<f64>,
    mass2: f64,
    params: &SimulationParameters,
) -> Vector3<f64> {
    let dr = position2 - position1;
    let r2 = dr.norm_squared() + params.softening_squared();
    if r2 == 0. {
        return Vector3::zeros();
    }
    // m1 m2 first, so swapping the bodies gives the exact negation
    dr * (params.g * (mass1 * mass2) / (r2 * r2.sqrt()))
}

/// Softened pair potential `-G m1 m2 / sqrt(|dr|² + ε²)`.
#[inline]
pub fn potential(
    position1: &Vector3<f64>,
    mass1: f64,
    position2: &Vector3<f64>,
    mass2: f64,
    params: &SimulationParameters,
) -> f64 {
    let r2 = (position2 - position1).norm_squared() + params.softening_squared();
    if r2 == 0. {
        return 0.;
    }
    -params.g * (mass1 * mass2) / r2.sqrt()
}
