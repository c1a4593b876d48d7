use nalgebra::Vector3;

use crate::{BodySet, ForceEvaluator, Result, SimulationParameters};

/// Kick-drift-kick leapfrog integrator.
///
/// One step:
/// - `v_(n+1/2) = v_n + a_n dt/2`
/// - `x_(n+1) = x_n + v_(n+1/2) dt`
/// - `v_(n+1) = v_(n+1/2) + a_(n+1) dt/2`
///
/// The scheme is symplectic and time-reversible; forces are evaluated twice per step.
/// Positions are not bounded in any way.
#[derive(Clone, Debug, Default)]
pub struct Leapfrog {
    forces: Vec<Vector3<f64>>,
    saved_positions: Vec<Vector3<f64>>,
    saved_velocities: Vec<Vector3<f64>>,
}

impl Leapfrog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `bodies` by `params.dt`, using `evaluator` for the forces.
    ///
    /// On any error the bodies are left as they were before the step. A failed
    /// evaluation after the drift, for example a position that overflowed to
    /// infinity, restores the saved positions and velocities.
    pub fn step(
        &mut self,
        bodies: &mut BodySet,
        evaluator: &mut impl ForceEvaluator,
        params: &SimulationParameters,
    ) -> Result<()> {
        params.validate()?;
        if bodies.is_empty() {
            return Ok(());
        }

        let dt = params.dt;
        let half_dt = 0.5 * dt;
        self.forces.resize(bodies.len(), Vector3::zeros());

        evaluator.calculate_forces(bodies, &mut self.forces, params)?;

        self.saved_positions.clear();
        self.saved_positions.extend_from_slice(bodies.positions());
        self.saved_velocities.clear();
        self.saved_velocities.extend_from_slice(bodies.velocities());

        kick(bodies, &self.forces, half_dt);
        drift(bodies, dt);

        if let Err(err) = evaluator.calculate_forces(bodies, &mut self.forces, params) {
            bodies.positions_mut().copy_from_slice(&self.saved_positions);
            bodies.velocities_mut().copy_from_slice(&self.saved_velocities);
            return Err(err);
        }
        kick(bodies, &self.forces, half_dt);

        Ok(())
    }
}

/// `v += F / m * dt`
fn kick(bodies: &mut BodySet, forces: &[Vector3<f64>], dt: f64) {
    let (masses, _, velocities) = bodies.split_mut();
    for ((v, f), &m) in velocities.iter_mut().zip(forces).zip(masses) {
        *v += f * (dt / m);
    }
}

/// `x += v * dt`
fn drift(bodies: &mut BodySet, dt: f64) {
    let (_, positions, velocities) = bodies.split_mut();
    for (x, v) in positions.iter_mut().zip(velocities.iter()) {
        *x += *v * dt;
    }
}
