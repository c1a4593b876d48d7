//! Gravitational N-body core for galaxy simulations.
//!
//! Forces come from either direct summation or a Barnes-Hut octree,
//! time integration uses a kick-drift-kick leapfrog, and [`diagnostics`]
//! tracks the conserved quantities used to validate a run.
//!
//! ```
//! use galaxy_nbody::{BodySet, Simulation, SimulationParameters};
//! use nalgebra::Vector3;
//!
//! let bodies = BodySet::new(
//!     vec![1., 1.],
//!     vec![Vector3::new(-0.5, 0., 0.), Vector3::new(0.5, 0., 0.)],
//!     vec![Vector3::new(0., -0.5f64.sqrt(), 0.), Vector3::new(0., 0.5f64.sqrt(), 0.)],
//! )
//! .unwrap();
//! let params = SimulationParameters::default().with_softening(0.);
//!
//! let mut simulation = Simulation::new(bodies, params).unwrap();
//! simulation.simulate(100, 0).unwrap();
//! assert!(simulation.energy_drift() < 1e-5);
//! ```

pub mod barnes_hut;
pub mod bodies;
pub mod config;
pub mod diagnostics;
pub mod direct_summation;
pub mod error;
pub mod gravity;
pub mod integrator;
pub mod octree;

use std::thread;

use nalgebra::Vector3;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub use barnes_hut::BarnesHut;
pub use bodies::*;
pub use config::SimulationParameters;
pub use diagnostics::{Diagnostics, PotentialEstimate};
pub use direct_summation::DirectSummation;
pub use error::{Error, Result};
pub use integrator::Leapfrog;
pub use octree::Octree;

/// How forces are distributed over threads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    SingleThreaded,
    /// Scoped threads, each computing a contiguous block of bodies.
    Multithreaded { num_threads: usize },
    /// Rayon's global pool, splitting the bodies.
    #[cfg(feature = "rayon")]
    RayonIter,
}

/// A strategy that computes the gravitational force on every body.
pub trait ForceEvaluator {
    /// Overwrite `forces[i]` with the total force on body `i`.
    ///
    /// The result is a force, not an acceleration; divide by the body's mass
    /// to obtain the latter.
    fn calculate_forces(
        &mut self,
        bodies: &BodySet,
        forces: &mut [Vector3<f64>],
        params: &SimulationParameters,
    ) -> Result<()>;
}

/// The force strategy selected by [`SimulationParameters::use_approximate`].
#[derive(Clone, Debug)]
pub enum Solver {
    Direct(DirectSummation),
    BarnesHut(BarnesHut),
}

impl Solver {
    #[must_use]
    pub fn from_parameters(params: &SimulationParameters) -> Self {
        if params.use_approximate {
            Self::BarnesHut(BarnesHut::new())
        } else {
            Self::Direct(DirectSummation::new())
        }
    }

    #[must_use]
    pub fn with_execution(self, execution: Execution) -> Self {
        match self {
            Self::Direct(ds) => Self::Direct(ds.with_execution(execution)),
            Self::BarnesHut(bh) => Self::BarnesHut(bh.with_execution(execution)),
        }
    }
}

impl ForceEvaluator for Solver {
    fn calculate_forces(
        &mut self,
        bodies: &BodySet,
        forces: &mut [Vector3<f64>],
        params: &SimulationParameters,
    ) -> Result<()> {
        match self {
            Self::Direct(ds) => ds.calculate_forces(bodies, forces, params),
            Self::BarnesHut(bh) => bh.calculate_forces(bodies, forces, params),
        }
    }
}

/// Fill `forces[i] = force_on(i)` for every body, split according to `execution`.
///
/// Every worker writes only to its own slots of `forces`.
pub(crate) fn evaluate_per_body<F>(forces: &mut [Vector3<f64>], execution: Execution, force_on: F)
where
    F: Fn(usize) -> Vector3<f64> + Sync,
{
    match execution {
        Execution::SingleThreaded => {
            forces.iter_mut().enumerate().for_each(|(i, f)| {
                *f = force_on(i);
            });
        }
        Execution::Multithreaded { num_threads } => {
            let chunk_size = forces.len().div_ceil(num_threads.max(1)).max(1);
            let force_on = &force_on;

            thread::scope(|s| {
                for (c, chunk) in forces.chunks_mut(chunk_size).enumerate() {
                    s.spawn(move || {
                        for (k, f) in chunk.iter_mut().enumerate() {
                            *f = force_on(c * chunk_size + k);
                        }
                    });
                }
            });
        }
        #[cfg(feature = "rayon")]
        Execution::RayonIter => {
            forces.par_iter_mut().enumerate().for_each(|(i, f)| {
                *f = force_on(i);
            });
        }
    }
}

pub(crate) fn check_buffer(bodies: &BodySet, forces: &[Vector3<f64>]) -> Result<()> {
    if forces.len() != bodies.len() {
        return Err(Error::BufferLength {
            expected: bodies.len(),
            actual: forces.len(),
        });
    }
    Ok(())
}

/// Progress of a run, as returned by [`Simulation::simulate`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Number of steps taken so far.
    pub step: usize,
    pub diagnostics: Diagnostics,
    /// `|E(t) - E(0)| / |E(0)|`.
    pub energy_drift: f64,
    /// Drift exceeded [`Simulation::drift_warning`].
    pub diverging: bool,
}

/// Drives a [`BodySet`] forward in time.
///
/// Owns the bodies, the force strategy and the integrator's buffers,
/// and remembers the initial energy to report drift.
#[derive(Clone, Debug)]
pub struct Simulation {
    bodies: BodySet,
    params: SimulationParameters,
    solver: Solver,
    integrator: Leapfrog,
    potential: PotentialEstimate,
    initial_energy: f64,
    drift_warning: f64,
    steps: usize,
}

impl Simulation {
    /// Default threshold above which energy drift is reported as diverging.
    pub const DEFAULT_DRIFT_WARNING: f64 = 1e-3;

    /// Validate the parameters and record the initial energy, summing the
    /// potential energy exactly.
    pub fn new(bodies: BodySet, params: SimulationParameters) -> Result<Self> {
        Self::with_potential(bodies, params, PotentialEstimate::Exact)
    }

    /// Like [`Simulation::new`], but every energy, including the initial one,
    /// is computed with `potential`.
    ///
    /// With [`PotentialEstimate::Sampled`] the exact `O(N²)` sum is never evaluated.
    pub fn with_potential(
        bodies: BodySet,
        params: SimulationParameters,
        potential: PotentialEstimate,
    ) -> Result<Self> {
        params.validate()?;

        let initial_energy = diagnostics::snapshot(&bodies, &params, potential).total_energy;
        log::debug!(
            "initialized {} bodies, E0 = {initial_energy} ({potential:?}), {}",
            bodies.len(),
            if params.use_approximate {
                "barnes-hut"
            } else {
                "direct summation"
            }
        );

        Ok(Self {
            solver: Solver::from_parameters(&params),
            bodies,
            params,
            integrator: Leapfrog::new(),
            potential,
            initial_energy,
            drift_warning: Self::DEFAULT_DRIFT_WARNING,
            steps: 0,
        })
    }

    /// Calculate the forces with multiple threads.
    #[must_use]
    pub fn multithreaded(mut self, num_threads: usize) -> Self {
        self.solver = self
            .solver
            .with_execution(Execution::Multithreaded { num_threads });
        self
    }

    /// Use Rayon to calculate the forces with multiple threads.
    #[cfg(feature = "rayon")]
    #[must_use]
    pub fn rayon_iter(mut self) -> Self {
        self.solver = self.solver.with_execution(Execution::RayonIter);
        self
    }

    /// Set the drift above which reports are flagged as diverging.
    #[must_use]
    pub fn drift_warning(mut self, threshold: f64) -> Self {
        self.drift_warning = threshold;
        self
    }

    /// Advance the bodies by one time step.
    pub fn step(&mut self) -> Result<()> {
        self.integrator
            .step(&mut self.bodies, &mut self.solver, &self.params)?;
        self.steps += 1;
        log::trace!("step {} done", self.steps);
        Ok(())
    }

    /// Advance by `num_steps` steps.
    ///
    /// Every `report_every` steps, and after the last one, the diagnostics are
    /// collected, logged and returned. A `report_every` of 0 only reports at the end.
    pub fn simulate(&mut self, num_steps: usize, report_every: usize) -> Result<Vec<StepReport>> {
        let mut reports = Vec::new();

        for t in 1..=num_steps {
            self.step()?;

            let due = report_every != 0 && t % report_every == 0;
            if due || t == num_steps {
                let report = self.report();
                log::info!(
                    "step {:>6}: energy drift = {:.6e}, virial = {}",
                    report.step,
                    report.energy_drift,
                    report
                        .diagnostics
                        .virial_ratio
                        .map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
                );
                reports.push(report);
            }
        }

        Ok(reports)
    }

    /// Diagnostics and drift for the current state.
    #[must_use]
    pub fn report(&self) -> StepReport {
        let diagnostics = self.diagnostics();
        let energy_drift = diagnostics::energy_drift(self.initial_energy, diagnostics.total_energy);
        let diverging = energy_drift > self.drift_warning;
        if diverging {
            log::warn!(
                "energy drift {energy_drift:.3e} exceeds {:.1e} after {} steps, dt or theta may be too large",
                self.drift_warning,
                self.steps
            );
        }

        StepReport {
            step: self.steps,
            diagnostics,
            energy_drift,
            diverging,
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        diagnostics::snapshot(&self.bodies, &self.params, self.potential)
    }

    /// Relative change of the total energy since initialization.
    #[must_use]
    pub fn energy_drift(&self) -> f64 {
        diagnostics::energy_drift(self.initial_energy, self.diagnostics().total_energy)
    }

    #[must_use]
    pub fn initial_energy(&self) -> f64 {
        self.initial_energy
    }

    #[must_use]
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    #[must_use]
    pub fn into_bodies(self) -> BodySet {
        self.bodies
    }

    #[must_use]
    pub fn parameters(&self) -> &SimulationParameters {
        &self.params
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Start a run from externally generated bodies.
pub fn initialize(bodies: BodySet, params: SimulationParameters) -> Result<Simulation> {
    Simulation::new(bodies, params)
}

/// Advance `bodies` by one time step, choosing the force strategy from `params`.
///
/// For repeated steps prefer [`Simulation`] or a long-lived [`Leapfrog`] and
/// [`Solver`], which keep their buffers between steps.
pub fn step(bodies: &mut BodySet, params: &SimulationParameters) -> Result<()> {
    let mut solver = Solver::from_parameters(params);
    Leapfrog::new().step(bodies, &mut solver, params)
}

/// Read-only snapshot of the conserved quantities, with the exact potential energy.
pub fn compute_diagnostics(bodies: &BodySet, params: &SimulationParameters) -> Result<Diagnostics> {
    params.validate()?;
    Ok(diagnostics::snapshot(bodies, params, PotentialEstimate::Exact))
}
