use nalgebra::Vector3;

use crate::{
    check_buffer, evaluate_per_body, gravity, BodySet, Execution, ForceEvaluator, Result,
    SimulationParameters,
};

/// Exact `O(N²)` summation over all pairs of bodies.
///
/// Single-threaded, each unordered pair is evaluated once and applied to both
/// bodies with opposite signs. The parallel executions sum whole rows instead,
/// so every worker writes only its own bodies.
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectSummation {
    execution: Execution,
}

impl DirectSummation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            execution: Execution::SingleThreaded,
        }
    }

    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Calculate the forces with multiple threads.
    #[must_use]
    pub fn multithreaded(self, num_threads: usize) -> Self {
        self.with_execution(Execution::Multithreaded { num_threads })
    }

    /// Use Rayon to calculate the forces with multiple threads.
    #[cfg(feature = "rayon")]
    #[must_use]
    pub fn rayon_iter(self) -> Self {
        self.with_execution(Execution::RayonIter)
    }
}

impl ForceEvaluator for DirectSummation {
    fn calculate_forces(
        &mut self,
        bodies: &BodySet,
        forces: &mut [Vector3<f64>],
        params: &SimulationParameters,
    ) -> Result<()> {
        check_buffer(bodies, forces)?;
        let masses = bodies.masses();
        let positions = bodies.positions();

        match self.execution {
            Execution::SingleThreaded => {
                forces.fill(Vector3::zeros());
                for i in 0..bodies.len() {
                    for j in i + 1..bodies.len() {
                        let f = gravity::force(
                            &positions[i],
                            masses[i],
                            &positions[j],
                            masses[j],
                            params,
                        );
                        forces[i] += f;
                        forces[j] -= f;
                    }
                }
            }
            execution => evaluate_per_body(forces, execution, |i| {
                let mut f = Vector3::zeros();
                for (j, (&m2, p2)) in masses.iter().zip(positions).enumerate() {
                    if i == j {
                        continue;
                    }
                    f += gravity::force(&positions[i], masses[i], p2, m2, params);
                }
                f
            }),
        }

        Ok(())
    }
}
