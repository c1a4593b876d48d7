use nalgebra::Vector3;

use crate::{
    check_buffer, evaluate_per_body, gravity,
    octree::{NodeId, NodeKind, Octree},
    BodySet, Execution, ForceEvaluator, Result, SimulationParameters,
};

/// Barnes-Hut approximation with an octree rebuilt on every evaluation.
///
/// The octree's arena is kept between evaluations and only cleared on rebuild.
/// The tree is built sequentially; the traversal only reads it, so bodies can be
/// distributed over threads.
#[derive(Clone, Debug, Default)]
pub struct BarnesHut {
    execution: Execution,
    octree: Octree,
}

impl BarnesHut {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Calculate the forces with multiple threads.
    ///
    /// All threads walk the shared tree, splitting the bodies.
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

    /// The tree from the last evaluation.
    #[must_use]
    pub fn octree(&self) -> &Octree {
        &self.octree
    }
}

impl ForceEvaluator for BarnesHut {
    fn calculate_forces(
        &mut self,
        bodies: &BodySet,
        forces: &mut [Vector3<f64>],
        params: &SimulationParameters,
    ) -> Result<()> {
        check_buffer(bodies, forces)?;
        self.octree.rebuild(bodies)?;

        let Some(root) = self.octree.root() else {
            return Ok(());
        };
        let octree = &self.octree;
        evaluate_per_body(forces, self.execution, |i| {
            force_on_body(octree, root, i, bodies, params)
        });

        Ok(())
    }
}

/// Force on body `body` from the subtree at `id`.
///
/// An internal node is treated as a single mass at its center of mass when
/// `size / r < θ`, with `r` the softened distance to that center of mass.
/// Otherwise its children are visited. A leaf never acts on the bodies it holds.
pub fn force_on_body(
    octree: &Octree,
    id: NodeId,
    body: usize,
    bodies: &BodySet,
    params: &SimulationParameters,
) -> Vector3<f64> {
    let node = octree.node(id);
    let position = &bodies.positions()[body];
    let mass = bodies.masses()[body];

    if node.total_mass() == 0. {
        return Vector3::zeros();
    }

    match node.kind() {
        NodeKind::Empty => Vector3::zeros(),
        NodeKind::Leaf { first, .. } => {
            let mut f = Vector3::zeros();
            for other in octree.leaf_bodies(first) {
                if other == body {
                    continue;
                }
                f += gravity::force(
                    position,
                    mass,
                    &bodies.positions()[other],
                    bodies.masses()[other],
                    params,
                );
            }
            f
        }
        NodeKind::Internal { children } => {
            let r = ((node.center_of_mass() - position).norm_squared()
                + params.softening_squared())
            .sqrt();

            if node.size() / r < params.theta {
                // far enough away, use the aggregate
                gravity::force(
                    position,
                    mass,
                    node.center_of_mass(),
                    node.total_mass(),
                    params,
                )
            } else {
                let mut f = Vector3::zeros();
                for &child in children.iter() {
                    f += force_on_body(octree, child, body, bodies, params);
                }
                f
            }
        }
    }
}
