use std::ops::{Deref, DerefMut};

use nalgebra::Vector3;

use crate::{BodySet, Error, Result};

/// Factor by which the root cube exceeds the bounding box of all bodies.
pub const ROOT_MARGIN: f64 = 1.1;

/// Smallest edge length of the root cube, used when all bodies coincide.
pub const MIN_ROOT_SIZE: f64 = 1e-9;

/// Deepest level at which a leaf is still subdivided.
///
/// Bodies that would need to go deeper share the leaf they arrive at.
pub const MAX_DEPTH: usize = 48;

/// Index of a node in the octree arena.
pub type NodeId = usize;

/// Sentinel for the end of a leaf's body chain.
const NO_BODY: usize = usize::MAX;

/// The eight children of an internal node, as arena indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subnodes([NodeId; 8]);

impl Deref for Subnodes {
    type Target = [NodeId; 8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Subnodes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Contains no body.
    Empty,
    /// Holds `count` bodies chained from `first`.
    ///
    /// `count` is 1 except when coincident bodies were aggregated.
    Leaf { first: usize, count: usize },
    /// Holds exactly eight children and no body of its own.
    Internal { children: Subnodes },
}

/// An axis-aligned cube together with the aggregate of the bodies inside it.
#[derive(Clone, Debug)]
pub struct Node {
    center: Vector3<f64>,
    size: f64,
    total_mass: f64,
    center_of_mass: Vector3<f64>,
    kind: NodeKind,
}

impl Node {
    fn new(center: Vector3<f64>, size: f64) -> Self {
        Self {
            center,
            size,
            total_mass: 0.,
            center_of_mass: Vector3::zeros(),
            kind: NodeKind::Empty,
        }
    }

    #[must_use]
    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }

    /// Edge length of the cube.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.total_mass
    }

    #[must_use]
    pub fn center_of_mass(&self) -> &Vector3<f64> {
        &self.center_of_mass
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Fold one more body into the running mass and center of mass.
    fn accumulate(&mut self, mass: f64, position: &Vector3<f64>) {
        let old_total = self.total_mass;
        let new_total = old_total + mass;
        self.center_of_mass = (self.center_of_mass * old_total + position * mass) / new_total;
        self.total_mass = new_total;
    }
}

/// Barnes-Hut octree over a [`BodySet`].
///
/// All nodes live in one arena. [`Octree::rebuild`] clears the arena and keeps its
/// allocation, so a tree reused across steps does not allocate per node.
/// The tree is never updated incrementally; any change of the bodies requires a rebuild.
#[derive(Clone, Debug, Default)]
pub struct Octree {
    nodes: Vec<Node>,
    next: Vec<usize>,
    depth: usize,
    coincident_merges: usize,
}

impl Octree {
    /// Build a fresh octree from the current positions.
    pub fn build(bodies: &BodySet) -> Result<Self> {
        let mut octree = Self::default();
        octree.rebuild(bodies)?;
        Ok(octree)
    }

    /// Discard the current tree and build it again from `bodies`,
    /// reusing the arena allocation.
    ///
    /// Fails with [`Error::NonFinitePosition`] if a body cannot be placed.
    pub fn rebuild(&mut self, bodies: &BodySet) -> Result<()> {
        self.nodes.clear();
        self.next.clear();
        self.next.resize(bodies.len(), NO_BODY);
        self.depth = 0;
        self.coincident_merges = 0;

        if let Some(index) = bodies
            .positions()
            .iter()
            .position(|p| !p.iter().all(|x| x.is_finite()))
        {
            return Err(Error::NonFinitePosition { index });
        }

        let Some((center, size)) = get_center_and_size(bodies.positions()) else {
            return Ok(());
        };
        self.nodes.push(Node::new(center, size));

        for body in 0..bodies.len() {
            self.insert(0, body, 0, bodies);
        }

        log::debug!(
            "built octree: {} bodies, {} nodes, depth {}",
            bodies.len(),
            self.nodes.len(),
            self.depth
        );
        if self.coincident_merges > 0 {
            log::warn!(
                "{} bodies were merged into shared leaves (coincident positions or depth limit {})",
                self.coincident_merges,
                MAX_DEPTH
            );
        }

        Ok(())
    }

    /// The root node, or `None` if the tree was built from an empty body set.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest node, the root having depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of bodies that share a leaf with another body.
    #[must_use]
    pub fn coincident_merges(&self) -> usize {
        self.coincident_merges
    }

    /// Iterate over the body indices held by a leaf.
    pub fn leaf_bodies(&self, first: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(first), |&body| {
            let next = self.next[body];
            (next != NO_BODY).then_some(next)
        })
    }

    fn insert(&mut self, id: NodeId, body: usize, depth: usize, bodies: &BodySet) {
        self.depth = self.depth.max(depth);
        let mass = bodies.masses()[body];
        let position = &bodies.positions()[body];

        match self.nodes[id].kind {
            NodeKind::Empty => {
                let node = &mut self.nodes[id];
                node.kind = NodeKind::Leaf {
                    first: body,
                    count: 1,
                };
                node.total_mass = mass;
                node.center_of_mass = *position;
            }

            NodeKind::Leaf { first, count } => {
                // Identical positions would subdivide forever, share the leaf instead
                if depth >= MAX_DEPTH || bodies.positions()[first] == *position {
                    self.next[body] = first;
                    let node = &mut self.nodes[id];
                    node.kind = NodeKind::Leaf {
                        first: body,
                        count: count + 1,
                    };
                    node.accumulate(mass, position);
                    self.coincident_merges += 1;
                    return;
                }

                let children = self.subdivide(id);

                // Move the existing leaf, with its aggregate, one level down
                let previous = choose_subnode(&self.nodes[id].center, &bodies.positions()[first]);
                let (total_mass, center_of_mass) =
                    (self.nodes[id].total_mass, self.nodes[id].center_of_mass);
                let child = &mut self.nodes[children[previous]];
                child.kind = NodeKind::Leaf { first, count };
                child.total_mass = total_mass;
                child.center_of_mass = center_of_mass;
                self.depth = self.depth.max(depth + 1);

                let octant = choose_subnode(&self.nodes[id].center, position);
                self.insert(children[octant], body, depth + 1, bodies);
                self.nodes[id].accumulate(mass, position);
            }

            NodeKind::Internal { children } => {
                let octant = choose_subnode(&self.nodes[id].center, position);
                self.insert(children[octant], body, depth + 1, bodies);
                self.nodes[id].accumulate(mass, position);
            }
        }
    }

    /// Turn a node into an internal node with eight empty children.
    fn subdivide(&mut self, id: NodeId) -> Subnodes {
        let center = self.nodes[id].center;
        let size = self.nodes[id].size;

        let first_child = self.nodes.len();
        let mut children = Subnodes([0; 8]);
        for (octant, child) in children.iter_mut().enumerate() {
            *child = first_child + octant;
            self.nodes.push(Node::new(
                center_from_subnode(size, center, octant),
                size / 2.,
            ));
        }

        self.nodes[id].kind = NodeKind::Internal { children };
        children
    }
}

/// Root cube for a set of positions: the midpoint of the bounding box and its
/// largest extent times [`ROOT_MARGIN`], never smaller than [`MIN_ROOT_SIZE`].
fn get_center_and_size(positions: &[Vector3<f64>]) -> Option<(Vector3<f64>, f64)> {
    let first = positions.first()?;
    let (v_min, v_max) = positions
        .iter()
        .fold((*first, *first), |(v_min, v_max), p| {
            (v_min.inf(p), v_max.sup(p))
        });

    let size = ((v_max - v_min).max() * ROOT_MARGIN).max(MIN_ROOT_SIZE);
    let center = (v_min + v_max) / 2.;

    Some((center, size))
}

/// Octant of `position` relative to `center`: bit 0 for x, bit 1 for y, bit 2 for z,
/// set when the coordinate is greater than the center's.
fn choose_subnode(center: &Vector3<f64>, position: &Vector3<f64>) -> usize {
    let mut octant = 0;
    if position.x > center.x {
        octant |= 1;
    }
    if position.y > center.y {
        octant |= 2;
    }
    if position.z > center.z {
        octant |= 4;
    }
    octant
}

fn center_from_subnode(size: f64, center: Vector3<f64>, octant: usize) -> Vector3<f64> {
    let step_size = size / 4.;
    let offset = |bit: usize| {
        if octant & bit == 0 {
            -step_size
        } else {
            step_size
        }
    };
    center + Vector3::new(offset(1), offset(2), offset(4))
}
