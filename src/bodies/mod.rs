mod creator;

pub use creator::*;

use nalgebra::Vector3;

use crate::{Error, Result};

/// A collection of point masses.
///
/// Bodies are stored as a Struct-of-Arrays: the body with index `i` is the
/// `i`-th entry of every array. Indices are stable for the lifetime of the set,
/// bodies are never added, removed or reordered.
///
/// Masses are fixed after construction and always positive.
/// Positions and velocities may be changed in place by the integrator or the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySet {
    masses: Vec<f64>,
    positions: Vec<Vector3<f64>>,
    velocities: Vec<Vector3<f64>>,
}

impl BodySet {
    /// Create a body set from parallel arrays.
    ///
    /// Fails if the arrays differ in length or any mass is not strictly positive.
    pub fn new(
        masses: Vec<f64>,
        positions: Vec<Vector3<f64>>,
        velocities: Vec<Vector3<f64>>,
    ) -> Result<Self> {
        let len = masses.len();
        if positions.len() != len || velocities.len() != len {
            return Err(Error::LengthMismatch {
                masses: len,
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }

        if let Some((index, &mass)) = masses.iter().enumerate().find(|(_, &m)| !(m > 0.)) {
            return Err(Error::NonPositiveMass { index, mass });
        }

        Ok(Self {
            masses,
            positions,
            velocities,
        })
    }

    /// Collect `(mass, position, velocity)` rows into a body set.
    pub fn from_rows(
        rows: impl IntoIterator<Item = (f64, Vector3<f64>, Vector3<f64>)>,
    ) -> Result<Self> {
        let iter = rows.into_iter();
        let cap = iter.size_hint().0;
        let mut masses = Vec::with_capacity(cap);
        let mut positions = Vec::with_capacity(cap);
        let mut velocities = Vec::with_capacity(cap);

        for (m, p, v) in iter {
            masses.push(m);
            positions.push(p);
            velocities.push(v);
        }

        Self::new(masses, positions, velocities)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    #[must_use]
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    #[must_use]
    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    #[must_use]
    pub fn velocities(&self) -> &[Vector3<f64>] {
        &self.velocities
    }

    pub fn positions_mut(&mut self) -> &mut [Vector3<f64>] {
        &mut self.positions
    }

    pub fn velocities_mut(&mut self) -> &mut [Vector3<f64>] {
        &mut self.velocities
    }

    /// Borrow masses read-only alongside mutable positions and velocities.
    pub fn split_mut(&mut self) -> (&[f64], &mut [Vector3<f64>], &mut [Vector3<f64>]) {
        (&self.masses, &mut self.positions, &mut self.velocities)
    }

    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    /// Iterate over `(mass, position, velocity)` rows.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Vector3<f64>, &Vector3<f64>)> {
        self.masses
            .iter()
            .zip(&self.positions)
            .zip(&self.velocities)
            .map(|((&m, p), v)| (m, p, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_mass() {
        let positions = vec![Vector3::zeros(); 3];
        let velocities = vec![Vector3::zeros(); 3];

        let err = BodySet::new(vec![1., 0., 2.], positions.clone(), velocities.clone());
        assert_eq!(err, Err(Error::NonPositiveMass { index: 1, mass: 0. }));

        let err = BodySet::new(vec![1., 1., -3.], positions.clone(), velocities.clone());
        assert_eq!(err, Err(Error::NonPositiveMass { index: 2, mass: -3. }));

        let err = BodySet::new(vec![f64::NAN, 1., 1.], positions, velocities);
        assert!(matches!(err, Err(Error::NonPositiveMass { index: 0, .. })));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = BodySet::new(
            vec![1.; 2],
            vec![Vector3::zeros(); 3],
            vec![Vector3::zeros(); 2],
        );
        assert_eq!(
            err,
            Err(Error::LengthMismatch {
                masses: 2,
                positions: 3,
                velocities: 2
            })
        );
    }

    #[test]
    fn from_rows() {
        let bodies = BodySet::from_rows([
            (1., Vector3::new(1., 0., 0.), Vector3::zeros()),
            (2., Vector3::new(0., 1., 0.), Vector3::new(0., 0., 1.)),
        ])
        .unwrap();

        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies.total_mass(), 3.);
        assert_eq!(bodies.velocities()[1], Vector3::new(0., 0., 1.));
    }

    #[test]
    fn empty_set() {
        let bodies = BodySet::new(Vec::new(), Vec::new(), Vec::new()).unwrap();
        assert!(bodies.is_empty());
        assert_eq!(bodies.iter().count(), 0);
    }
}
