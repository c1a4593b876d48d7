use thiserror::Error;

/// Errors reported by the simulation core.
///
/// Configuration problems are reported as soon as they are seen
/// and are never silently clamped.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("body {index} has non-positive mass {mass}")]
    NonPositiveMass { index: usize, mass: f64 },

    #[error(
        "body arrays differ in length: {masses} masses, {positions} positions, {velocities} velocities"
    )]
    LengthMismatch {
        masses: usize,
        positions: usize,
        velocities: usize,
    },

    #[error("gravitational constant must be finite, got {0}")]
    InvalidGravitationalConstant(f64),

    #[error("softening must be non-negative, got {0}")]
    NegativeSoftening(f64),

    #[error("time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),

    #[error("opening angle must be non-negative, got {0}")]
    NegativeTheta(f64),

    /// Raised while building the octree; the tree cannot place a body whose
    /// coordinates are NaN or infinite.
    #[error("body {index} has a non-finite position")]
    NonFinitePosition { index: usize },

    #[error("half width of the sampling region must be positive and finite, got {0}")]
    InvalidHalfWidth(f64),

    #[error("output buffer has length {actual}, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
