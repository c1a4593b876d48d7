#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Physical and numerical parameters of a run.
///
/// The value is immutable for the duration of a run and is passed explicitly
/// to every force evaluation, integration step and diagnostic.
///
/// With the `serde` feature it reads the option names `G`, `softening`, `dt`,
/// `theta` and `useApproximate`. Missing fields take their defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SimulationParameters {
    /// Gravitational constant.
    #[cfg_attr(feature = "serde", serde(rename = "G"))]
    pub g: f64,
    /// Softening length ε; `ε²` is added to every squared distance.
    pub softening: f64,
    /// Time step Δt.
    pub dt: f64,
    /// Barnes-Hut opening angle θ.
    pub theta: f64,
    /// Use the Barnes-Hut approximation instead of direct summation.
    pub use_approximate: bool,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            g: 1.,
            softening: 0.01,
            dt: 0.001,
            theta: 0.5,
            use_approximate: true,
        }
    }
}

impl SimulationParameters {
    #[must_use]
    pub fn new(g: f64, softening: f64, dt: f64, theta: f64) -> Self {
        Self {
            g,
            softening,
            dt,
            theta,
            use_approximate: true,
        }
    }

    #[must_use]
    pub fn with_g(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    #[must_use]
    pub fn with_softening(mut self, softening: f64) -> Self {
        self.softening = softening;
        self
    }

    #[must_use]
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    #[must_use]
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    /// Select the force strategy: Barnes-Hut (`true`) or direct summation.
    #[must_use]
    pub fn approximate(mut self, use_approximate: bool) -> Self {
        self.use_approximate = use_approximate;
        self
    }

    /// Squared softening length, the term actually added to `r²`.
    #[must_use]
    pub fn softening_squared(&self) -> f64 {
        self.softening * self.softening
    }

    /// Check every parameter, failing on the first invalid one.
    pub fn validate(&self) -> Result<()> {
        if !self.g.is_finite() {
            return Err(Error::InvalidGravitationalConstant(self.g));
        }
        if !(self.softening >= 0.) || !self.softening.is_finite() {
            return Err(Error::NegativeSoftening(self.softening));
        }
        if !(self.dt > 0.) || !self.dt.is_finite() {
            return Err(Error::NonPositiveTimeStep(self.dt));
        }
        if !(self.theta >= 0.) || !self.theta.is_finite() {
            return Err(Error::NegativeTheta(self.theta));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(SimulationParameters::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_invalid_values() {
        let params = SimulationParameters::default();

        assert_eq!(
            params.with_dt(0.).validate(),
            Err(Error::NonPositiveTimeStep(0.))
        );
        assert_eq!(
            params.with_dt(-1e-3).validate(),
            Err(Error::NonPositiveTimeStep(-1e-3))
        );
        assert_eq!(
            params.with_softening(-0.1).validate(),
            Err(Error::NegativeSoftening(-0.1))
        );
        assert_eq!(
            params.with_theta(-0.5).validate(),
            Err(Error::NegativeTheta(-0.5))
        );
        assert!(matches!(
            params.with_g(f64::NAN).validate(),
            Err(Error::InvalidGravitationalConstant(_))
        ));
        assert!(matches!(
            params.with_dt(f64::NAN).validate(),
            Err(Error::NonPositiveTimeStep(_))
        ));
    }

    #[test]
    fn zero_softening_and_theta_are_allowed() {
        let params = SimulationParameters::default()
            .with_softening(0.)
            .with_theta(0.);
        assert_eq!(params.validate(), Ok(()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_option_names() {
        let yaml = "G: 2.0\nsoftening: 0.05\ndt: 0.01\ntheta: 0.7\nuseApproximate: false\n";
        let params: SimulationParameters = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(params, SimulationParameters::new(2., 0.05, 0.01, 0.7).approximate(false));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_fills_defaults() {
        let params: SimulationParameters = serde_yaml::from_str("theta: 0.8\n").unwrap();

        assert_eq!(params, SimulationParameters::default().with_theta(0.8));
    }
}
