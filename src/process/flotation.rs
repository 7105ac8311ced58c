//! Froth flotation.
//!
//! The collection efficiency of a particle by a bubble is driven by the total
//! interaction energy `Eb = Evdw + Eedl` of the two, where
//!
//! ```text
//! Evdw = -A H1 H2 / (H1 + H2)
//! Eedl = 2 pi e0 Er Zp1 Zp2 exp(-k H) / (1 + k H)
//! ```
//!
//! and the efficiency is `1 / (1 + exp(Eb / (k(T) T)))` with the Arrhenius
//! rate constant `k(T)` in place of the Boltzmann scaling.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use crate::constants::PhysicalConstants;
use crate::driver::OptimizationResult;
use crate::{Domain, Function, Problem};

use super::cyanidation::TEMPERATURE_BOUNDS;
use super::{Process, ProcessModel, ProcessOutcome};

/// Names of the variables, in the order of the domain dimensions.
pub(crate) const VARIABLES: [&str; 9] = [
    "A",
    "H1",
    "H2",
    "Er",
    "Zp1",
    "Zp2",
    "k",
    "H",
    "temperature",
];

// (initial guess, lower bound, upper bound)
const HAMAKER: (f64, f64, f64) = (1.5e-19, 1e-19, 2e-19);
const RADIUS_1: (f64, f64, f64) = (5e-5, 1e-6, 1e-4);
const RADIUS_2: (f64, f64, f64) = (1e-4, 5e-5, 2e-4);
const PERMITTIVITY: (f64, f64, f64) = (6.0, 2.0, 10.0);
const ZETA_1: (f64, f64, f64) = (10.0, -100.0, 100.0);
const ZETA_2: (f64, f64, f64) = (10.0, -100.0, 100.0);
const DEBYE: (f64, f64, f64) = (500.0, 108.0, 1000.0);
const SEPARATION: (f64, f64, f64) = (100.0, 1.0, 1000.0);
const TEMPERATURE: (f64, f64, f64) = (
    TEMPERATURE_BOUNDS.0,
    TEMPERATURE_BOUNDS.0,
    TEMPERATURE_BOUNDS.1,
);

const SETUP: [(f64, f64, f64); 9] = [
    HAMAKER,
    RADIUS_1,
    RADIUS_2,
    PERMITTIVITY,
    ZETA_1,
    ZETA_2,
    DEBYE,
    SEPARATION,
    TEMPERATURE,
];

/// Flotation model.
#[derive(Debug, Clone)]
pub struct Flotation {
    constants: PhysicalConstants,
}

impl Flotation {
    /// Initializes the model.
    pub fn new(constants: PhysicalConstants) -> Self {
        Self { constants }
    }

    /// Total interaction energy of the particle and the bubble.
    #[allow(clippy::too_many_arguments)]
    pub fn interaction_energy(
        &self,
        hamaker: f64,
        h1: f64,
        h2: f64,
        er: f64,
        zp1: f64,
        zp2: f64,
        k: f64,
        h: f64,
    ) -> f64 {
        let evdw = -hamaker * (h1 * h2) / (h1 + h2);
        let eedl = 2.0 * PI * self.constants.vacuum_permittivity * er * zp1 * zp2 * (-k * h).exp()
            / (1.0 + k * h);

        evdw + eedl
    }
}

impl Problem for Flotation {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        SETUP.iter().map(|(_, l, u)| (*l, *u)).collect()
    }
}

impl Function for Flotation {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let eb = self.interaction_energy(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]);
        let temperature = x[8];
        let scale = self.constants.arrhenius_rate(temperature) * temperature;

        -1.0 / (1.0 + (eb / scale).exp())
    }
}

impl ProcessModel for Flotation {
    fn process(&self) -> Process {
        Process::Flotation
    }

    fn initial(&self) -> Vec<f64> {
        SETUP.iter().map(|(x0, _, _)| *x0).collect()
    }

    fn outcome(&self, result: &OptimizationResult<f64>) -> ProcessOutcome {
        let efficiency = -result.fx;

        let mut params = BTreeMap::new();
        params.insert("flotation_collection_eff", efficiency);
        params.extend(VARIABLES.iter().copied().zip(result.x.iter().copied()));

        ProcessOutcome {
            rate_constant: efficiency,
            params,
            converged: result.converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::driver::DEFAULT_MAX_ITERS;

    #[test]
    fn initial_in_domain() {
        let f = Flotation::new(PhysicalConstants::default());
        let x0 = nalgebra::DVector::from_vec(f.initial());

        assert_eq!(f.domain().dim(), VARIABLES.len());
        assert!(f.domain().contains(&x0));
    }

    #[test]
    fn interaction_energy_terms() {
        let f = Flotation::new(PhysicalConstants::default());

        // Without the charge, only van der Waals attraction remains.
        let evdw = f.interaction_energy(1e-19, 1.0, 1.0, 6.0, 0.0, 10.0, 500.0, 100.0);
        assert_abs_diff_eq!(evdw, -0.5e-19);

        // Without the attraction and with no screening, the double layer term
        // is `2 pi e0 Er Zp1 Zp2`.
        let eedl = f.interaction_energy(0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0);
        assert_abs_diff_eq!(eedl, 2.0 * PI * 8.5e-12, epsilon = 1e-20);
    }

    #[test]
    fn efficiency_is_half_for_negligible_energy() {
        let f = Flotation::new(PhysicalConstants::default());
        let x0 = nalgebra::DVector::from_vec(f.initial());

        assert_abs_diff_eq!(f.apply(&x0), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn optimum_within_bounds() {
        let f = Flotation::new(PhysicalConstants::default());
        let dom = f.domain();
        let outcome = f.optimize(DEFAULT_MAX_ITERS);

        assert!(outcome.converged);
        assert_eq!(outcome.params.len(), VARIABLES.len() + 1);

        for (i, name) in VARIABLES.iter().enumerate() {
            let value = outcome.params[name];
            assert!(
                dom.lower()[i] <= value && value <= dom.upper()[i],
                "{} = {} out of bounds",
                name,
                value
            );
        }

        assert_abs_diff_eq!(outcome.rate_constant, 0.5, epsilon = 1e-12);
        assert_eq!(outcome.rate_constant, outcome.params["flotation_collection_eff"]);
    }
}
