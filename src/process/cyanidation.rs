//! Gold dissolution by cyanide.
//!
//! The dissolution rate is `k(T) * grade * CN` where the rate constant
//! follows the Arrhenius equation. The only variable is the temperature,
//! limited to 20-50 °C.

use std::collections::BTreeMap;

use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use crate::constants::PhysicalConstants;
use crate::driver::OptimizationResult;
use crate::input::{InputError, InputSet, CYANIDE};
use crate::{Domain, Function, Problem};

use super::{Process, ProcessModel, ProcessOutcome};

/// Lower and upper bound of the temperature [K].
pub(crate) const TEMPERATURE_BOUNDS: (f64, f64) = (293.0, 323.0);

/// Cyanidation model.
#[derive(Debug, Clone)]
pub struct Cyanidation {
    constants: PhysicalConstants,
    gold_head_grade: f64,
    cyanide: f64,
}

impl Cyanidation {
    /// Initializes the model with given gold head grade and cyanide dosage.
    pub fn new(constants: PhysicalConstants, gold_head_grade: f64, cyanide: f64) -> Self {
        Self {
            constants,
            gold_head_grade,
            cyanide,
        }
    }

    /// Initializes the model with the gold head grade and the cyanide dosage
    /// from the inputs.
    pub fn from_input(constants: PhysicalConstants, inputs: &InputSet) -> Result<Self, InputError> {
        Ok(Self::new(
            constants,
            inputs.gold_head_grade()?,
            inputs.reagent(CYANIDE)?,
        ))
    }

    /// Rate constant at given temperature.
    pub fn rate_constant(&self, temperature: f64) -> f64 {
        self.constants.arrhenius_rate(temperature)
    }
}

impl Problem for Cyanidation {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        [TEMPERATURE_BOUNDS].into_iter().collect()
    }
}

impl Function for Cyanidation {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        -self.rate_constant(x[0]) * self.gold_head_grade * self.cyanide
    }
}

impl ProcessModel for Cyanidation {
    fn process(&self) -> Process {
        Process::Cyanidation
    }

    fn initial(&self) -> Vec<f64> {
        vec![TEMPERATURE_BOUNDS.0]
    }

    fn outcome(&self, result: &OptimizationResult<f64>) -> ProcessOutcome {
        let temperature = result.x[0];
        let k = self.rate_constant(temperature);

        let params = BTreeMap::from([
            ("gold_dissolution_rate", -result.fx),
            ("temperature", temperature),
            ("k_cyanidation", k),
        ]);

        ProcessOutcome {
            rate_constant: k,
            params,
            converged: result.converged,
        }
    }
}
