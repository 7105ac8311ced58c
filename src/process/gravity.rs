//! Gravity separation.
//!
//! The objective follows the Stokes-law form
//! `g (pp - pf) / 18 * mu * d` with the particle density `pp` and the fluid
//! viscosity `mu` as variables and the particle diameter `d` as a required
//! input. The unit of the diameter is whatever the caller uses consistently.

use std::collections::BTreeMap;

use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use crate::constants::PhysicalConstants;
use crate::driver::OptimizationResult;
use crate::input::{InputError, InputSet};
use crate::{Domain, Function, Problem};

use super::{Process, ProcessModel, ProcessOutcome};

const PARTICLE_DENSITY: (f64, f64, f64) = (3000.0, 2500.0, 4000.0);
const FLUID_VISCOSITY: (f64, f64, f64) = (0.001, 0.0005, 0.005);

/// Gravity separation model.
#[derive(Debug, Clone)]
pub struct Gravity {
    constants: PhysicalConstants,
    particle_diameter: f64,
}

impl Gravity {
    /// Initializes the model with given particle diameter.
    pub fn new(constants: PhysicalConstants, particle_diameter: f64) -> Self {
        Self {
            constants,
            particle_diameter,
        }
    }

    /// Initializes the model with the particle diameter from the inputs.
    pub fn from_input(constants: PhysicalConstants, inputs: &InputSet) -> Result<Self, InputError> {
        Ok(Self::new(constants, inputs.particle_diameter()?))
    }
}

impl Problem for Gravity {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        [
            (PARTICLE_DENSITY.1, PARTICLE_DENSITY.2),
            (FLUID_VISCOSITY.1, FLUID_VISCOSITY.2),
        ]
        .into_iter()
        .collect()
    }
}

impl Function for Gravity {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let density = x[0];
        let viscosity = x[1];

        -self.constants.gravitational_acceleration * (density - self.constants.fluid_density)
            / 18.0
            * viscosity
            * self.particle_diameter
    }
}

impl ProcessModel for Gravity {
    fn process(&self) -> Process {
        Process::Gravity
    }

    fn initial(&self) -> Vec<f64> {
        vec![PARTICLE_DENSITY.0, FLUID_VISCOSITY.0]
    }

    fn outcome(&self, result: &OptimizationResult<f64>) -> ProcessOutcome {
        let recovery = -result.fx;

        let params = BTreeMap::from([
            ("gravity_recovery", recovery),
            ("pp", result.x[0]),
            ("fluid_viscosity", result.x[1]),
        ]);

        ProcessOutcome {
            rate_constant: recovery,
            params,
            converged: result.converged,
        }
    }
}
