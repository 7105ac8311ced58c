//! Heap leaching and comminution.
//!
//! Neither process has a dedicated physical model yet. Both reuse the
//! cyanidation kinetics, so their rate constant is the cyanidation rate
//! constant at the optimal temperature.

use std::collections::BTreeMap;

use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use crate::constants::PhysicalConstants;
use crate::driver::OptimizationResult;
use crate::input::{InputError, InputSet};
use crate::{Domain, Function, Problem};

use super::{Cyanidation, Process, ProcessModel, ProcessOutcome};

macro_rules! cyanidation_alias {
    ($(#[$meta:meta])* $name:ident, $process:expr, $key:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: Cyanidation,
        }

        impl $name {
            /// Initializes the model with given gold head grade and cyanide
            /// dosage.
            pub fn new(constants: PhysicalConstants, gold_head_grade: f64, cyanide: f64) -> Self {
                Self {
                    inner: Cyanidation::new(constants, gold_head_grade, cyanide),
                }
            }

            /// Initializes the model from the inputs of the cyanidation.
            pub fn from_input(
                constants: PhysicalConstants,
                inputs: &InputSet,
            ) -> Result<Self, InputError> {
                Ok(Self {
                    inner: Cyanidation::from_input(constants, inputs)?,
                })
            }
        }

        impl Problem for $name {
            type Field = f64;

            fn domain(&self) -> Domain<Self::Field> {
                self.inner.domain()
            }
        }

        impl Function for $name {
            fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
            where
                Sx: Storage<Self::Field, Dyn> + IsContiguous,
            {
                self.inner.apply(x)
            }
        }

        impl ProcessModel for $name {
            fn process(&self) -> Process {
                $process
            }

            fn initial(&self) -> Vec<f64> {
                self.inner.initial()
            }

            fn outcome(&self, result: &OptimizationResult<f64>) -> ProcessOutcome {
                let outcome = self.inner.outcome(result);

                ProcessOutcome {
                    params: BTreeMap::from([($key, outcome.rate_constant)]),
                    ..outcome
                }
            }
        }
    };
}

cyanidation_alias!(
    /// Heap leaching model, an alias of [`Cyanidation`].
    HeapLeaching,
    Process::HeapLeaching,
    "heap_leaching_k"
);

cyanidation_alias!(
    /// Comminution model, an alias of [`Cyanidation`].
    Comminution,
    Process::Comminution,
    "commuinution_k"
);
