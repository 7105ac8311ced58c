//! Physico-chemical models of the extraction processes.
//!
//! Every model is a bound-constrained [`Function`] whose minimum corresponds
//! to the most favourable operating point of the process. Physical goals are
//! maximizations, so the objectives are negated. After the optimization, the
//! model maps the optimum to a [`ProcessOutcome`] carrying the rate constant
//! from which the recovery is computed and the named auxiliary parameters.
//!
//! * [Cyanidation] -- Arrhenius kinetics of gold dissolution in temperature.
//! * [Flotation] -- DLVO-like interaction energy of a particle and a bubble.
//! * [Gravity] -- Stokes settling of a particle in a viscous fluid.
//! * [HeapLeaching] and [Comminution] -- both reuse the cyanidation kinetics.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

use crate::driver::{OptimizationResult, OptimizerDriver};
use crate::Function;

mod cyanidation;
mod flotation;
mod gravity;
mod leaching;

pub use cyanidation::Cyanidation;
pub use flotation::Flotation;
pub use gravity::Gravity;
pub use leaching::{Comminution, HeapLeaching};

/// Extraction process.
///
/// The order of the variants is the order of the processes in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Process {
    /// Leaching of gold by cyanide solution.
    Cyanidation,
    /// Froth flotation.
    Flotation,
    /// Gravity separation.
    Gravity,
    /// Heap leaching.
    HeapLeaching,
    /// Comminution (crushing and grinding).
    Comminution,
}

impl Process {
    /// All processes in report order.
    pub const ALL: [Process; 5] = [
        Process::Cyanidation,
        Process::Flotation,
        Process::Gravity,
        Process::HeapLeaching,
        Process::Comminution,
    ];

    /// Name of the process as used in reports.
    ///
    /// The name of comminution is `commuinution`, which is the key the
    /// consumers of the reports expect.
    pub fn name(&self) -> &'static str {
        match self {
            Process::Cyanidation => "cyanidation",
            Process::Flotation => "flotation",
            Process::Gravity => "gravity",
            Process::HeapLeaching => "heap_leaching",
            Process::Comminution => "commuinution",
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optimized state of a process model.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    /// Rate constant entering the recovery formula.
    pub rate_constant: f64,
    /// Named auxiliary parameters (optimum variables and derived values).
    pub params: BTreeMap<&'static str, f64>,
    /// Whether the optimizer converged.
    pub converged: bool,
}

/// Interface of a process model.
pub trait ProcessModel: Function<Field = f64> {
    /// The modeled process.
    fn process(&self) -> Process;

    /// Initial guess of the optimization. Must lie in the domain.
    fn initial(&self) -> Vec<f64>;

    /// Maps the result of the optimization to the outcome.
    fn outcome(&self, result: &OptimizationResult<f64>) -> ProcessOutcome;

    /// Minimizes the objective from the initial guess and returns the outcome.
    ///
    /// Non-convergence is not an error. The outcome is computed from the best
    /// point found and flagged.
    fn optimize(&self, max_iters: usize) -> ProcessOutcome
    where
        Self: Sized,
    {
        let result = OptimizerDriver::builder(self)
            .with_initial(self.initial())
            .with_max_iters(max_iters)
            .build()
            .minimize();

        if result.converged {
            debug!(
                "{}: optimum {:?} with value {} after {} iterations",
                self.process(),
                result.x,
                result.fx,
                result.iters
            );
        } else {
            warn!(
                "{}: optimization did not converge, using the best point {:?}",
                self.process(),
                result.x
            );
        }

        self.outcome(&result)
    }
}
