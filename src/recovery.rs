//! Aggregation of the process models into a recovery report.
//!
//! Every process model is optimized independently and its rate constant `k`
//! is converted into a recovery percentage by the exponential approach to
//! completion
//!
//! ```text
//! recovery = (1 - exp(-k * throughput)) * 100
//! ```
//!
//! The units of `k` and the throughput are taken as given. No conversion
//! between them is done.
//!
//! ```rust
//! use mineral_recovery::input::{InputSet, CYANIDE};
//! use mineral_recovery::process::Process;
//! use mineral_recovery::recovery::RecoveryAggregator;
//!
//! let inputs = InputSet::new()
//!     .with_gold_head_grade(2.0)
//!     .with_throughput(100.0)
//!     .with_reagent(CYANIDE, 0.5)
//!     .with_particle_diameter(2.0);
//!
//! let report = RecoveryAggregator::default()
//!     .run(&inputs)
//!     .expect("all inputs are provided");
//!
//! assert_eq!(report.len(), 5);
//!
//! let cyanidation = &report[Process::Cyanidation];
//! assert!(cyanidation.recovery > 99.0);
//! assert!((cyanidation.params["temperature"] - 323.0).abs() < 1e-6);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use getset::{CopyGetters, Setters};
use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::constants::PhysicalConstants;
use crate::driver::DEFAULT_MAX_ITERS;
use crate::input::{InputError, InputSet};
use crate::process::{
    Comminution, Cyanidation, Flotation, Gravity, HeapLeaching, Process, ProcessModel,
    ProcessOutcome,
};

/// Recovery percentage for given rate constant and throughput,
/// `(1 - exp(-k * throughput)) * 100`.
///
/// The value is increasing in both arguments, zero if any of them is zero and
/// approaches 100 as their product grows.
pub fn recovery_percentage(k: f64, throughput: f64) -> f64 {
    -(-k * throughput).exp_m1() * 100.0
}

/// Error of computing the recovery report.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecoveryError {
    /// Required input is missing or invalid.
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Options for [`RecoveryAggregator`].
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct AggregatorOptions {
    /// Maximum number of optimizer iterations per process model. Default:
    /// `15000`.
    max_iters: usize,
    /// Optimize the process models in parallel. The outcome is the same as
    /// for the sequential run. Default: `false`.
    parallel: bool,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            max_iters: DEFAULT_MAX_ITERS,
            parallel: false,
        }
    }
}

/// Recovery of a single process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecovery {
    /// Recovery percentage in `[0, 100]`.
    pub recovery: f64,
    /// Rate constant from which the recovery was computed.
    pub rate_constant: f64,
    /// Named auxiliary parameters of the process model.
    pub params: BTreeMap<&'static str, f64>,
    /// Whether the optimization of the process model converged. Recovery of
    /// a non-converged model should be trusted with reduced confidence.
    pub converged: bool,
}

/// Recovery of all processes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryReport {
    throughput: f64,
    processes: BTreeMap<Process, ProcessRecovery>,
}

impl RecoveryReport {
    /// Throughput used for the computation.
    pub fn throughput(&self) -> f64 {
        self.throughput
    }

    /// Recovery of given process.
    pub fn get(&self, process: Process) -> Option<&ProcessRecovery> {
        self.processes.get(&process)
    }

    /// Iterates over the processes in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Process, &ProcessRecovery)> {
        self.processes.iter().map(|(process, recovery)| (*process, recovery))
    }

    /// Number of processes in the report.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Determines whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Determines whether the optimizations of all process models converged.
    pub fn is_converged(&self) -> bool {
        self.processes.values().all(|recovery| recovery.converged)
    }
}

impl Index<Process> for RecoveryReport {
    type Output = ProcessRecovery;

    fn index(&self, process: Process) -> &Self::Output {
        &self.processes[&process]
    }
}

impl fmt::Display for RecoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (process, recovery) in self.iter() {
            write!(f, "{}: recovery = {:.4} %", process, recovery.recovery)?;
            if !recovery.converged {
                write!(f, " (not converged)")?;
            }
            writeln!(f)?;

            for (name, value) in &recovery.params {
                writeln!(f, "    {} = {}", name, value)?;
            }
        }

        Ok(())
    }
}

/// Runs all process models and assembles the [`RecoveryReport`].
#[derive(Debug, Clone, Default)]
pub struct RecoveryAggregator {
    constants: PhysicalConstants,
    options: AggregatorOptions,
}

impl RecoveryAggregator {
    /// Initializes the aggregator with given constants and default options.
    pub fn new(constants: PhysicalConstants) -> Self {
        Self::with_options(constants, AggregatorOptions::default())
    }

    /// Initializes the aggregator with given constants and options.
    pub fn with_options(constants: PhysicalConstants, options: AggregatorOptions) -> Self {
        Self { constants, options }
    }

    /// Computes the recovery of all processes.
    ///
    /// All inputs are checked before any optimization starts. The report
    /// always contains all five processes, including those whose optimization
    /// did not converge.
    pub fn run(&self, inputs: &InputSet) -> Result<RecoveryReport, RecoveryError> {
        let constants = self.constants;
        let throughput = inputs.throughput()?;

        let cyanidation = Cyanidation::from_input(constants, inputs)?;
        let flotation = Flotation::new(constants);
        let gravity = Gravity::from_input(constants, inputs)?;
        let heap_leaching = HeapLeaching::from_input(constants, inputs)?;
        let comminution = Comminution::from_input(constants, inputs)?;

        let max_iters = self.options.max_iters;
        let jobs: [(Process, Box<dyn Fn() -> ProcessOutcome + Send + Sync + '_>); 5] = [
            (
                Process::Cyanidation,
                Box::new(|| cyanidation.optimize(max_iters)),
            ),
            (Process::Flotation, Box::new(|| flotation.optimize(max_iters))),
            (Process::Gravity, Box::new(|| gravity.optimize(max_iters))),
            (
                Process::HeapLeaching,
                Box::new(|| heap_leaching.optimize(max_iters)),
            ),
            (
                Process::Comminution,
                Box::new(|| comminution.optimize(max_iters)),
            ),
        ];

        let outcomes: Vec<(Process, ProcessOutcome)> = if self.options.parallel {
            jobs.par_iter().map(|(process, job)| (*process, job())).collect()
        } else {
            jobs.iter().map(|(process, job)| (*process, job())).collect()
        };

        let processes = outcomes
            .into_iter()
            .map(|(process, outcome)| {
                let recovery = recovery_percentage(outcome.rate_constant, throughput);

                if outcome.converged {
                    info!(
                        "{}: recovery = {} % (k = {})",
                        process, recovery, outcome.rate_constant
                    );
                } else {
                    warn!(
                        "{}: recovery = {} % (k = {}) computed from a non-converged optimum",
                        process, recovery, outcome.rate_constant
                    );
                }

                let ProcessOutcome {
                    rate_constant,
                    params,
                    converged,
                } = outcome;

                (
                    process,
                    ProcessRecovery {
                        recovery,
                        rate_constant,
                        params,
                        converged,
                    },
                )
            })
            .collect();

        Ok(RecoveryReport {
            throughput,
            processes,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::input::CYANIDE;

    fn inputs() -> InputSet {
        InputSet::new()
            .with_gold_head_grade(2.0)
            .with_throughput(100.0)
            .with_reagent(CYANIDE, 0.5)
            .with_particle_diameter(2.0)
    }

    #[test]
    fn recovery_percentage_properties() {
        assert_eq!(recovery_percentage(0.0, 100.0), 0.0);
        assert_eq!(recovery_percentage(5.0, 0.0), 0.0);
        assert_relative_eq!(
            recovery_percentage(0.01, 100.0),
            (1.0 - (-1.0f64).exp()) * 100.0,
            max_relative = 1e-12
        );
        assert_abs_diff_eq!(recovery_percentage(820.0, 100.0), 100.0);

        let ks = [0.0, 1e-4, 1e-3, 1e-2, 0.1];
        let recoveries = ks
            .iter()
            .map(|k| recovery_percentage(*k, 10.0))
            .collect::<Vec<_>>();
        assert!(recoveries.windows(2).all(|w| w[0] < w[1]));
        assert!(recoveries.iter().all(|r| (0.0..100.0).contains(r)));

        let throughputs = [0.0, 1.0, 10.0, 100.0];
        let recoveries = throughputs
            .iter()
            .map(|t| recovery_percentage(1e-3, *t))
            .collect::<Vec<_>>();
        assert!(recoveries.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn five_processes() {
        let report = RecoveryAggregator::default().run(&inputs()).unwrap();

        assert_eq!(report.len(), 5);
        assert_eq!(
            report.iter().map(|(process, _)| process).collect::<Vec<_>>(),
            Process::ALL.to_vec()
        );
        assert!(report.is_converged());
        assert_eq!(report.throughput(), 100.0);
    }

    #[test]
    fn cyanidation_scenario() {
        let report = RecoveryAggregator::default().run(&inputs()).unwrap();
        let cyanidation = &report[Process::Cyanidation];

        let k = 1e11 * (-50000.0f64 / (8.314 * 323.0)).exp();

        assert_relative_eq!(cyanidation.params["temperature"], 323.0, max_relative = 1e-9);
        assert_relative_eq!(cyanidation.rate_constant, k, max_relative = 1e-6);
        assert_abs_diff_eq!(cyanidation.recovery, 100.0, epsilon = 1e-9);
        assert!(cyanidation.recovery <= 100.0);
    }

    #[test]
    fn aliases_of_cyanidation() {
        let report = RecoveryAggregator::default().run(&inputs()).unwrap();
        let cyanidation = &report[Process::Cyanidation];

        for process in [Process::HeapLeaching, Process::Comminution] {
            assert_eq!(report[process].rate_constant, cyanidation.rate_constant);
            assert_eq!(report[process].recovery, cyanidation.recovery);
        }

        assert_eq!(
            report[Process::HeapLeaching].params["heap_leaching_k"],
            cyanidation.params["k_cyanidation"]
        );
        assert_eq!(
            report[Process::Comminution].params["commuinution_k"],
            cyanidation.params["k_cyanidation"]
        );
    }

    #[test]
    fn flotation_and_gravity() {
        let report = RecoveryAggregator::default().run(&inputs()).unwrap();

        let flotation = &report[Process::Flotation];
        assert_abs_diff_eq!(flotation.rate_constant, 0.5, epsilon = 1e-12);
        assert_relative_eq!(
            flotation.recovery,
            recovery_percentage(0.5, 100.0),
            max_relative = 1e-12
        );

        let gravity = &report[Process::Gravity];
        assert_relative_eq!(gravity.params["pp"], 4000.0, max_relative = 1e-9);
        assert_relative_eq!(gravity.params["fluid_viscosity"], 0.005, max_relative = 1e-9);
        assert_relative_eq!(gravity.rate_constant, 16.35, max_relative = 1e-9);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let aggregator = RecoveryAggregator::default();

        let first = aggregator.run(&inputs()).unwrap();
        let second = aggregator.run(&inputs()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn parallel_run_is_identical() {
        let mut options = AggregatorOptions::default();
        options.set_parallel(true);

        let sequential = RecoveryAggregator::default().run(&inputs()).unwrap();
        let parallel = RecoveryAggregator::with_options(PhysicalConstants::default(), options)
            .run(&inputs())
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn missing_inputs() {
        let aggregator = RecoveryAggregator::default();

        let inputs = InputSet::new()
            .with_gold_head_grade(2.0)
            .with_reagent(CYANIDE, 0.5)
            .with_particle_diameter(2.0);
        assert_eq!(
            aggregator.run(&inputs).unwrap_err(),
            RecoveryError::Input(InputError::Missing("throughput".to_string()))
        );

        let inputs = InputSet::new()
            .with_gold_head_grade(2.0)
            .with_throughput(100.0)
            .with_particle_diameter(2.0);
        assert_eq!(
            aggregator.run(&inputs).unwrap_err(),
            RecoveryError::Input(InputError::Missing(CYANIDE.to_string()))
        );

        let inputs = InputSet::new()
            .with_gold_head_grade(2.0)
            .with_throughput(100.0)
            .with_reagent(CYANIDE, 0.5);
        assert_eq!(
            aggregator.run(&inputs).unwrap_err(),
            RecoveryError::Input(InputError::Missing("particle diameter".to_string()))
        );
    }

    #[test]
    fn report_rendering() {
        let report = RecoveryAggregator::default().run(&inputs()).unwrap();
        let rendered = report.to_string();

        for process in Process::ALL {
            assert!(rendered.contains(&format!("{}: recovery = ", process)));
        }
        assert!(rendered.contains("    commuinution_k = "));
        assert!(!rendered.contains("not converged"));
    }

    fn limited(max_iters: usize) -> RecoveryAggregator {
        let mut options = AggregatorOptions::default();
        options.set_max_iters(max_iters);
        RecoveryAggregator::with_options(PhysicalConstants::default(), options)
    }

    #[test]
    fn no_iterations_still_reports_all_processes() {
        let report = limited(0).run(&inputs()).unwrap();

        assert_eq!(report.len(), 5);
        assert!(!report.is_converged());

        let rendered = report.to_string();
        for (process, recovery) in report.iter() {
            assert!(!recovery.converged, "{}", process);
            assert!(recovery.recovery.is_finite());
            assert!((0.0..=100.0).contains(&recovery.recovery));
            assert!(rendered.contains(&format!(
                "{}: recovery = {:.4} % (not converged)",
                process, recovery.recovery
            )));
        }

        // Initial temperature of the cyanidation.
        assert_eq!(report[Process::Cyanidation].params["temperature"], 293.0);
    }

    #[test]
    fn single_iteration_flags_unfinished_processes() {
        let report = limited(1).run(&inputs()).unwrap();

        assert_eq!(report.len(), 5);
        assert!(!report.is_converged());

        // The flotation objective is flat, its first iteration already
        // converges.
        assert!(report[Process::Flotation].converged);

        let rendered = report.to_string();
        for process in [
            Process::Cyanidation,
            Process::Gravity,
            Process::HeapLeaching,
            Process::Comminution,
        ] {
            let recovery = &report[process];

            assert!(!recovery.converged, "{}", process);
            assert!((0.0..=100.0).contains(&recovery.recovery));
            assert!(rendered.contains(&format!(
                "{}: recovery = {:.4} % (not converged)",
                process, recovery.recovery
            )));
        }
    }

    #[test]
    fn five_processes_for_any_inputs() {
        let input_sets = [
            inputs(),
            inputs().with_gold_head_grade(0.0),
            inputs().with_throughput(0.0),
            inputs().with_particle_diameter(0.0),
            inputs().with_reagent(CYANIDE, 0.0),
            inputs()
                .with_gold_head_grade(1e-3)
                .with_reagent(CYANIDE, 1e-3)
                .with_throughput(1e-3),
            inputs().with_gold_head_grade(1e3).with_throughput(1e6),
        ];

        for inputs in &input_sets {
            let report = RecoveryAggregator::default().run(inputs).unwrap();

            assert_eq!(
                report.iter().map(|(process, _)| process).collect::<Vec<_>>(),
                Process::ALL.to_vec()
            );
            for (process, recovery) in report.iter() {
                assert!(
                    (0.0..=100.0).contains(&recovery.recovery),
                    "{}: {}",
                    process,
                    recovery.recovery
                );
            }
        }
    }

    #[test]
    fn zero_throughput_gives_zero_recovery() {
        let report = RecoveryAggregator::default()
            .run(&inputs().with_throughput(0.0))
            .unwrap();

        for (_, recovery) in report.iter() {
            assert_eq!(recovery.recovery, 0.0);
        }
    }
}
