#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # Mineral recovery
//!
//! Identification of ore types and prediction of metallurgical recovery
//! across extraction processes, written entirely in Rust.
//!
//! The recovery of every process is derived from a small physico-chemical
//! model whose most favourable operating point is found by a bound-constrained
//! minimization. The library therefore consists of two layers:
//!
//! * A framework for bound-constrained optimization of scalar functions
//!   ([`Function`], [`Domain`], [`Optimizer`], [`OptimizerDriver`]) with a
//!   deterministic [projected L-BFGS](algo::lbfgsb) method.
//! * The [process models](process), the [recovery](recovery) aggregation and
//!   the [ore identification](identify).
//!
//! ## Processes
//!
//! * [Cyanidation](process::Cyanidation) -- Arrhenius kinetics of gold
//!   dissolution, optimized over the temperature.
//! * [Flotation](process::Flotation) -- collection efficiency given by the
//!   interaction energy of a particle and a bubble.
//! * [Gravity separation](process::Gravity) -- Stokes settling, optimized over
//!   the particle density and the fluid viscosity.
//! * [Heap leaching](process::HeapLeaching) and
//!   [comminution](process::Comminution) -- share the cyanidation kinetics.
//!
//! ## Recovery
//!
//! Given the inputs, the [`RecoveryAggregator`](recovery::RecoveryAggregator)
//! optimizes all process models and converts their rate constants into
//! recovery percentages.
//!
//! ```rust
//! use mineral_recovery::input::{InputSet, CYANIDE};
//! use mineral_recovery::recovery::RecoveryAggregator;
//! use mineral_recovery::PhysicalConstants;
//!
//! let inputs = InputSet::new()
//!     .with_gold_head_grade(2.0)
//!     .with_throughput(100.0)
//!     .with_reagent(CYANIDE, 0.5)
//!     .with_particle_diameter(2.0);
//!
//! let aggregator = RecoveryAggregator::new(PhysicalConstants::default());
//!
//! match aggregator.run(&inputs) {
//!     Ok(report) => {
//!         for (process, recovery) in report.iter() {
//!             println!("{}: {:.2} %", process, recovery.recovery);
//!         }
//!     }
//!     Err(error) => eprintln!("cannot compute the recovery: {}", error),
//! }
//! ```
//!
//! ## Optimization
//!
//! Any type implementing the [`Problem`] and [`Function`] traits can be
//! minimized by the [`OptimizerDriver`]. There is no need for defining the
//! gradient, the library uses [finite
//! differences](https://en.wikipedia.org/wiki/Finite_difference_method).
//!
//! ```rust
//! // This crate is based on `nalgebra` crate.
//! use mineral_recovery::nalgebra as na;
//! use mineral_recovery::{Domain, Function, OptimizerDriver, Problem};
//! use na::{Dyn, IsContiguous};
//!
//! struct Rosenbrock {
//!     a: f64,
//!     b: f64,
//! }
//!
//! impl Problem for Rosenbrock {
//!     // The numeric type. Usually f64 or f32.
//!     type Field = f64;
//!
//!     // Bounds of the variables.
//!     fn domain(&self) -> Domain<Self::Field> {
//!         [(-2.0, 2.0), (-1.0, 3.0)].into_iter().collect()
//!     }
//! }
//!
//! impl Function for Rosenbrock {
//!     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//!     where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!     {
//!         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
//!     }
//! }
//!
//! let f = Rosenbrock { a: 1.0, b: 100.0 };
//! let result = OptimizerDriver::builder(&f)
//!     .with_initial(vec![-1.2, 1.0])
//!     .with_max_iters(500)
//!     .build()
//!     .minimize();
//!
//! if result.converged {
//!     println!("minimum {} at {:?}", result.fx, result.x);
//! } else {
//!     println!("best point so far {:?}", result.x);
//! }
//! ```
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
pub mod analysis;
pub mod constants;
mod core;
pub mod derivatives;
pub mod driver;
pub mod identify;
pub mod input;
pub mod process;
pub mod recovery;

pub use constants::PhysicalConstants;
pub use core::*;
pub use driver::{OptimizationResult, OptimizerDriver};

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
