//! Core abstractions and types.
//!
//! *Users* are mainly interested in implementing the [`Function`] trait and
//! specifying the [domain](Domain) of their problem.
//!
//! Algorithm *developers* are interested in implementing the [`Optimizer`]
//! trait and using the tools in the [derivatives](crate::derivatives) module.

mod base;
mod domain;
mod function;
mod optimizer;

pub use base::*;
pub use domain::*;
pub use function::*;
pub use optimizer::*;
