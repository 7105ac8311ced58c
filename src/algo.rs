//! The collection of implemented algorithms.

pub mod lbfgsb;

pub use lbfgsb::{Lbfgsb, LbfgsbError, LbfgsbOptions};
