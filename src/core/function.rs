use nalgebra::{storage::Storage, Dyn, IsContiguous, Vector};

use super::base::Problem;

/// The trait for defining objective functions.
///
/// ## Defining a function
///
/// A function is any type that implements [`Function`] and [`Problem`]
/// traits. The domain is required because every problem solved by this
/// crate is bound-constrained.
///
/// ```rust
/// use mineral_recovery::nalgebra as na;
/// use mineral_recovery::{Domain, Function, Problem};
/// use na::{Dyn, IsContiguous};
///
/// // Stokes-like settling rate with the density and viscosity as variables.
/// struct Settling {
///     diameter: f64,
/// }
///
/// impl Problem for Settling {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         [(2500.0, 4000.0), (0.0005, 0.005)].into_iter().collect()
///     }
/// }
///
/// impl Function for Settling {
///     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         // Negated because optimizers minimize.
///         -9.81 * (x[0] - 1000.0) / 18.0 * x[1] * self.diameter
///     }
/// }
/// ```
pub trait Function: Problem {
    /// Calculates the function value in given point.
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}
