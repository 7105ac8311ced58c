use nalgebra::{storage::StorageMut, Dyn, IsContiguous, Vector};

use super::{domain::Domain, function::Function};

/// Interface of an optimizer.
///
/// An optimizer is an iterative algorithm which takes a point _x_ and
/// computes the next step in the optimization process. Repeated calls to the
/// next step should eventually converge into a minimum _x'_ in successful
/// cases.
///
/// ## Implementing an optimizer
///
/// Here is an implementation of an "optimizer" which only evaluates the
/// corner of the domain given by the lower bounds and declares itself
/// converged.
///
/// ```rust
/// use mineral_recovery::nalgebra as na;
/// use mineral_recovery::{Domain, Function, Optimizer};
/// use na::{storage::StorageMut, Dyn, IsContiguous, Vector};
///
/// struct LowerCorner {
///     done: bool,
/// }
///
/// impl<F: Function> Optimizer<F> for LowerCorner {
///     const NAME: &'static str = "LowerCorner";
///     type Error = std::convert::Infallible;
///
///     fn opt_next<Sx>(
///         &mut self,
///         f: &F,
///         dom: &Domain<F::Field>,
///         x: &mut Vector<F::Field, Dyn, Sx>,
///     ) -> Result<F::Field, Self::Error>
///     where
///         Sx: StorageMut<F::Field, Dyn> + IsContiguous,
///     {
///         x.copy_from(dom.lower());
///         self.done = true;
///
///         // We must compute the value.
///         Ok(f.apply(&*x))
///     }
///
///     fn is_converged(&self) -> bool {
///         self.done
///     }
/// }
/// ```
pub trait Optimizer<F: Function> {
    /// Name of the optimizer.
    const NAME: &'static str;

    /// Error while computing the next step.
    type Error;

    /// Computes the next step in the optimization process.
    ///
    /// The value of `x` is the current point. After the method returns, `x`
    /// should hold the variable values of the performed step and the return
    /// value _must_ be the function value of that step as computed by
    /// [`Function::apply`].
    ///
    /// The implementations _can_ assume that subsequent calls to `opt_next`
    /// pass the value of `x` as was returned in the previous iteration.
    fn opt_next<Sx>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous;

    /// Whether the last step satisfied the convergence criteria of the
    /// optimizer. Optimizers without an intrinsic criterion never converge
    /// and rely on the iteration budget of the caller.
    fn is_converged(&self) -> bool {
        false
    }
}
