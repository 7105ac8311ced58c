//! High-level API for optimization.
//!
//! The driver encapsulates all internal state and provides a simple API to
//! run the iterative process of minimizing a [`Function`] over its domain.
//!
//! The simplest way of using the driver is to initialize it with the defaults:
//!
//! ```rust
//! use mineral_recovery::OptimizerDriver;
//! # use mineral_recovery::nalgebra as na;
//! # use mineral_recovery::{Domain, Function, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Parabola;
//! #
//! # impl Problem for Parabola {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::rect(vec![-5.0], vec![5.0])
//! #     }
//! # }
//! #
//! # impl Function for Parabola {
//! #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         (x[0] - 1.0).powi(2)
//! #     }
//! # }
//!
//! let f = Parabola;
//!
//! let mut optimizer = OptimizerDriver::new(&f);
//! ```
//!
//! If you need to specify additional settings, use the builder:
//!
//! ```rust
//! use mineral_recovery::algo::{Lbfgsb, LbfgsbOptions};
//! use mineral_recovery::OptimizerDriver;
//! # use mineral_recovery::nalgebra as na;
//! # use mineral_recovery::{Domain, Function, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Parabola;
//! #
//! # impl Problem for Parabola {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::rect(vec![-5.0], vec![5.0])
//! #     }
//! # }
//! #
//! # impl Function for Parabola {
//! #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         (x[0] - 1.0).powi(2)
//! #     }
//! # }
//!
//! let f = Parabola;
//!
//! let mut options = LbfgsbOptions::default();
//! options.set_memory(5);
//!
//! let mut optimizer = OptimizerDriver::builder(&f)
//!     .with_initial(vec![4.0])
//!     .with_algo(|f, dom| Lbfgsb::with_options(f, dom, options))
//!     .with_max_iters(100)
//!     .build();
//! ```
//!
//! Once you have the optimizer, run it until the algorithm converges or the
//! iteration budget is exhausted:
//!
//! ```rust
//! # use mineral_recovery::nalgebra as na;
//! # use mineral_recovery::{Domain, Function, OptimizerDriver, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Parabola;
//! #
//! # impl Problem for Parabola {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::rect(vec![-5.0], vec![5.0])
//! #     }
//! # }
//! #
//! # impl Function for Parabola {
//! #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         (x[0] - 1.0).powi(2)
//! #     }
//! # }
//! #
//! # let f = Parabola;
//! let mut optimizer = OptimizerDriver::new(&f);
//! let result = optimizer.minimize();
//!
//! assert!(result.converged);
//! assert!((result.x[0] - 1.0).abs() < 1e-4);
//! ```
//!
//! If you need more control over the iteration process, you can use
//! [`find`](OptimizerDriver::find) with a custom stopping criterion or do the
//! iterations manually with [`next`](OptimizerDriver::next).

use std::fmt;

use log::{debug, warn};
use nalgebra::{DimName, Dyn, OVector, U1};

use crate::{algo::Lbfgsb, Domain, Function, Optimizer, Problem};

/// Default limit of iterations for [`OptimizerDriver::minimize`].
pub const DEFAULT_MAX_ITERS: usize = 15000;

/// Builder for the [`OptimizerDriver`].
pub struct OptimizerBuilder<'a, F: Problem, A> {
    f: &'a F,
    dom: Domain<F::Field>,
    algo: A,
    x0: OVector<F::Field, Dyn>,
    max_iters: usize,
}

impl<'a, F: Problem> OptimizerBuilder<'a, F, Lbfgsb<F>> {
    fn new(f: &'a F) -> Self {
        let dom = f.domain();
        let algo = Lbfgsb::new(f, &dom);

        // Starts in the lower corner unless told otherwise.
        let x0 = dom.lower().clone_owned();

        Self {
            f,
            dom,
            algo,
            x0,
            max_iters: DEFAULT_MAX_ITERS,
        }
    }
}

impl<'a, F: Problem, A> OptimizerBuilder<'a, F, A> {
    /// Sets the initial point from which the iterative process starts.
    ///
    /// # Panics
    ///
    /// Panics if the length of the point does not match the dimension of the
    /// domain.
    pub fn with_initial(mut self, x0: Vec<F::Field>) -> Self {
        assert!(
            x0.len() == self.dom.dim(),
            "initial point has invalid dimension"
        );

        let dim = Dyn(self.dom.dim());
        self.x0 = OVector::from_vec_generic(dim, U1::name(), x0);
        self
    }

    /// Sets specific algorithm to be used.
    ///
    /// This builder method accepts a closure that takes the reference to the
    /// problem and its domain. You can simply pass the `new` constructor
    /// directly (e.g., `Lbfgsb::new`).
    pub fn with_algo<A2, FA>(self, factory: FA) -> OptimizerBuilder<'a, F, A2>
    where
        FA: FnOnce(&F, &Domain<F::Field>) -> A2,
    {
        let algo = factory(self.f, &self.dom);

        OptimizerBuilder {
            f: self.f,
            dom: self.dom,
            algo,
            x0: self.x0,
            max_iters: self.max_iters,
        }
    }

    /// Sets the maximum number of iterations done by
    /// [`minimize`](OptimizerDriver::minimize). Default: `15000`.
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }
}

impl<'a, F: Function, A> OptimizerBuilder<'a, F, A> {
    /// Builds the [`OptimizerDriver`].
    ///
    /// The initial point is projected into the domain and evaluated.
    pub fn build(self) -> OptimizerDriver<'a, F, A> {
        let Self {
            f,
            dom,
            algo,
            mut x0,
            max_iters,
        } = self;

        dom.project(&mut x0);
        let fx = f.apply(&x0);

        OptimizerDriver {
            f,
            dom,
            algo,
            x: x0,
            fx,
            iter: 0,
            max_iters,
        }
    }
}

/// The driver for the process of minimizing a function.
///
/// For default settings, use [`OptimizerDriver::new`]. For more flexibility,
/// use [`OptimizerDriver::builder`]. For the usage of the driver, see
/// [module](self) documentation.
pub struct OptimizerDriver<'a, F: Problem, A> {
    f: &'a F,
    dom: Domain<F::Field>,
    algo: A,
    x: OVector<F::Field, Dyn>,
    fx: F::Field,
    iter: usize,
    max_iters: usize,
}

impl<'a, F: Problem> OptimizerDriver<'a, F, Lbfgsb<F>> {
    /// Returns the builder for specifying additional settings.
    pub fn builder(f: &'a F) -> OptimizerBuilder<'a, F, Lbfgsb<F>> {
        OptimizerBuilder::new(f)
    }
}

impl<'a, F: Function> OptimizerDriver<'a, F, Lbfgsb<F>> {
    /// Initializes the driver with the default settings.
    pub fn new(f: &'a F) -> Self {
        OptimizerDriver::builder(f).build()
    }
}

impl<'a, F: Problem, A> OptimizerDriver<'a, F, A> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the current function value.
    pub fn fx(&self) -> F::Field {
        self.fx
    }

    /// Returns the number of iterations done so far.
    pub fn iter(&self) -> usize {
        self.iter
    }
}

impl<'a, F: Function, A: Optimizer<F>> OptimizerDriver<'a, F, A> {
    /// Does one iteration of the process, returning the function value in case
    /// of no error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<(&[F::Field], F::Field), A::Error> {
        self.fx = self.algo.opt_next(self.f, &self.dom, &mut self.x)?;
        self.iter += 1;
        Ok((self.x.as_slice(), self.fx))
    }

    /// Runs the iterative process until given stopping criterion is satisfied.
    pub fn find<C>(&mut self, stop: C) -> Result<(&[F::Field], F::Field), A::Error>
    where
        C: Fn(OptimizerIterState<'_, F>) -> bool,
    {
        loop {
            self.next()?;

            let state = OptimizerIterState {
                x: &self.x,
                fx: self.fx,
                iter: self.iter - 1,
                converged: self.algo.is_converged(),
            };

            if stop(state) {
                return Ok((self.x.as_slice(), self.fx));
            }
        }
    }

    /// Runs the iterative process until the algorithm converges or the maximum
    /// number of iterations is reached.
    ///
    /// Errors of the algorithm do not propagate. Instead, the last accepted
    /// point is returned and the result is marked as not converged.
    pub fn minimize(&mut self) -> OptimizationResult<F::Field>
    where
        A::Error: fmt::Display,
    {
        let mut converged = self.algo.is_converged();

        while !converged && self.iter < self.max_iters {
            if let Err(error) = self.next() {
                warn!(
                    "{} stopped after {} iterations: {}",
                    A::NAME,
                    self.iter,
                    error
                );
                return self.result(false);
            }

            converged = self.algo.is_converged();
        }

        if converged {
            debug!("{} converged in {} iterations", A::NAME, self.iter);
        } else {
            warn!(
                "{} did not converge within {} iterations",
                A::NAME,
                self.max_iters
            );
        }

        self.result(converged)
    }

    /// Returns the name of the used optimizer.
    pub fn name(&self) -> &str {
        A::NAME
    }

    fn result(&self, converged: bool) -> OptimizationResult<F::Field> {
        OptimizationResult {
            x: self.x.iter().copied().collect(),
            fx: self.fx,
            converged,
            iters: self.iter,
        }
    }
}

/// Outcome of [`OptimizerDriver::minimize`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult<T> {
    /// The best point found.
    pub x: Vec<T>,
    /// Function value in the best point.
    pub fx: T,
    /// Whether the convergence criteria of the algorithm were satisfied.
    pub converged: bool,
    /// Number of iterations done.
    pub iters: usize,
}

/// State of the current iteration.
pub struct OptimizerIterState<'a, F: Problem> {
    x: &'a OVector<F::Field, Dyn>,
    fx: F::Field,
    iter: usize,
    converged: bool,
}

impl<'a, F: Problem> OptimizerIterState<'a, F> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the current function value.
    pub fn fx(&self) -> F::Field {
        self.fx
    }

    /// Returns the current iteration number.
    pub fn iter(&self) -> usize {
        self.iter
    }

    /// Returns whether the algorithm reports convergence.
    pub fn converged(&self) -> bool {
        self.converged
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::algo::{LbfgsbError, LbfgsbOptions};
    use crate::testing::{Sphere, TestFunction};

    use super::*;

    struct WithDomain(pub Domain<f64>);

    impl Problem for WithDomain {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            self.0.clone()
        }
    }

    impl Function for WithDomain {
        fn apply<Sx>(&self, x: &nalgebra::Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: nalgebra::storage::Storage<Self::Field, Dyn> + nalgebra::IsContiguous,
        {
            x.sum()
        }
    }

    #[test]
    fn basic_use_case() {
        let f = Sphere::new(vec![(-10.0, 10.0); 4]);
        let mut optimizer = OptimizerDriver::builder(&f)
            // Zeros are the optimum for sphere, there would be no point is
            // such test.
            .with_initial(vec![10.0; 4])
            .build();

        let tolerance = 1e-6;
        let (_, value) = optimizer
            .find(|state| state.iter() >= 100 || state.fx() < tolerance)
            .unwrap();

        assert!(value <= tolerance);
    }

    #[test]
    fn custom_algo() {
        let f = Sphere::new(vec![(-10.0, 10.0); 4]);
        let mut options = LbfgsbOptions::default();
        options.set_memory(1);

        let mut optimizer = OptimizerDriver::builder(&f)
            .with_algo(|f, dom| Lbfgsb::with_options(f, dom, options))
            .with_initial(vec![10.0; 4])
            .build();

        let result = optimizer.minimize();

        assert!(result.converged);
        assert!(f.is_optimum(&nalgebra::DVector::from_vec(result.x), 1e-5));
    }

    #[test]
    fn initial() {
        let x0 = vec![10.0; 4];

        let f = Sphere::new(vec![(-10.0, 10.0); 4]);
        let optimizer = OptimizerDriver::builder(&f)
            .with_initial(x0.clone())
            .build();

        assert_eq!(optimizer.x(), &x0);
        assert_eq!(optimizer.fx(), 400.0);
    }

    #[test]
    fn initial_in_domain() {
        let f = WithDomain(Domain::rect(vec![0.0, 0.0], vec![1.0, 1.0]));
        let optimizer = OptimizerDriver::builder(&f)
            .with_initial(vec![10.0, -10.0])
            .build();

        assert_eq!(optimizer.x(), &[1.0, 0.0]);
        assert_eq!(optimizer.fx(), 1.0);
    }

    #[test]
    #[should_panic(expected = "invalid dimension")]
    fn initial_with_invalid_dimension() {
        let f = Sphere::new(vec![(-10.0, 10.0); 2]);
        OptimizerDriver::builder(&f).with_initial(vec![1.0]);
    }

    #[test]
    fn minimize_linear_reaches_lower_corner() {
        let f = WithDomain(Domain::rect(vec![0.0, -1.0], vec![1.0, 1.0]));
        let result = OptimizerDriver::builder(&f)
            .with_initial(vec![0.5, 0.5])
            .build()
            .minimize();

        assert!(result.converged);
        assert_abs_diff_eq!(result.x[0], 0.0);
        assert_abs_diff_eq!(result.x[1], -1.0);
        assert_abs_diff_eq!(result.fx, -1.0);
    }

    #[test]
    fn minimize_respects_iteration_budget() {
        let f = crate::testing::Rosenbrock;
        let result = OptimizerDriver::builder(&f)
            .with_initial(vec![-1.2, 1.0])
            .with_max_iters(2)
            .build()
            .minimize();

        assert!(!result.converged);
        assert_eq!(result.iters, 2);
        assert!(result.fx < f.apply(&nalgebra::dvector![-1.2, 1.0]));
    }

    struct Nan;

    impl Problem for Nan {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::rect(vec![0.0], vec![1.0])
        }
    }

    impl Function for Nan {
        fn apply<Sx>(&self, _: &nalgebra::Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: nalgebra::storage::Storage<Self::Field, Dyn> + nalgebra::IsContiguous,
        {
            f64::NAN
        }
    }

    #[test]
    fn error_is_reported_as_not_converged() {
        let f = Nan;
        let mut optimizer = OptimizerDriver::builder(&f)
            .with_initial(vec![0.5])
            .build();

        assert_eq!(optimizer.next().unwrap_err(), LbfgsbError::InvalidValue);

        let result = optimizer.minimize();
        assert!(!result.converged);
        assert_eq!(result.x, vec![0.5]);
    }

    #[test]
    fn name() {
        let f = Sphere::new(vec![(-1.0, 1.0)]);
        assert_eq!(OptimizerDriver::new(&f).name(), "L-BFGS-B");
    }
}
