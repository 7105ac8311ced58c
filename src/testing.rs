//! Testing functions and utilities useful for benchmarking, debugging and
//! smoke testing of bounded optimizers.
//!
//! All functions have a known optimum inside (or on the boundary of) their
//! domain so that convergence can be checked exactly.

#![allow(unused)]

use nalgebra::{storage::Storage, DVector, Dyn, IsContiguous, Vector};

use crate::core::{Domain, Function, Problem};

/// Extension of the [`Function`] trait that provides additional information
/// that is useful for testing optimizers.
pub trait TestFunction: Function<Field = f64> {
    /// Standard initial values for the problem. Using the same initial values
    /// is essential for fair comparison of methods.
    fn initials(&self) -> Vec<DVector<f64>>;

    /// The (unique) optimum of the function in its domain.
    fn optimum(&self) -> DVector<f64>;

    /// Test if given point is the optimum, given the tolerance `eps`.
    fn is_optimum<Sx>(&self, x: &Vector<f64, Dyn, Sx>, eps: f64) -> bool
    where
        Sx: Storage<f64, Dyn> + IsContiguous,
    {
        (x - self.optimum()).amax() <= eps
    }
}

/// [Sphere function](https://en.wikipedia.org/wiki/Test_functions_for_optimization),
/// `f(x) = sum(x_i^2)`.
///
/// When the box contains the origin, the optimum is the origin. Otherwise it
/// is the projection of the origin into the box.
#[derive(Debug, Clone)]
pub struct Sphere {
    bounds: Vec<(f64, f64)>,
}

impl Sphere {
    /// Initializes the function with given bounds.
    pub fn new(bounds: Vec<(f64, f64)>) -> Self {
        assert!(!bounds.is_empty(), "empty bounds");
        Self { bounds }
    }
}

impl Problem for Sphere {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        self.bounds.iter().copied().collect()
    }
}

impl Function for Sphere {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        x.norm_squared()
    }
}

impl TestFunction for Sphere {
    fn initials(&self) -> Vec<DVector<f64>> {
        let upper = DVector::from_iterator(self.bounds.len(), self.bounds.iter().map(|(_, u)| *u));
        let mid = DVector::from_iterator(
            self.bounds.len(),
            self.bounds.iter().map(|(l, u)| 0.25 * l + 0.75 * u),
        );
        vec![upper, mid]
    }

    fn optimum(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.bounds.len(),
            self.bounds.iter().map(|(l, u)| 0f64.max(*l).min(*u)),
        )
    }
}

/// Linear function `f(x) = c . x` in a box.
///
/// The optimum is the box corner selected by the signs of the coefficients.
/// Linear objectives are a stress test for the line search, since their
/// minimum is always on the boundary and the curvature is zero.
#[derive(Debug, Clone)]
pub struct BoxedLinear {
    coeffs: Vec<f64>,
    bounds: Vec<(f64, f64)>,
}

impl BoxedLinear {
    /// Initializes the function with given coefficients and bounds.
    pub fn new(coeffs: Vec<f64>, bounds: Vec<(f64, f64)>) -> Self {
        assert!(
            coeffs.len() == bounds.len(),
            "coefficients and bounds have different size"
        );
        Self { coeffs, bounds }
    }
}

impl Problem for BoxedLinear {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        self.bounds.iter().copied().collect()
    }
}

impl Function for BoxedLinear {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.coeffs.iter().zip(x.iter()).map(|(c, xi)| c * xi).sum()
    }
}

impl TestFunction for BoxedLinear {
    fn initials(&self) -> Vec<DVector<f64>> {
        let mid = DVector::from_iterator(
            self.bounds.len(),
            self.bounds.iter().map(|(l, u)| 0.5 * (l + u)),
        );
        vec![mid]
    }

    fn optimum(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.bounds.len(),
            self.coeffs
                .iter()
                .zip(self.bounds.iter())
                .map(|(c, (l, u))| if *c > 0.0 { *l } else { *u }),
        )
    }
}

/// Two-dimensional [Rosenbrock
/// function](https://en.wikipedia.org/wiki/Rosenbrock_function) in the box
/// `[-2, 2] x [-1, 3]` with the optimum at `(1, 1)`.
///
/// The global minimum is inside a long, narrow, parabolic shaped flat valley.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rosenbrock;

impl Problem for Rosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        [(-2.0, 2.0), (-1.0, 3.0)].into_iter().collect()
    }
}

impl Function for Rosenbrock {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2)
    }
}

impl TestFunction for Rosenbrock {
    fn initials(&self) -> Vec<DVector<f64>> {
        vec![
            DVector::from_vec(vec![-1.2, 1.0]),
            DVector::from_vec(vec![0.5, 0.5]),
        ]
    }

    fn optimum(&self) -> DVector<f64> {
        DVector::from_vec(vec![1.0, 1.0])
    }
}
