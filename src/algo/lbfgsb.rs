//! Projected limited-memory BFGS method for bound-constrained minimization.
//!
//! The method keeps a short history of curvature pairs _(s, y)_ and uses the
//! [two-loop recursion](https://en.wikipedia.org/wiki/Limited-memory_BFGS) to
//! approximate the Newton direction. Bound constraints are handled in the
//! spirit of L-BFGS-B:
//!
//! * variables sitting on a bound with the gradient pushing them outside are
//!   considered _active_ and are frozen for the current iteration,
//! * the trial points of the line search are projected onto the domain, so
//!   the search follows the piecewise-linear projected path,
//! * convergence is measured by the infinity norm of the projected gradient
//!   `P(x - g) - x`, which vanishes exactly at the first-order critical points
//!   of the bounded problem.
//!
//! The line search backtracks until the Armijo sufficient decrease condition
//! holds. If the full step is accepted right away, it extrapolates along the
//! projected path up to the last breakpoint while the function keeps
//! decreasing. This is what makes the method reach the boundary in a few
//! iterations for objectives with zero curvature (e.g., linear in some
//! variables), which are typical for the physical models in this crate.
//!
//! Gradients are approximated by [finite differences](crate::derivatives).
//! The method is fully deterministic.
//!
//! # References
//!
//! \[1\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
//!
//! \[2\] [A Limited Memory Algorithm for Bound Constrained
//! Optimization](https://doi.org/10.1137/0916069)
//!
//! \[3\] [Projected Newton methods for optimization problems with simple
//! constraints](https://doi.org/10.1137/0320018)

use std::collections::VecDeque;

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{
    convert, storage::StorageMut, ComplexField, DimName, Dyn, IsContiguous, OVector,
    RealField as _, Scalar, Vector, U1,
};
use num_traits::{One, Zero};
use thiserror::Error;

use crate::{
    core::{Domain, Function, Optimizer, Problem, RealField},
    derivatives::{projected_gradient_norm, Gradient},
};

/// Options for [`Lbfgsb`] optimizer.
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct LbfgsbOptions<P: Problem> {
    /// Number of curvature pairs kept in the history. Default: `10`.
    memory: usize,
    /// Relative reduction of the function value below which the process is
    /// considered converged. Default: `2.220446049250313e-9`.
    ftol: P::Field,
    /// Infinity norm of the projected gradient in scaled variables, relative
    /// to the magnitude of the function value, below which the process is
    /// considered converged. Default: `1e-5`.
    pgtol: P::Field,
    /// Coefficient of the Armijo sufficient decrease condition. Default:
    /// `1e-4`.
    armijo: P::Field,
    /// Factor by which the step length is shortened when backtracking.
    /// Default: `0.5`.
    backtrack: P::Field,
    /// Factor by which the step length is prolonged when extrapolating.
    /// Default: `2`.
    expand: P::Field,
    /// Maximum number of function evaluations in one line search, counted
    /// separately for backtracking and extrapolation. Default: `60`.
    max_line_search: usize,
}

impl<P: Problem> Default for LbfgsbOptions<P> {
    fn default() -> Self {
        Self {
            memory: 10,
            ftol: convert(2.220446049250313e-9),
            pgtol: convert(1e-5),
            armijo: convert(1e-4),
            backtrack: convert(0.5),
            expand: convert(2.0),
            max_line_search: 60,
        }
    }
}

/// Error returned from [`Lbfgsb`] optimizer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LbfgsbError {
    /// The function value or its gradient is not finite in the current point.
    #[error("invalid value encountered")]
    InvalidValue,
    /// No step along the steepest descent direction decreased the function.
    #[error("line search failed to decrease the function")]
    LineSearchFailed,
}

struct Correction<T: Scalar> {
    s: OVector<T, Dyn>,
    y: OVector<T, Dyn>,
    rho: T,
}

/// Projected L-BFGS optimizer.
///
/// See [module](self) documentation for more details.
pub struct Lbfgsb<P: Problem> {
    options: LbfgsbOptions<P>,
    grad: Gradient<P::Field>,
    dir: OVector<P::Field, Dyn>,
    trial: OVector<P::Field, Dyn>,
    best: OVector<P::Field, Dyn>,
    free: Vec<bool>,
    alphas: Vec<P::Field>,
    history: VecDeque<Correction<P::Field>>,
    fx: P::Field,
    initialized: bool,
    converged: bool,
    iter: usize,
}

impl<P: Problem> Lbfgsb<P> {
    /// Initializes the optimizer with default options.
    pub fn new(p: &P, dom: &Domain<P::Field>) -> Self {
        Self::with_options(p, dom, LbfgsbOptions::default())
    }

    /// Initializes the optimizer with given options.
    pub fn with_options(_: &P, dom: &Domain<P::Field>, options: LbfgsbOptions<P>) -> Self {
        let dim = Dyn(dom.dim());

        Self {
            grad: Gradient::zeros(dom.dim()),
            dir: OVector::zeros_generic(dim, U1::name()),
            trial: OVector::zeros_generic(dim, U1::name()),
            best: OVector::zeros_generic(dim, U1::name()),
            free: vec![true; dom.dim()],
            alphas: Vec::with_capacity(options.memory),
            history: VecDeque::with_capacity(options.memory),
            options,
            fx: convert(f64::INFINITY),
            initialized: false,
            converged: false,
            iter: 0,
        }
    }

    /// Resets the internal state of the optimizer.
    pub fn reset(&mut self) {
        self.history.clear();
        self.initialized = false;
        self.converged = false;
        self.iter = 0;
    }

    /// Number of iterations performed since the last reset.
    pub fn iter(&self) -> usize {
        self.iter
    }
}

impl<F: Function> Lbfgsb<F> {
    fn next_inner<Sx>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, LbfgsbError>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        let LbfgsbOptions {
            memory,
            ftol,
            pgtol,
            armijo,
            backtrack,
            expand,
            max_line_search,
        } = self.options;

        let Self {
            grad,
            dir,
            trial,
            best,
            free,
            alphas,
            history,
            fx,
            initialized,
            converged,
            iter,
            ..
        } = self;

        let zero = F::Field::zero();
        let one = F::Field::one();

        if !*initialized {
            dom.project(x);
            *fx = f.apply(&*x);

            if !fx.is_finite() {
                debug!("initial point has invalid value {}", fx);
                return Err(LbfgsbError::InvalidValue);
            }

            grad.compute(f, dom, x, *fx);
            *initialized = true;
        }

        if !grad.is_finite() {
            return Err(LbfgsbError::InvalidValue);
        }

        *iter += 1;
        *converged = false;

        // Scaled variables, relative to the function value.
        let pg_norm = projected_gradient_norm(dom, &*x, &**grad);
        if pg_norm <= pgtol * fx.abs() {
            debug!(
                "projected gradient norm {} <= {} * |fx|, converged",
                pg_norm, pgtol
            );
            *converged = true;
            return Ok(*fx);
        }

        // Freeze the variables that are on the bound and would leave the
        // domain along the steepest descent direction.
        let lower = dom.lower();
        let upper = dom.upper();
        for (i, free_i) in free.iter_mut().enumerate() {
            let gi = grad[i];
            *free_i = !((x[i] <= lower[i] && gi > zero) || (x[i] >= upper[i] && gi < zero));
        }

        // Two-loop recursion on the free variables.
        if history.is_empty() {
            steepest_descent(dir, &**grad, dom.scale(), free);
        } else {
            dir.copy_from(&**grad);
            mask(dir, free);
        }

        alphas.clear();
        for Correction { s, y, rho } in history.iter().rev() {
            let alpha = *rho * s.dot(&*dir);
            dir.axpy(-alpha, y, one);
            alphas.push(alpha);
        }

        if let Some(Correction { s, y, .. }) = history.back() {
            let gamma = s.dot(y) / y.dot(y);
            *dir *= gamma;
        }

        for (Correction { s, y, rho }, alpha) in history.iter().zip(alphas.iter().rev()) {
            let beta = *rho * y.dot(&*dir);
            dir.axpy(*alpha - beta, s, one);
        }

        if !history.is_empty() {
            dir.neg_mut();
            mask(dir, free);
        }

        if dir.dot(&**grad) >= zero {
            // The quasi-Newton approximation lost positive definiteness on the
            // free subspace. Fall back to the steepest descent.
            debug!("not a descent direction, resetting history");
            history.clear();
            steepest_descent(dir, &**grad, dom.scale(), free);
        }

        // Step length after which the projected path does not change anymore.
        let alpha_max = dir
            .iter()
            .zip(x.iter())
            .zip(lower.iter().zip(upper.iter()))
            .filter(|((di, _), _)| **di != zero)
            .map(|((di, xi), (li, ui))| {
                if *di > zero {
                    (*ui - *xi) / *di
                } else {
                    (*li - *xi) / *di
                }
            })
            .fold(zero, |acc, alpha| acc.max(alpha));

        let fx_prev = *fx;
        let dir = &*dir;

        let eval = |alpha: F::Field,
                    trial: &mut OVector<F::Field, Dyn>,
                    x: &Vector<F::Field, Dyn, Sx>| {
            trial.copy_from(x);
            trial.axpy(alpha, dir, one);
            dom.project(trial);

            // Sufficient decrease is measured along the projected path, which
            // may differ from the direction.
            let decrease = grad
                .iter()
                .zip(trial.iter().zip(x.iter()))
                .fold(zero, |acc, (gi, (ti, xi))| acc + *gi * (*ti - *xi));

            let ft = f.apply(&*trial);
            let accepted = ft.is_finite() && ft < fx_prev && ft <= fx_prev + armijo * decrease;
            (ft, accepted)
        };

        let mut alpha = one.min(alpha_max);
        let mut backtracks = 0;
        let (mut f_best, mut accepted) = eval(alpha, trial, x);

        while !accepted && backtracks < max_line_search {
            alpha *= backtrack;
            backtracks += 1;
            let (ft, ok) = eval(alpha, trial, x);
            f_best = ft;
            accepted = ok;
        }

        if !accepted {
            if history.is_empty() {
                // No decrease is achievable even along the steepest descent,
                // the remaining gradient is the noise of finite differences.
                if pg_norm <= pgtol * fx.abs().max(one) {
                    debug!("line search stalled with |pg| = {}, converged", pg_norm);
                    *converged = true;
                    return Ok(*fx);
                }

                debug!("line search failed after {} backtracks", backtracks);
                return Err(LbfgsbError::LineSearchFailed);
            }

            // Try again with the steepest descent in the next iteration.
            debug!("line search failed, resetting history");
            history.clear();
            return Ok(*fx);
        }

        best.copy_from(&*trial);

        if backtracks == 0 {
            let mut expansions = 0;

            while alpha < alpha_max && expansions < max_line_search {
                let alpha_next = (alpha * expand).min(alpha_max);
                let (ft, ok) = eval(alpha_next, trial, x);

                if !ok || ft >= f_best {
                    break;
                }

                alpha = alpha_next;
                f_best = ft;
                best.copy_from(&*trial);
                expansions += 1;
            }
        }

        // Curvature pair of the accepted step.
        let s = &*best - &*x;
        x.copy_from(&*best);
        *fx = f_best;

        let y_prev = grad.clone_owned();
        grad.compute(f, dom, x, *fx);
        let y = &**grad - y_prev;

        let sy = s.dot(&y);
        if sy > F::Field::EPSILON_SQRT * s.norm() * y.norm() {
            if history.len() == memory {
                history.pop_front();
            }
            history.push_back(Correction {
                s,
                y,
                rho: one / sy,
            });
        }

        let active = free.iter().filter(|free_i| !**free_i).count();
        debug!(
            "iter {}: fx = {}\talpha = {} (max {})\t|pg| = {}\tactive = {}",
            iter, fx, alpha, alpha_max, pg_norm, active
        );

        let scale = fx_prev.abs().max(fx.abs()).max(one);
        if fx_prev - *fx <= ftol * scale {
            debug!("relative reduction {} <= {}, converged", (fx_prev - *fx) / scale, ftol);
            *converged = true;
        }

        Ok(*fx)
    }
}

impl<F: Function> Optimizer<F> for Lbfgsb<F> {
    const NAME: &'static str = "L-BFGS-B";

    type Error = LbfgsbError;

    fn opt_next<Sx>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &mut Vector<F::Field, Dyn, Sx>,
    ) -> Result<F::Field, Self::Error>
    where
        Sx: StorageMut<F::Field, Dyn> + IsContiguous,
    {
        self.next_inner(f, dom, x)
    }

    fn is_converged(&self) -> bool {
        self.converged
    }
}

/// Steepest descent direction in scaled variables, normalized to unit
/// infinity norm in the scaled space.
fn steepest_descent<T: RealField + Copy>(
    dir: &mut OVector<T, Dyn>,
    grad: &OVector<T, Dyn>,
    scale: &OVector<T, Dyn>,
    free: &[bool],
) {
    dir.iter_mut()
        .zip(grad.iter().zip(scale.iter()))
        .for_each(|(di, (gi, si))| *di = -*gi / (*si * *si));
    mask(dir, free);

    let norm = dir
        .iter()
        .zip(scale.iter())
        .fold(T::zero(), |acc, (di, si)| acc.max((*di * *si).abs()));

    if norm > T::zero() && norm.is_finite() {
        *dir /= norm;
    }
}

fn mask<T: RealField + Copy>(v: &mut OVector<T, Dyn>, free: &[bool]) {
    v.iter_mut()
        .zip(free.iter())
        .filter(|(_, free_i)| !**free_i)
        .for_each(|(vi, _)| *vi = T::zero());
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use super::*;
    use crate::testing::*;

    fn run<F: Function>(
        f: &F,
        x: &mut OVector<F::Field, Dyn>,
        max_iters: usize,
    ) -> Result<bool, LbfgsbError> {
        let dom = f.domain();
        let mut optimizer = Lbfgsb::new(f, &dom);

        for _ in 0..max_iters {
            optimizer.opt_next(f, &dom, x)?;

            if optimizer.is_converged() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    #[test]
    fn sphere_interior_optimum() {
        let f = Sphere::new(vec![(-10.0, 10.0); 3]);

        for mut x in f.initials() {
            assert!(run(&f, &mut x, 100).unwrap());
            assert!(f.is_optimum(&x, 1e-5), "x = {:?}", x.as_slice());
        }
    }

    #[test]
    fn sphere_optimum_on_boundary() {
        let f = Sphere::new(vec![(1.0, 5.0), (-3.0, -1.0)]);

        for mut x in f.initials() {
            assert!(run(&f, &mut x, 100).unwrap());
            assert!(f.is_optimum(&x, 1e-5), "x = {:?}", x.as_slice());
        }
    }

    #[test]
    fn linear_reaches_corner() {
        let f = BoxedLinear::new(
            vec![1.0, -2.0, -1e-3],
            vec![(0.0, 1.0), (0.0, 1.0), (2500.0, 4000.0)],
        );

        for mut x in f.initials() {
            assert!(run(&f, &mut x, 50).unwrap());
            assert!(f.is_optimum(&x, 1e-6), "x = {:?}", x.as_slice());
        }
    }

    #[test]
    fn tiny_objective_reaches_corner() {
        let f = BoxedLinear::new(vec![1e-12, -2e-12], vec![(0.0, 1.0), (0.0, 1.0)]);

        for mut x in f.initials() {
            assert!(run(&f, &mut x, 50).unwrap());
            assert!(f.is_optimum(&x, 1e-6), "x = {:?}", x.as_slice());
        }
    }

    #[test]
    fn rosenbrock() {
        let f = Rosenbrock;

        for mut x in f.initials() {
            // Finite differences may stop the line search close to the
            // optimum, which is still acceptable here.
            let _ = run(&f, &mut x, 500);
            assert!(f.is_optimum(&x, 1e-3), "x = {:?}", x.as_slice());
        }
    }

    #[test]
    fn starts_from_projected_point() {
        let f = Sphere::new(vec![(1.0, 2.0)]);
        let dom = f.domain();
        let mut optimizer = Lbfgsb::new(&f, &dom);

        let mut x = dvector![-5.0];
        let fx = optimizer.opt_next(&f, &dom, &mut x).unwrap();

        assert_abs_diff_eq!(x[0], 1.0);
        assert_abs_diff_eq!(fx, 1.0);
        assert!(optimizer.is_converged());
    }

    #[test]
    fn deterministic() {
        let f = Rosenbrock;
        let x0 = f.initials().remove(0);

        let mut x1 = x0.clone();
        let mut x2 = x0;
        let _ = run(&f, &mut x1, 30);
        let _ = run(&f, &mut x2, 30);

        assert_eq!(x1, x2);
    }

    struct Nan;

    impl Problem for Nan {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::rect(vec![0.0], vec![1.0])
        }
    }

    impl Function for Nan {
        fn apply<Sx>(&self, _: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: nalgebra::storage::Storage<Self::Field, Dyn> + IsContiguous,
        {
            f64::NAN
        }
    }

    #[test]
    fn invalid_value() {
        let f = Nan;
        let mut x = dvector![0.5];

        assert_eq!(run(&f, &mut x, 10), Err(LbfgsbError::InvalidValue));
    }
}
