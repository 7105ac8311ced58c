//! Tools for derivative-based methods.

use std::ops::Deref;

use nalgebra::{
    convert,
    storage::{Storage, StorageMut},
    DimName, Dyn, IsContiguous, OVector, Vector, U1,
};

use crate::core::{Domain, Function, RealField};

/// Square root of double precision machine epsilon. This value is a standard
/// constant for epsilons in approximating first-order derivate-based concepts.
pub const EPSILON_SQRT: f64 = 0.000000014901161193847656;

/// Gradient vector of a function.
#[derive(Debug, Clone)]
pub struct Gradient<T: RealField + Copy> {
    grad: OVector<T, Dyn>,
}

impl<T: RealField + Copy> Gradient<T> {
    /// Initializes the gradient vector with zeros.
    pub fn zeros(dim: usize) -> Self {
        Self {
            grad: OVector::zeros_generic(Dyn(dim), U1::name()),
        }
    }

    /// Computes the gradient vector of the function in given point. See
    /// [`compute`](Gradient::compute) for more details.
    pub fn new<F, Sx>(f: &F, dom: &Domain<T>, x: &mut Vector<T, Dyn, Sx>, fx: T) -> Self
    where
        F: Function<Field = T>,
        Sx: StorageMut<T, Dyn> + IsContiguous,
    {
        let mut grad = Self::zeros(dom.dim());
        grad.compute(f, dom, x, fx);
        grad
    }

    /// Computes the gradient vector of the function in given point using
    /// forward differences.
    ///
    /// The parameter `x` is mutable to allow temporary mutations avoiding
    /// unnecessary allocations, but after this method ends, the content of the
    /// vector is exactly the same as before.
    ///
    /// The difference step never leaves the domain: if the forward step would
    /// cross the upper bound, the backward step is used instead.
    pub fn compute<F, Sx>(
        &mut self,
        f: &F,
        dom: &Domain<T>,
        x: &mut Vector<T, Dyn, Sx>,
        fx: T,
    ) -> &mut Self
    where
        F: Function<Field = T>,
        Sx: StorageMut<T, Dyn> + IsContiguous,
    {
        let eps: T = convert(EPSILON_SQRT);
        let scale = dom.scale();

        for i in 0..dom.dim() {
            let xi = x[i];

            // Scale the step by x_i itself to keep a reasonable number of
            // significant digits in F(x + e_i * step_i) - F(x). Near zero, the
            // typical magnitude of the variable is taken instead.
            let magnitude = T::one() / scale[i];
            let mut step = eps * xi.abs().max(magnitude);
            if step == T::zero() {
                step = eps;
            }

            if xi + step > dom.upper()[i] && xi - step >= dom.lower()[i] {
                step = -step;
            }

            x[i] = xi + step;
            let fxi = f.apply(&*x);

            // grad[i] = (F(x + e_i * step_i) - F(x)) / step_i.
            self.grad[i] = (fxi - fx) / step;

            // Restore the value.
            x[i] = xi;
        }

        self
    }

    /// Determines whether all components are finite.
    pub fn is_finite(&self) -> bool {
        self.grad.iter().all(|gi| gi.is_finite())
    }
}

impl<T: RealField + Copy> Deref for Gradient<T> {
    type Target = OVector<T, Dyn>;

    fn deref(&self) -> &Self::Target {
        &self.grad
    }
}

/// Computes the projected gradient `P(x - g) - x` in the scaled variables of
/// the domain and returns its infinity norm.
///
/// With scale `s_i`, the scaled variable is `u_i = s_i x_i` and its gradient
/// is `g_i / s_i`. The norm thus does not depend on the units of the
/// variables. The projected gradient is zero exactly in the points satisfying
/// the first-order optimality conditions of a bound-constrained problem.
pub fn projected_gradient_norm<T, Sx, Sg>(
    dom: &Domain<T>,
    x: &Vector<T, Dyn, Sx>,
    grad: &Vector<T, Dyn, Sg>,
) -> T
where
    T: RealField + Copy,
    Sx: Storage<T, Dyn>,
    Sg: Storage<T, Dyn>,
{
    x.iter()
        .zip(grad.iter().zip(dom.scale().iter()))
        .zip(dom.lower().iter().zip(dom.upper().iter()))
        .map(|((xi, (gi, si)), (li, ui))| {
            let pi = (*xi - *gi / (*si * *si)).max(*li).min(*ui);
            (pi - *xi).abs() * *si
        })
        .fold(T::zero(), |acc, pi| acc.max(pi))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::dvector;

    use super::*;
    use crate::core::Problem;
    use crate::testing::{BoxedLinear, Sphere};

    #[test]
    fn sphere_gradient() {
        let f = Sphere::new(vec![(-10.0, 10.0); 2]);
        let dom = f.domain();

        let mut x = dvector![1.0, -2.0];
        let fx = f.apply(&x);
        let grad = Gradient::new(&f, &dom, &mut x, fx);

        assert_abs_diff_eq!(grad[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(grad[1], -4.0, epsilon = 1e-6);
        assert_eq!(x, dvector![1.0, -2.0]);
    }

    #[test]
    fn backward_step_at_upper_bound() {
        let f = BoxedLinear::new(vec![-1.0, 3.0], vec![(0.0, 1.0), (0.0, 1.0)]);
        let dom = f.domain();

        let mut x = dvector![1.0, 1.0];
        let fx = f.apply(&x);
        let grad = Gradient::new(&f, &dom, &mut x, fx);

        assert_abs_diff_eq!(grad[0], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(grad[1], 3.0, epsilon = 1e-6);
        assert!(grad.is_finite());
    }

    #[test]
    fn projected_gradient_vanishes_at_active_bounds() {
        let dom = Domain::rect(vec![0.0, 0.0], vec![1.0, 1.0]);

        // Descent direction points outside of the domain in both variables.
        let x = dvector![1.0, 0.0];
        let grad = dvector![-5.0, 2.0];
        assert_eq!(projected_gradient_norm(&dom, &x, &grad), 0.0);

        // Interior point.
        let x = dvector![0.5, 0.5];
        let grad = dvector![0.1, -0.2];
        assert_abs_diff_eq!(projected_gradient_norm(&dom, &x, &grad), 0.2);
    }

    #[test]
    fn projected_gradient_in_scaled_variables() {
        // Magnitude of the variable is 1000.
        let dom = Domain::rect(vec![2500.0], vec![4000.0]);

        let x = dvector![3000.0];
        let grad = dvector![-1e-4];
        assert_abs_diff_eq!(
            projected_gradient_norm(&dom, &x, &grad),
            0.1,
            epsilon = 1e-12
        );

        // The projection limits the step to the bound.
        let grad = dvector![-1.0];
        assert_abs_diff_eq!(
            projected_gradient_norm(&dom, &x, &grad),
            1.0,
            epsilon = 1e-12
        );
    }
}
