//! Problem domain definition (dimensionality, bound constraints).

use std::iter::FromIterator;

use na::{Dim, DimName};
use nalgebra as na;
use nalgebra::{storage::Storage, storage::StorageMut, OVector, Vector};
use thiserror::Error;

use crate::analysis::estimate_magnitude_from_bounds;
use crate::core::RealField;

/// Error of a malformed bound box.
///
/// Models in this crate have fixed bounds, so this error indicates a defect
/// in the model definition rather than invalid user input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// No bounds were given.
    #[error("empty domain")]
    Empty,
    /// Lower and upper bounds have different lengths.
    #[error("lower ({lower}) and upper ({upper}) bounds have different size")]
    DimensionMismatch {
        /// Number of lower bounds.
        lower: usize,
        /// Number of upper bounds.
        upper: usize,
    },
    /// Lower bound is greater than the upper bound or one of them is NaN.
    #[error("invalid bounds [{lower}, {upper}] for variable {index}")]
    InvalidBounds {
        /// Index of the variable.
        index: usize,
        /// Lower bound (as f64 for reporting).
        lower: f64,
        /// Upper bound (as f64 for reporting).
        upper: f64,
    },
}

/// Rectangular domain of a problem.
#[derive(Debug, Clone)]
pub struct Domain<T: RealField + Copy> {
    lower: OVector<T, na::Dyn>,
    upper: OVector<T, na::Dyn>,
    scale: OVector<T, na::Dyn>,
}

impl<T: RealField + Copy> Domain<T> {
    /// Creates rectangular domain with given lower and upper bounds.
    ///
    /// # Panics
    ///
    /// Panics if the bounds are malformed (see [`DomainError`]). Use
    /// [`Domain::try_rect`] for a fallible variant.
    pub fn rect(lower: Vec<T>, upper: Vec<T>) -> Self {
        match Self::try_rect(lower, upper) {
            Ok(dom) => dom,
            Err(error) => panic!("{}", error),
        }
    }

    /// Creates rectangular domain with given lower and upper bounds, checking
    /// that the bounds are well-formed.
    pub fn try_rect(lower: Vec<T>, upper: Vec<T>) -> Result<Self, DomainError> {
        if lower.len() != upper.len() {
            return Err(DomainError::DimensionMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }

        if lower.is_empty() {
            return Err(DomainError::Empty);
        }

        // Written so that NaN bounds are rejected too.
        if let Some(index) = lower
            .iter()
            .zip(upper.iter())
            .position(|(l, u)| !(*l <= *u))
        {
            return Err(DomainError::InvalidBounds {
                index,
                lower: to_f64(lower[index]),
                upper: to_f64(upper[index]),
            });
        }

        let scale = lower
            .iter()
            .copied()
            .zip(upper.iter().copied())
            .map(|(l, u)| T::one() / estimate_magnitude_from_bounds(l, u));

        let dim = na::Dyn(lower.len());
        let scale = OVector::from_iterator_generic(dim, na::U1::name(), scale);
        let lower = OVector::from_vec_generic(dim, na::U1::name(), lower);
        let upper = OVector::from_vec_generic(dim, na::U1::name(), upper);

        Ok(Self {
            lower,
            upper,
            scale,
        })
    }

    /// Sets a custom scale for the domain.
    ///
    /// Scale of a variable is the inverse of its expected magnitude.
    /// Appropriate scaling is crucial for finite differences on problems with
    /// highly varying magnitudes of variables (e.g., Hamaker constant next to
    /// temperature).
    pub fn with_scale(mut self, scale: Vec<T>) -> Self {
        assert!(
            scale.len() == self.lower.nrows(),
            "scale has invalid dimension"
        );

        let dim = na::Dyn(self.lower.nrows());
        self.scale = OVector::from_vec_generic(dim, na::U1::name(), scale);
        self
    }

    /// Gets the dimensionality of the domain.
    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// Gets the lower bounds.
    pub fn lower(&self) -> &OVector<T, na::Dyn> {
        &self.lower
    }

    /// Gets the upper bounds.
    pub fn upper(&self) -> &OVector<T, na::Dyn> {
        &self.upper
    }

    /// Gets the scale of the variables.
    pub fn scale(&self) -> &OVector<T, na::Dyn> {
        &self.scale
    }

    /// Determines whether the point lies in the domain (bounds inclusive).
    pub fn contains<D, Sx>(&self, x: &Vector<T, D, Sx>) -> bool
    where
        D: Dim,
        Sx: Storage<T, D>,
    {
        x.nrows() == self.dim()
            && self
                .lower
                .iter()
                .zip(self.upper.iter())
                .zip(x.iter())
                .all(|((li, ui), xi)| li <= xi && xi <= ui)
    }

    /// Projects given point into the domain.
    ///
    /// Returns `true` if the point was not feasible.
    pub fn project<D, Sx>(&self, x: &mut Vector<T, D, Sx>) -> bool
    where
        D: Dim,
        Sx: StorageMut<T, D>,
    {
        let mut not_feasible = false;

        self.lower
            .iter()
            .zip(self.upper.iter())
            .zip(x.iter_mut())
            .for_each(|((li, ui), xi)| {
                if &*xi < li {
                    *xi = *li;
                    not_feasible = true;
                } else if &*xi > ui {
                    *xi = *ui;
                    not_feasible = true;
                }
            });

        not_feasible
    }

    /// Projects given point into the domain in given dimension.
    pub fn project_in<D, Sx>(&self, x: &mut Vector<T, D, Sx>, i: usize) -> bool
    where
        D: Dim,
        Sx: StorageMut<T, D>,
    {
        let li = self.lower[i];
        let ui = self.upper[i];
        let xi = &mut x[i];

        if *xi < li {
            *xi = li;
            true
        } else if *xi > ui {
            *xi = ui;
            true
        } else {
            false
        }
    }
}

impl<T: RealField + Copy> FromIterator<(T, T)> for Domain<T> {
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let (lower, upper): (Vec<_>, Vec<_>) = iter.into_iter().unzip();
        Self::rect(lower, upper)
    }
}

fn to_f64<T: RealField + Copy>(value: T) -> f64 {
    value.to_subset().unwrap_or(f64::NAN)
}
