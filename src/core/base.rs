use super::domain::Domain;

/// Extension of the [`nalgebra::RealField`] with constants that are used
/// throughout the numerical code.
pub trait RealField: nalgebra::RealField {
    /// Square root of the machine epsilon.
    const EPSILON_SQRT: Self;

    /// Cubic root of the machine epsilon.
    const EPSILON_CBRT: Self;
}

impl RealField for f32 {
    const EPSILON_SQRT: Self = 0.00034526698;
    const EPSILON_CBRT: Self = 0.0049215667;
}

impl RealField for f64 {
    const EPSILON_SQRT: Self = 0.000000014901161193847656;
    const EPSILON_CBRT: Self = 0.0000060554544523933395;
}

/// The base trait for [`Function`](super::function::Function).
pub trait Problem {
    /// Type of the field, usually f32 or f64.
    type Field: RealField + Copy;

    /// Get the domain (bound constraints) of the problem.
    fn domain(&self) -> Domain<Self::Field>;
}
