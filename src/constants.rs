//! Physical constants shared by the process models.

/// Fixed scientific constants used by the process models.
///
/// The value is passed explicitly to every model, so alternative constants
/// (e.g., a calibrated activation energy) can be used side by side with the
/// [standard](PhysicalConstants::STANDARD) ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalConstants {
    /// Pre-exponential factor of the Arrhenius equation `A` [1/s].
    pub pre_exponential_factor: f64,
    /// Activation energy `Ea` [J/mol].
    pub activation_energy: f64,
    /// Universal gas constant `R` [J/(mol K)].
    pub gas_constant: f64,
    /// Permittivity of free space `e0` [F/m].
    pub vacuum_permittivity: f64,
    /// Gravitational acceleration `g` [m/s^2].
    pub gravitational_acceleration: f64,
    /// Density of the carrier fluid [kg/m^3].
    pub fluid_density: f64,
}

impl PhysicalConstants {
    /// Standard values.
    pub const STANDARD: Self = Self {
        pre_exponential_factor: 1e11,
        activation_energy: 50000.0,
        gas_constant: 8.314,
        vacuum_permittivity: 8.5e-12,
        gravitational_acceleration: 9.81,
        fluid_density: 1000.0,
    };

    /// Rate constant at given absolute temperature by the Arrhenius equation,
    /// `k(T) = A exp(-Ea / (R T))`.
    pub fn arrhenius_rate(&self, temperature: f64) -> f64 {
        self.pre_exponential_factor
            * (-self.activation_energy / (self.gas_constant * temperature)).exp()
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::STANDARD
    }
}
