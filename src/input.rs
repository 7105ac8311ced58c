//! Scalar inputs of the process models.
//!
//! All values are read-only snapshots supplied by the caller. Absent values
//! are never defaulted: reading a value that was not provided results in
//! [`InputError::Missing`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Cyanide dosage.
pub const CYANIDE: &str = "CN (kg/t)";
/// Lime dosage.
pub const LIME: &str = "Lime (kg/t)";
/// Dosage of the primary collector.
pub const COLLECTOR_A: &str = "Collector A (g/t)";
/// Dosage of the secondary collector.
pub const COLLECTOR_B: &str = "Collector B (g/t)";
/// Frother dosage.
pub const FROTHER: &str = "Frother (mL/t)";

/// Keys of all known reagents.
pub const REAGENTS: [&str; 5] = [CYANIDE, LIME, COLLECTOR_A, COLLECTOR_B, FROTHER];

/// Error of reading an input value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    /// Required value was not provided.
    #[error("missing input value: {0}")]
    Missing(String),
    /// Value is negative or not finite.
    #[error("invalid input value {value} for {name}")]
    Invalid {
        /// Name of the value.
        name: String,
        /// The invalid value.
        value: f64,
    },
    /// Particle size descriptor is not recognized.
    #[error("unknown particle size descriptor: {0}")]
    UnknownParticleSize(String),
}

/// Particle size descriptor, the percentage of particles passing given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParticleSize {
    /// 10 % passing size.
    P10,
    /// 50 % passing size.
    P50,
    /// 80 % passing size.
    P80,
}

impl ParticleSize {
    /// All descriptors, from finest to coarsest.
    pub const ALL: [ParticleSize; 3] = [ParticleSize::P10, ParticleSize::P50, ParticleSize::P80];

    /// Label of the descriptor including the unit.
    pub fn label(&self) -> &'static str {
        match self {
            ParticleSize::P10 => "P10 (microns)",
            ParticleSize::P50 => "P50 (microns)",
            ParticleSize::P80 => "P80 (microns)",
        }
    }
}

impl fmt::Display for ParticleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ParticleSize {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .strip_suffix("(microns)")
            .unwrap_or(s)
            .trim();

        match code {
            "P10" => Ok(ParticleSize::P10),
            "P50" => Ok(ParticleSize::P50),
            "P80" => Ok(ParticleSize::P80),
            _ => Err(InputError::UnknownParticleSize(s.to_string())),
        }
    }
}

/// Set of scalar inputs for the process models.
///
/// ```rust
/// use mineral_recovery::input::{InputSet, CYANIDE};
///
/// let inputs = InputSet::new()
///     .with_gold_head_grade(2.0)
///     .with_throughput(100.0)
///     .with_reagent(CYANIDE, 0.5);
///
/// assert_eq!(inputs.reagent(CYANIDE), Ok(0.5));
/// assert!(inputs.particle_diameter().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSet {
    gold_head_grade: Option<f64>,
    throughput: Option<f64>,
    reagents: BTreeMap<String, f64>,
    particle_diameter: Option<f64>,
    particle_size: Option<ParticleSize>,
}

impl InputSet {
    /// Creates an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the gold head grade [g/t].
    pub fn with_gold_head_grade(mut self, grade: f64) -> Self {
        self.gold_head_grade = Some(grade);
        self
    }

    /// Sets the throughput.
    pub fn with_throughput(mut self, throughput: f64) -> Self {
        self.throughput = Some(throughput);
        self
    }

    /// Sets the dosage of a reagent. The key must match exactly, see
    /// [`REAGENTS`].
    pub fn with_reagent(mut self, name: impl Into<String>, dosage: f64) -> Self {
        self.reagents.insert(name.into(), dosage);
        self
    }

    /// Sets the particle diameter used by the gravity separation model.
    pub fn with_particle_diameter(mut self, diameter: f64) -> Self {
        self.particle_diameter = Some(diameter);
        self
    }

    /// Sets the particle size descriptor.
    pub fn with_particle_size(mut self, size: ParticleSize) -> Self {
        self.particle_size = Some(size);
        self
    }

    /// Gold head grade.
    pub fn gold_head_grade(&self) -> Result<f64, InputError> {
        require("gold head grade", self.gold_head_grade)
    }

    /// Throughput.
    pub fn throughput(&self) -> Result<f64, InputError> {
        require("throughput", self.throughput)
    }

    /// Dosage of given reagent.
    pub fn reagent(&self, name: &str) -> Result<f64, InputError> {
        require(name, self.reagents.get(name).copied())
    }

    /// Particle diameter for the gravity separation model.
    pub fn particle_diameter(&self) -> Result<f64, InputError> {
        require("particle diameter", self.particle_diameter)
    }

    /// Particle size descriptor, if provided.
    pub fn particle_size(&self) -> Option<ParticleSize> {
        self.particle_size
    }

    /// Iterates over all provided reagent dosages.
    pub fn reagents(&self) -> impl Iterator<Item = (&str, f64)> {
        self.reagents
            .iter()
            .map(|(name, dosage)| (name.as_str(), *dosage))
    }
}

fn require(name: &str, value: Option<f64>) -> Result<f64, InputError> {
    match value {
        Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Some(value) => Err(InputError::Invalid {
            name: name.to_string(),
            value,
        }),
        None => Err(InputError::Missing(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values() {
        let inputs = InputSet::new();

        assert_eq!(
            inputs.gold_head_grade(),
            Err(InputError::Missing("gold head grade".to_string()))
        );
        assert_eq!(
            inputs.throughput(),
            Err(InputError::Missing("throughput".to_string()))
        );
        assert_eq!(
            inputs.reagent(CYANIDE),
            Err(InputError::Missing(CYANIDE.to_string()))
        );
    }

    #[test]
    fn invalid_values() {
        let inputs = InputSet::new()
            .with_throughput(-1.0)
            .with_reagent(LIME, f64::NAN);

        assert_eq!(
            inputs.throughput(),
            Err(InputError::Invalid {
                name: "throughput".to_string(),
                value: -1.0
            })
        );
        assert!(matches!(
            inputs.reagent(LIME),
            Err(InputError::Invalid { .. })
        ));
    }

    #[test]
    fn zero_is_valid() {
        let inputs = InputSet::new().with_gold_head_grade(0.0);
        assert_eq!(inputs.gold_head_grade(), Ok(0.0));
    }

    #[test]
    fn reagent_key_must_match_exactly() {
        let inputs = InputSet::new().with_reagent("CN", 0.5);

        assert!(inputs.reagent(CYANIDE).is_err());
        assert_eq!(inputs.reagents().collect::<Vec<_>>(), vec![("CN", 0.5)]);
    }

    #[test]
    fn particle_size_parsing() {
        assert_eq!("P10 (microns)".parse(), Ok(ParticleSize::P10));
        assert_eq!("P50".parse(), Ok(ParticleSize::P50));
        assert_eq!(" P80 (microns) ".parse(), Ok(ParticleSize::P80));
        assert_eq!(
            "P90 (microns)".parse::<ParticleSize>(),
            Err(InputError::UnknownParticleSize("P90 (microns)".to_string()))
        );

        for size in ParticleSize::ALL {
            assert_eq!(size.to_string().parse(), Ok(size));
        }
    }
}
