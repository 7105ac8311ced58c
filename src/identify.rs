//! Identification of the ore type from the mineralogy.
//!
//! The ore type is determined by a fixed sequence of threshold rules over the
//! mineral percentages. The first matching rule wins. The identification is
//! independent of the recovery computation. It only decides whether a
//! simulation makes sense at all (see [`OreType::is_known`]).

use std::collections::BTreeMap;
use std::fmt;
use std::iter::FromIterator;

use crate::input::InputError;

/// Names of all minerals the identification reads.
pub const MINERALS: [&str; 14] = [
    "Iron",
    "Sulphur",
    "Arsenic",
    "Copper",
    "Zinc",
    "Lead",
    "Calcium Carbonate",
    "Iron Carbonate",
    "Silica",
    "Potassium",
    "Sodium",
    "Calcium",
    "Aluminum",
    "Silicon",
];

/// Composition of the ore, mineral name to percentage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mineralogy {
    minerals: BTreeMap<String, f64>,
}

impl Mineralogy {
    /// Creates an empty mineralogy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the percentage of a mineral.
    pub fn with(mut self, mineral: impl Into<String>, percentage: f64) -> Self {
        self.minerals.insert(mineral.into(), percentage);
        self
    }

    /// Percentage of given mineral.
    pub fn get(&self, mineral: &str) -> Result<f64, InputError> {
        match self.minerals.get(mineral) {
            Some(value) if value.is_finite() && (0.0..=100.0).contains(value) => Ok(*value),
            Some(value) => Err(InputError::Invalid {
                name: mineral.to_string(),
                value: *value,
            }),
            None => Err(InputError::Missing(mineral.to_string())),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Mineralogy {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            minerals: iter
                .into_iter()
                .map(|(mineral, percentage)| (mineral.into(), percentage))
                .collect(),
        }
    }
}

/// Type of the ore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OreType {
    /// Iron sulfide.
    Pyrite,
    /// Iron arsenic sulfide.
    Arsenopyrite,
    /// Copper iron sulfide.
    Chalcopyrite,
    /// Zinc sulfide.
    Sphalerite,
    /// Lead sulfide.
    Galena,
    /// Calcium carbonate.
    Calcite,
    /// Iron carbonate.
    Siderite,
    /// Silica.
    Quartz,
    /// Potassium, sodium and calcium aluminosilicates.
    Feldspars,
    /// Aluminum and calcium rich clay.
    Montmorillonite,
    /// Aluminum silicate clay.
    Kaolinite,
    /// None of the rules matched.
    Unknown,
}

impl OreType {
    /// Name of the ore type.
    pub fn name(&self) -> &'static str {
        match self {
            OreType::Pyrite => "Pyrite",
            OreType::Arsenopyrite => "Arsenopyrite",
            OreType::Chalcopyrite => "Chalcopyrite",
            OreType::Sphalerite => "Sphalerite",
            OreType::Galena => "Galena",
            OreType::Calcite => "Calcite",
            OreType::Siderite => "Siderite",
            OreType::Quartz => "Quartz",
            OreType::Feldspars => "Feldspars",
            OreType::Montmorillonite => "Montmorillonite",
            OreType::Kaolinite => "Kaolinite",
            OreType::Unknown => "Unknown",
        }
    }

    /// Whether the ore was identified. Unknown ores must not be simulated.
    pub fn is_known(&self) -> bool {
        *self != OreType::Unknown
    }
}

impl fmt::Display for OreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of the identification.
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    /// Identified ore type.
    pub ore_type: OreType,
    /// Human-readable reason naming the deciding minerals and their values.
    pub reason: String,
}

/// Identifies the ore type.
///
/// All [minerals](MINERALS) must be present in the mineralogy, even if the
/// deciding rule does not need them.
///
/// ```rust
/// use mineral_recovery::identify::{identify, Mineralogy, OreType, MINERALS};
///
/// let mineralogy: Mineralogy = MINERALS
///     .iter()
///     .map(|mineral| (*mineral, if *mineral == "Zinc" { 60.0 } else { 0.0 }))
///     .collect();
///
/// let identification = identify(&mineralogy).unwrap();
/// assert_eq!(identification.ore_type, OreType::Sphalerite);
/// assert_eq!(identification.reason, "Zinc[60.0] is 50%+.");
/// ```
pub fn identify(mineralogy: &Mineralogy) -> Result<Identification, InputError> {
    let iron = mineralogy.get("Iron")?;
    let sulphur = mineralogy.get("Sulphur")?;
    let arsenic = mineralogy.get("Arsenic")?;
    let copper = mineralogy.get("Copper")?;
    let zinc = mineralogy.get("Zinc")?;
    let lead = mineralogy.get("Lead")?;
    let calcium_carbonate = mineralogy.get("Calcium Carbonate")?;
    let iron_carbonate = mineralogy.get("Iron Carbonate")?;
    let silica = mineralogy.get("Silica")?;
    let potassium = mineralogy.get("Potassium")?;
    let sodium = mineralogy.get("Sodium")?;
    let calcium = mineralogy.get("Calcium")?;
    let aluminum = mineralogy.get("Aluminum")?;
    let silicon = mineralogy.get("Silicon")?;

    let (ore_type, reason) = if iron >= 40.0 && sulphur >= 40.0 {
        (
            OreType::Pyrite,
            format!(
                "Iron[{:?}] is 40%+ and Sulphur[{:?}] is between 40 and 50%.",
                iron, sulphur
            ),
        )
    } else if arsenic >= 33.0 && iron >= 25.0 && sulphur >= 35.0 {
        (
            OreType::Arsenopyrite,
            format!(
                "Arsenic[{:?}] is 33%+, Iron[{:?}] is between 25 and 30%, and Sulphur[{:?}] is between 35 and 40%.",
                arsenic, iron, sulphur
            ),
        )
    } else if copper >= 35.0 && iron >= 15.0 && sulphur >= 35.0 {
        (
            OreType::Chalcopyrite,
            format!(
                "Copper[{:?}] is 35%+, Iron[{:?}] is between 15 and 20%, and Sulphur[{:?}] is between 35 and 45%.",
                copper, iron, sulphur
            ),
        )
    } else if zinc >= 50.0 {
        (OreType::Sphalerite, format!("Zinc[{:?}] is 50%+.", zinc))
    } else if lead >= 85.0 {
        (OreType::Galena, format!("Lead[{:?}] is 85%+.", lead))
    } else if calcium_carbonate >= 80.0 {
        (
            OreType::Calcite,
            format!("Calcium Carbonate[{:?}] is 80%+.", calcium_carbonate),
        )
    } else if iron_carbonate >= 75.0 {
        (
            OreType::Siderite,
            format!("Iron Carbonate[{:?}] is 75%+.", iron_carbonate),
        )
    } else if silica >= 90.0 {
        (OreType::Quartz, format!("Silica[{:?}] is 90%+.", silica))
    } else if potassium >= 60.0 && sodium >= 60.0 && calcium >= 60.0 {
        (
            OreType::Feldspars,
            format!(
                "Potassium[{:?}], Sodium[{:?}], and Calcium[{:?}] are 60%+.",
                potassium, sodium, calcium
            ),
        )
    } else if aluminum >= 12.0 && calcium >= 12.0 {
        (
            OreType::Montmorillonite,
            format!("Aluminum[{:?}] and Calcium[{:?}] are 12%+.", aluminum, calcium),
        )
    } else if aluminum >= 38.0 && silicon >= 46.0 {
        (
            OreType::Kaolinite,
            format!(
                "Aluminum[{:?}] is between 38 and 45% and Silicon[{:?}] is between 46 and 52%.",
                aluminum, silicon
            ),
        )
    } else {
        (
            OreType::Unknown,
            "Does not support any of our known reasons.".to_string(),
        )
    };

    Ok(Identification { ore_type, reason })
}
