use std::path::Path;

use serde::Deserialize;

use crate::error::GeneratorError;

/// Empirically tuned quality constants. Preserve the defaults exactly.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct QualityThresholds {
    /// Shortest acceptable ride on any single leg of a preferred solution.
    pub min_leg_miles: f64,
    /// Two-station backward excursions shorter than this get the movement check.
    pub short_excursion_miles: f64,
    /// Movement away from origin and journey endpoint a short excursion must make.
    pub min_excursion_movement_miles: f64,
    pub same_borough_max_factor: f64,
    pub cross_borough_max_factor: f64,
    /// Lowest progress factor a daily answer may have.
    pub backtracking_tolerance: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_leg_miles: 0.50,
            short_excursion_miles: 0.5,
            min_excursion_movement_miles: 0.15,
            same_borough_max_factor: 1.4,
            cross_borough_max_factor: 2.0,
            backtracking_tolerance: -0.025,
        }
    }
}

/// A set of routes running together, e.g. weekday or night service.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ServicePattern {
    pub name: String,
    pub routes: Vec<String>,
}

impl ServicePattern {
    fn new(name: &str, routes: &str) -> Self {
        Self {
            name: name.to_owned(),
            routes: routes.split_whitespace().map(str::to_owned).collect(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub patterns: Vec<ServicePattern>,
    pub thresholds: QualityThresholds,
    pub max_candidates_per_combo: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        const WEEKDAY: &str = "1 2 3 4 5 6 7 A1 A2 B C D E F G J L M N Q R W SI FS GS H";
        Self {
            patterns: vec![
                ServicePattern::new("weekday", WEEKDAY),
                ServicePattern::new(
                    "weekend",
                    "1 2 3 4 5 6 7 A1 A2 C D E F G J L M N Q R SI FS GS H",
                ),
                ServicePattern::new(
                    "night",
                    "1 2 3 4 5 6 7 A1 A2 D E F G J L M N Q R SI FS H",
                ),
                ServicePattern::new("accessible", WEEKDAY),
            ],
            thresholds: QualityThresholds::default(),
            max_candidates_per_combo: None,
        }
    }
}

impl GeneratorConfig {
    /// Reads a TOML file whatever its extension; anything it leaves out keeps its default.
    pub fn from_file(path: &Path) -> Result<Self, GeneratorError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Keeps only the named patterns, in the order they are configured.
    pub fn select_patterns(&self, names: &[String]) -> Result<Vec<&ServicePattern>, GeneratorError> {
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.patterns.iter().any(|p| &p.name == *name))
        {
            return Err(GeneratorError::UnknownPattern(unknown.to_owned()));
        }

        Ok(self
            .patterns
            .iter()
            .filter(|p| names.is_empty() || names.contains(&p.name))
            .collect())
    }
}
