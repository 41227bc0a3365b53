// Configuration file, All measurements in real-world meters (1 unit = 1 meter)
// This controls the initial generation parameter settings

use crate::error::ConfigError;

// Generation boundaries (meters), points live in [0, width] x [0, height]
pub const WIDTH: f32 = 1000.0;
pub const HEIGHT: f32 = 1000.0;

pub const INITIAL_SEED: u64 = 1512086461918454205;

// Spreading
pub const INITIAL_START_POINTS: usize = 4;
pub const MIDDLE_SPAWN_FACTOR: f32 = 0.25; // half-extent of the spawn area as a fraction of the bounds (0..0.5)
pub const MAX_SPAWN_ATTEMPTS: usize = 1000; // retries per seed point before giving up

// Stepping
pub const STEP_DISTANCE: f32 = 50.0;
pub const STEP_DISTANCE_FOR_BRIDGES: f32 = 100.0;
pub const MAX_ROTATION_RADIANS: f32 = 0.4;
pub const NEW_ROAD_CHANCE: f32 = 0.7; // added to a point's split chance every step

// Merging
pub const MERGE_DISTANCE: f32 = 3.0;
pub const ACCEPTABLE_STRAIGHTS_MIN: f32 = 15.0; // degrees
pub const ACCEPTABLE_STRAIGHTS_MAX: f32 = 175.0; // degrees

// Road corridor half-width
pub const MESH_RADIUS: f32 = 2.0;

// Buildings generation, factors are relative to the length of the road
pub const BUILDING_ALONG_ROAD_CHANCE: f32 = 1.0;
pub const MIN_ROAD_LENGTH_FOR_BUILDING: f32 = 20.0;
pub const BUILDING_LENGTH_FACTOR: (f32, f32) = (0.6, 0.9);
pub const BUILDING_WIDTH_FACTOR: (f32, f32) = (0.1, 0.5);
pub const BUILDING_HEIGHT_FACTOR: (f32, f32) = (0.1, 0.3);
pub const FACTOR_BOUNDS: (f32, f32) = (0.0, 1.0); // length and width
pub const HEIGHT_FACTOR_BOUNDS: (f32, f32) = (0.0, 2.0); // buildings may be taller than the road is long

// Host-registered regions for the viewer (meters)
pub const RIVER_X: (f32, f32) = (640.0, 690.0); // bridge zone, full height
pub const LAKE_CENTER: (f32, f32) = (250.0, 720.0); // forbidden zone
pub const LAKE_RADIUS: f32 = 90.0;

/// Where the generator draws its randomness from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedMode {
    /// time/os based, runs are not reproducible
    Automatic,
    Fixed(u64),
}

/// An inclusive `min..=max` range of random factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FactorRange {
    pub min: f32,
    pub max: f32,
}

impl FactorRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn clamped(self, lo: f32, hi: f32) -> Self {
        Self {
            min: self.min.clamp(lo, hi),
            max: self.max.clamp(lo, hi),
        }
    }
}

impl From<(f32, f32)> for FactorRange {
    fn from((min, max): (f32, f32)) -> Self {
        Self::new(min, max)
    }
}

// road generation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    pub seed: SeedMode,

    pub width: f32,
    pub height: f32,

    pub initial_start_points: usize,
    pub middle_spawn_factor: f32,

    pub step_distance: f32,
    pub step_distance_for_bridges: f32,
    pub max_rotation_radians: f32,
    pub new_road_chance: f32,

    pub merge_distance: f32,
    pub acceptable_straights: FactorRange, // degrees

    pub mesh_radius: f32,

    pub building_along_road_chance: f32,
    pub min_road_length_for_building: f32,
    pub building_length_factor: FactorRange,
    pub building_width_factor: FactorRange,
    pub building_height_factor: FactorRange,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: SeedMode::Fixed(INITIAL_SEED),
            width: WIDTH,
            height: HEIGHT,
            initial_start_points: INITIAL_START_POINTS,
            middle_spawn_factor: MIDDLE_SPAWN_FACTOR,
            step_distance: STEP_DISTANCE,
            step_distance_for_bridges: STEP_DISTANCE_FOR_BRIDGES,
            max_rotation_radians: MAX_ROTATION_RADIANS,
            new_road_chance: NEW_ROAD_CHANCE,
            merge_distance: MERGE_DISTANCE,
            acceptable_straights: FactorRange::new(ACCEPTABLE_STRAIGHTS_MIN, ACCEPTABLE_STRAIGHTS_MAX),
            mesh_radius: MESH_RADIUS,
            building_along_road_chance: BUILDING_ALONG_ROAD_CHANCE,
            min_road_length_for_building: MIN_ROAD_LENGTH_FOR_BUILDING,
            building_length_factor: BUILDING_LENGTH_FACTOR.into(),
            building_width_factor: BUILDING_WIDTH_FACTOR.into(),
            building_height_factor: BUILDING_HEIGHT_FACTOR.into(),
        }
    }
}

impl GeneratorConfig {
    /// Checks every parameter before any generation pass is allowed to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("width", self.width)?;
        finite("height", self.height)?;
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ConfigError::EmptyBounds {
                width: self.width,
                height: self.height,
            });
        }

        finite("step_distance", self.step_distance)?;
        if self.step_distance <= 0.0 {
            return Err(ConfigError::NonPositiveStepDistance(self.step_distance));
        }
        finite("step_distance_for_bridges", self.step_distance_for_bridges)?;
        if self.step_distance_for_bridges < self.step_distance {
            return Err(ConfigError::BridgeStepTooShort {
                bridge: self.step_distance_for_bridges,
                step: self.step_distance,
            });
        }

        within("middle_spawn_factor", self.middle_spawn_factor, 0.0, 0.5)?;
        non_negative("max_rotation_radians", self.max_rotation_radians)?;
        non_negative("new_road_chance", self.new_road_chance)?;
        non_negative("merge_distance", self.merge_distance)?;
        non_negative("mesh_radius", self.mesh_radius)?;
        non_negative("min_road_length_for_building", self.min_road_length_for_building)?;
        within("building_along_road_chance", self.building_along_road_chance, 0.0, 1.0)?;

        range("acceptable_straights", self.acceptable_straights, 0.0, 180.0)?;
        let (lo, hi) = FACTOR_BOUNDS;
        range("building_length_factor", self.building_length_factor, lo, hi)?;
        range("building_width_factor", self.building_width_factor, lo, hi)?;
        let (lo, hi) = HEIGHT_FACTOR_BOUNDS;
        range("building_height_factor", self.building_height_factor, lo, hi)?;

        Ok(())
    }

    /// Returns a copy with the building factor ranges clamped to [`FACTOR_BOUNDS`]
    /// ([`HEIGHT_FACTOR_BOUNDS`] for the height) and the minimum building road length
    /// clamped to `0..=step_distance`.
    /// Inverted ranges are left inverted so `validate` still reports them.
    pub fn clamped(&self) -> Self {
        let (lo, hi) = FACTOR_BOUNDS;
        let (height_lo, height_hi) = HEIGHT_FACTOR_BOUNDS;
        Self {
            min_road_length_for_building: self
                .min_road_length_for_building
                .clamp(0.0, self.step_distance.max(0.0)),
            building_length_factor: self.building_length_factor.clamped(lo, hi),
            building_width_factor: self.building_width_factor.clamped(lo, hi),
            building_height_factor: self.building_height_factor.clamped(height_lo, height_hi),
            ..self.clone()
        }
    }

    /// Lower corner of the centered sub-rectangle seeds are spawned in.
    pub fn spawn_min(&self) -> (f32, f32) {
        (
            self.width * (0.5 - self.middle_spawn_factor),
            self.height * (0.5 - self.middle_spawn_factor),
        )
    }

    /// Upper corner of the centered sub-rectangle seeds are spawned in.
    pub fn spawn_max(&self) -> (f32, f32) {
        (
            self.width * (0.5 + self.middle_spawn_factor),
            self.height * (0.5 + self.middle_spawn_factor),
        )
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    within(name, value, 0.0, f32::MAX)
}

fn within(name: &'static str, value: f32, lo: f32, hi: f32) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value < lo || value > hi {
        return Err(ConfigError::OutOfRange { name, value, lo, hi });
    }
    Ok(())
}

fn range(name: &'static str, r: FactorRange, lo: f32, hi: f32) -> Result<(), ConfigError> {
    within(name, r.min, lo, hi)?;
    within(name, r.max, lo, hi)?;
    if r.min > r.max {
        return Err(ConfigError::InvertedRange {
            name,
            min: r.min,
            max: r.max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GeneratorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_step() {
        let config = GeneratorConfig {
            step_distance: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveStepDistance(0.0)));

        let config = GeneratorConfig {
            step_distance: -5.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveStepDistance(_))));
    }

    #[test]
    fn rejects_empty_bounds() {
        let config = GeneratorConfig {
            height: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyBounds { .. })));
    }

    #[test]
    fn rejects_inverted_factor_range() {
        let config = GeneratorConfig {
            building_width_factor: FactorRange::new(0.5, 0.1),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { name: "building_width_factor", .. })
        ));
    }

    #[test]
    fn rejects_spawn_factor_above_half() {
        let config = GeneratorConfig {
            middle_spawn_factor: 0.6,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn clamping_brings_factors_into_bounds() {
        let config = GeneratorConfig {
            building_length_factor: FactorRange::new(-0.5, 1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let clamped = config.clamped();
        assert_eq!(clamped.building_length_factor, FactorRange::new(0.0, 1.0));
        assert_eq!(clamped.validate(), Ok(()));
    }

    #[test]
    fn height_factor_may_exceed_one() {
        let config = GeneratorConfig {
            building_height_factor: FactorRange::new(0.5, 1.5),
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.clamped().building_height_factor, FactorRange::new(0.5, 1.5));

        let too_tall = GeneratorConfig {
            building_height_factor: FactorRange::new(0.5, 2.5),
            ..Default::default()
        };
        assert!(matches!(
            too_tall.validate(),
            Err(ConfigError::OutOfRange { name: "building_height_factor", .. })
        ));
        assert_eq!(too_tall.clamped().building_height_factor, FactorRange::new(0.5, 2.0));
    }

    #[test]
    fn min_building_road_length_is_clamped_to_the_step() {
        let long = GeneratorConfig {
            min_road_length_for_building: 80.0,
            ..Default::default()
        };
        assert_eq!(long.clamped().min_road_length_for_building, STEP_DISTANCE);

        let negative = GeneratorConfig {
            min_road_length_for_building: -3.0,
            ..Default::default()
        };
        assert_eq!(negative.clamped().min_road_length_for_building, 0.0);

        let in_range = GeneratorConfig::default();
        assert_eq!(in_range.clamped().min_road_length_for_building, MIN_ROAD_LENGTH_FOR_BUILDING);
    }

    #[test]
    fn spawn_area_is_centered() {
        let config = GeneratorConfig::default();
        assert_eq!(config.spawn_min(), (250.0, 250.0));
        assert_eq!(config.spawn_max(), (750.0, 750.0));
    }
}
