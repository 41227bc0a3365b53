// this is the entry point for road network generation
// the generator owns the graph, the footprints and the random source for the whole pass

use bevy::log::info;
use rand::SeedableRng;
use rand::distr::Uniform;
use rand::rngs::StdRng;

use crate::config::{GeneratorConfig, SeedMode};
use crate::error::ConfigError;

pub mod geometry;
pub mod graph;
pub mod growth;
pub mod placement;
pub mod topology;
pub mod zones;

pub use graph::{Point, PointId, PointKind, Road, RoadGraph, RoadId};
pub use placement::BuildingBox;
pub use topology::{ConnectionReport, Violation};
pub use zones::{NoZones, Zone, ZoneMap, ZoneOracle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthState {
    /// at least one point is still a head
    Growing,
    Done,
}

/// Counts collected by a full [`RoadGenerator::generate`] run.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSummary {
    pub seeded: usize,
    pub iterations: usize,
    pub merged_by_distance: usize,
    pub merged_straights: usize,
    pub buildings: usize,
    pub report: ConnectionReport,
}

pub struct RoadGenerator {
    config: GeneratorConfig,
    graph: RoadGraph,
    buildings: Vec<BuildingBox>,
    rng: StdRng,
    rotation: Uniform<f32>,
    iterations: usize,
}

fn rng_for(seed: SeedMode) -> StdRng {
    match seed {
        SeedMode::Automatic => StdRng::from_os_rng(),
        SeedMode::Fixed(seed) => StdRng::seed_from_u64(seed),
    }
}

fn rotation_for(config: &GeneratorConfig) -> Result<Uniform<f32>, ConfigError> {
    Ok(Uniform::new_inclusive(
        -config.max_rotation_radians,
        config.max_rotation_radians,
    )?)
}

impl RoadGenerator {
    /// Validates the configuration up front, nothing is generated yet.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rotation = rotation_for(&config)?;

        Ok(Self {
            graph: RoadGraph::new(config.mesh_radius),
            buildings: Vec::new(),
            rng: rng_for(config.seed),
            rotation,
            iterations: 0,
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Swaps the configuration. The current graph is kept, a changed seed resets the rng.
    pub fn set_config(&mut self, config: GeneratorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.rotation = rotation_for(&config)?;
        self.graph.set_mesh_radius(config.mesh_radius);

        let seed_changed = self.config.seed != config.seed;
        self.config = config;
        if seed_changed {
            self.reset_rng();
        }
        Ok(())
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// Direct access for hosts that inject existing roads before stepping.
    pub fn graph_mut(&mut self) -> &mut RoadGraph {
        &mut self.graph
    }

    pub fn buildings(&self) -> &[BuildingBox] {
        &self.buildings
    }

    pub fn has_points(&self) -> bool {
        !self.graph.is_empty()
    }

    pub fn has_roads(&self) -> bool {
        self.graph.road_count() > 0
    }

    pub fn has_buildings(&self) -> bool {
        !self.buildings.is_empty()
    }

    /// Iterations advanced since the graph was last cleared.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn state(&self) -> GrowthState {
        if self.graph.points().any(|(_, p)| p.head) {
            GrowthState::Growing
        } else {
            GrowthState::Done
        }
    }

    /// Restarts the random sequence from the configured seed.
    pub fn reset_rng(&mut self) {
        self.rng = rng_for(self.config.seed);
    }

    pub fn clear_roads(&mut self) {
        self.reset_rng();
        self.graph.clear();
        self.iterations = 0;
    }

    pub fn clear_buildings(&mut self) {
        self.buildings.clear();
    }

    pub fn merge_by_distance(&mut self) -> usize {
        self.graph.merge_by_distance(self.config.merge_distance)
    }

    pub fn merge_unacceptable_straights(&mut self) -> usize {
        let range = self.config.acceptable_straights;
        self.graph.merge_unacceptable_straights(range.min, range.max)
    }

    pub fn double_link(&mut self) -> usize {
        self.graph.double_link()
    }

    pub fn verify_connections(&self) -> ConnectionReport {
        self.graph.verify_connections()
    }

    /// Runs the whole pipeline from an empty graph: seeds, growth, cleanup and buildings.
    pub fn generate(&mut self, zones: &impl ZoneOracle) -> GenerationSummary {
        self.clear_roads();
        self.clear_buildings();

        let seeded = self.spread_starting_points(zones);
        let iterations = self.run_to_completion(zones);
        let merged_by_distance = self.merge_by_distance();
        let merged_straights = self.merge_unacceptable_straights();
        let report = self.verify_connections();
        let buildings = self.generate_buildings_along_roads(zones);

        info!(
            "generated {} points, {} roads and {} buildings in {} iterations",
            self.graph.point_count(),
            self.graph.road_count(),
            buildings,
            iterations
        );

        GenerationSummary {
            seeded,
            iterations,
            merged_by_distance,
            merged_straights,
            buildings,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_fails_before_generation() {
        let config = GeneratorConfig {
            step_distance: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            RoadGenerator::new(config),
            Err(ConfigError::NonPositiveStepDistance(_))
        ));
    }

    #[test]
    fn rejected_config_leaves_generator_untouched() {
        let mut generator = RoadGenerator::new(GeneratorConfig::default()).unwrap();
        let bad = GeneratorConfig {
            width: -1.0,
            ..Default::default()
        };
        assert!(generator.set_config(bad).is_err());
        assert_eq!(generator.config(), &GeneratorConfig::default());
    }

    #[test]
    fn empty_generator_is_done() {
        let generator = RoadGenerator::new(GeneratorConfig::default()).unwrap();
        assert_eq!(generator.state(), GrowthState::Done);
        assert!(!generator.has_points());
    }

    #[test]
    fn clearing_resets_graph_and_iterations() {
        let mut generator = RoadGenerator::new(GeneratorConfig::default()).unwrap();
        generator.spread_starting_points(&NoZones);
        generator.advance_one_iteration(&NoZones);
        assert!(generator.has_points());
        assert_eq!(generator.iterations(), 1);

        generator.clear_roads();
        assert!(!generator.has_points());
        assert!(!generator.has_roads());
        assert_eq!(generator.iterations(), 0);
    }

    #[test]
    fn reset_rng_replays_the_same_seeds() {
        let mut generator = RoadGenerator::new(GeneratorConfig::default()).unwrap();
        generator.spread_starting_points(&NoZones);
        let first: Vec<_> = generator.graph().points().map(|(_, p)| p.pos).collect();

        generator.clear_roads();
        generator.spread_starting_points(&NoZones);
        let second: Vec<_> = generator.graph().points().map(|(_, p)| p.pos).collect();

        assert_eq!(first, second);
    }
}
