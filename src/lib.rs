// procedural road network growth
// the generator module is engine-free, systems wires it into a bevy viewer

pub mod config;
pub mod error;
pub mod generator;
pub mod systems;


pub use config::{FactorRange, GeneratorConfig, SeedMode};
pub use error::ConfigError;
pub use generator::{GenerationSummary, GrowthState, RoadGenerator};
