// this is the entry point for the road network plugin
// the generator lives in a resource, the ui and the keyboard drive it through pipeline events
use bevy::log::{error, info, warn};
use bevy::prelude::*;

use crate::config::{GeneratorConfig, LAKE_CENTER, LAKE_RADIUS, RIVER_X};
use crate::error::ConfigError;
use crate::generator::{
    ConnectionReport, GrowthState, RoadGenerator, Zone, ZoneMap,
};

// resources
#[derive(Resource)]
pub struct RoadNetwork {
    pub generator: RoadGenerator,
    pub zones: ZoneMap,
    pub stepping: bool,
    pub last_report: Option<ConnectionReport>,
}

// config being edited in the panel, only applied on request
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct EditedConfig(pub GeneratorConfig);

// last rejected config, shown in the panel until a config is accepted
#[derive(Resource, Default)]
pub struct ConfigStatus(pub Option<ConfigError>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineAction {
    Spread,
    StartStepping,
    StopStepping,
    StepOnce,
    MergeByDistance,
    MergeStraights,
    DoubleLink,
    Verify,
    GenerateBuildings,
    ClearRoads,
    ClearBuildings,
    ResetRng,
    ApplyConfig,
    Regenerate,
}

// Event for every generator operation the host can trigger
#[derive(Event, Clone, Copy, Debug)]
pub struct PipelineEvent(pub PipelineAction);

/// Zones the viewer registers: a river to bridge over and a lake to avoid.
pub fn viewer_zones(config: &GeneratorConfig) -> ZoneMap {
    ZoneMap::default()
        .with_bridge_over(Zone::Rect {
            min: Vec2::new(RIVER_X.0, 0.0),
            max: Vec2::new(RIVER_X.1, config.height),
        })
        .with_avoid(Zone::Circle {
            center: Vec2::from(LAKE_CENTER),
            radius: LAKE_RADIUS,
        })
}

/// Run condition for every system that reads [`RoadNetwork`], it is missing when the
/// default config was rejected at startup.
pub fn network_ready(network: Option<Res<RoadNetwork>>) -> bool {
    network.is_some()
}

// main plugin for road generation
pub struct RoadNetworkPlugin;

impl Plugin for RoadNetworkPlugin {
    fn build(&self, app: &mut App) {
        let config = GeneratorConfig::default();
        let generator = match RoadGenerator::new(config.clone()) {
            Ok(generator) => generator,
            Err(err) => {
                error!("default road config rejected: {}", err);
                return;
            }
        };

        app
            .insert_resource(RoadNetwork {
                generator,
                zones: viewer_zones(&config),
                stepping: false,
                last_report: None,
            })
            .insert_resource(EditedConfig(config))
            .insert_resource(ConfigStatus::default())
            .add_event::<PipelineEvent>()
            .add_systems(
                Update,
                (key_input, handle_pipeline, advance_stepping)
                    .chain()
                    .run_if(network_ready),
            );
    }
}

fn key_input(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    network: Res<RoadNetwork>,
    mut events: EventWriter<PipelineEvent>,
) {
    if keyboard_input.just_pressed(KeyCode::Enter) {
        events.write(PipelineEvent(PipelineAction::Regenerate));
    }
    if keyboard_input.just_pressed(KeyCode::KeyN) {
        events.write(PipelineEvent(PipelineAction::StepOnce));
    }
    if keyboard_input.just_pressed(KeyCode::Space) {
        let action = if network.stepping {
            PipelineAction::StopStepping
        } else {
            PipelineAction::StartStepping
        };
        events.write(PipelineEvent(action));
    }
}

fn handle_pipeline(
    mut events: EventReader<PipelineEvent>,
    mut network: ResMut<RoadNetwork>,
    edited: Res<EditedConfig>,
    mut status: ResMut<ConfigStatus>,
) {
    let network = &mut *network;

    for PipelineEvent(action) in events.read() {
        let generator = &mut network.generator;
        let zones = &network.zones;

        match action {
            PipelineAction::Spread => {
                generator.spread_starting_points(zones);
            }
            PipelineAction::StartStepping => {
                if generator.state() == GrowthState::Done {
                    warn!("nothing to step, spread starting points first");
                    continue;
                }
                network.stepping = true;
            }
            PipelineAction::StopStepping => network.stepping = false,
            PipelineAction::StepOnce => {
                network.stepping = false;
                generator.advance_one_iteration(zones);
            }
            PipelineAction::MergeByDistance => {
                generator.merge_by_distance();
            }
            PipelineAction::MergeStraights => {
                generator.merge_unacceptable_straights();
            }
            PipelineAction::DoubleLink => {
                generator.double_link();
            }
            PipelineAction::Verify => {
                network.last_report = Some(generator.verify_connections());
            }
            PipelineAction::GenerateBuildings => {
                generator.generate_buildings_along_roads(zones);
            }
            PipelineAction::ClearRoads => {
                network.stepping = false;
                network.last_report = None;
                generator.clear_roads();
            }
            PipelineAction::ClearBuildings => generator.clear_buildings(),
            PipelineAction::ResetRng => generator.reset_rng(),
            PipelineAction::ApplyConfig => {
                let config = edited.0.clamped();
                match generator.set_config(config.clone()) {
                    Ok(()) => {
                        network.zones = viewer_zones(&config);
                        status.0 = None;
                        info!("applied road config");
                    }
                    Err(err) => {
                        warn!("road config rejected: {}", err);
                        status.0 = Some(err);
                    }
                }
            }
            PipelineAction::Regenerate => {
                network.stepping = false;
                let summary = generator.generate(zones);
                network.last_report = Some(summary.report);
            }
        }
    }
}

// one iteration per frame, so growth can be followed from the panel
fn advance_stepping(mut network: ResMut<RoadNetwork>) {
    if !network.stepping {
        return;
    }

    let network = &mut *network;
    if network.generator.advance_one_iteration(&network.zones) == GrowthState::Done {
        network.stepping = false;
        info!(
            "growth finished after {} iterations",
            network.generator.iterations()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_waits_for_the_network() {
        let mut app = App::new();
        app.add_systems(Update, advance_stepping.run_if(network_ready));

        // no network yet, the system is skipped instead of failing on the missing resource
        app.update();

        let config = GeneratorConfig::default();
        app.insert_resource(RoadNetwork {
            generator: RoadGenerator::new(config.clone()).unwrap(),
            zones: viewer_zones(&config),
            stepping: true,
            last_report: None,
        });
        app.update();

        // nothing was spread, so the first iteration finishes growth and stops stepping
        assert!(!app.world().resource::<RoadNetwork>().stepping);
    }
}
