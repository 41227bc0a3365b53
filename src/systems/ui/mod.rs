use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}; // fps
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};

use crate::config::{FactorRange, SeedMode, FACTOR_BOUNDS, HEIGHT_FACTOR_BOUNDS, INITIAL_SEED};
use crate::generator::GrowthState;
use crate::systems::network::{
    network_ready, ConfigStatus, EditedConfig, PipelineAction, PipelineEvent, RoadNetwork,
};

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        assert!(app.is_plugin_added::<EguiPlugin>());
        app
            .add_systems(
                EguiPrimaryContextPass,
                (ui_main, status_overlay).run_if(network_ready), // UI rendering here
            );
    }
}

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(178, 34, 34);
const VALID_COLOR: egui::Color32 = egui::Color32::from_rgb(34, 139, 34);

fn factor_sliders(ui: &mut egui::Ui, label: &str, range: &mut FactorRange, (lo, hi): (f32, f32)) {
    ui.label(label);
    ui.add(egui::Slider::new(&mut range.min, lo..=hi).text("Min"));
    ui.add(egui::Slider::new(&mut range.max, lo..=hi).text("Max"));
}

fn action_button(ui: &mut egui::Ui, text: &str, hover: &str, events: &mut EventWriter<PipelineEvent>, action: PipelineAction) {
    if ui.button(text).on_hover_text(hover).clicked() {
        events.write(PipelineEvent(action));
    }
}

fn ui_main(
    mut contexts: EguiContexts,
    network: Res<RoadNetwork>,
    mut edited: ResMut<EditedConfig>,
    status: Res<ConfigStatus>,
    mut events: EventWriter<PipelineEvent>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::SidePanel::left("config_panel")
            .default_width(200.0)
            .min_width(250.0)
            .max_width(400.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let config = &mut edited.0;

                    ui.label("Generation Parameters:");

                    // seed
                    egui::CollapsingHeader::new("Seed")
                        .default_open(true)
                        .show(ui, |ui| {
                        let mut automatic = config.seed == SeedMode::Automatic;
                        if ui.checkbox(&mut automatic, "Automatic")
                            .on_hover_text("Draw a fresh seed from the os on every reset")
                            .changed() {
                            config.seed = if automatic {
                                SeedMode::Automatic
                            } else {
                                SeedMode::Fixed(INITIAL_SEED)
                            };
                        }

                        if let SeedMode::Fixed(seed) = &mut config.seed {
                            ui.horizontal(|ui| {
                                ui.label("Seed:");
                                ui.add(egui::DragValue::new(seed));
                                if ui.button("Random").clicked() {
                                    *seed = rand::random();
                                }
                            });
                        }
                    });

                    egui::CollapsingHeader::new("Spreading")
                        .default_open(true)
                        .show(ui, |ui| {
                        ui.add(egui::Slider::new(&mut config.width, 100.0..=3000.0)
                            .text("Width (m)")
                            .suffix(" m"));
                        ui.add(egui::Slider::new(&mut config.height, 100.0..=3000.0)
                            .text("Height (m)")
                            .suffix(" m"));
                        ui.add(egui::Slider::new(&mut config.initial_start_points, 1..=32)
                            .text("Start Points"))
                            .on_hover_text("Number of seed points placed before stepping.");
                        ui.add(egui::Slider::new(&mut config.middle_spawn_factor, 0.0..=0.5)
                            .text("Spawn Area"))
                            .on_hover_text("Half-extent of the centered spawn area, as a fraction of the bounds.");
                    });

                    egui::CollapsingHeader::new("Stepping")
                        .default_open(true)
                        .show(ui, |ui| {
                        ui.add(egui::Slider::new(&mut config.step_distance, 5.0..=200.0)
                            .text("Step Distance (m)")
                            .suffix(" m"));
                        ui.add(egui::Slider::new(&mut config.step_distance_for_bridges, 5.0..=400.0)
                            .text("Bridge Step (m)")
                            .suffix(" m"))
                            .on_hover_text("Step length when crossing a bridge zone. Never shorter than the regular step.");
                        ui.add(egui::Slider::new(&mut config.max_rotation_radians, 0.0..=1.5)
                            .text("Max Rotation (rad)"))
                            .on_hover_text("Largest random turn a road takes per step.");
                        ui.add(egui::Slider::new(&mut config.new_road_chance, 0.0..=1.0)
                            .text("New Road Chance"))
                            .on_hover_text("Added to a point's split chance every step.");
                    });

                    egui::CollapsingHeader::new("Merging")
                        .default_open(false)
                        .show(ui, |ui| {
                        ui.add(egui::Slider::new(&mut config.merge_distance, 0.0..=25.0)
                            .text("Merge Distance (m)")
                            .suffix(" m"));
                        ui.label("Acceptable Straights (deg):");
                        ui.add(egui::Slider::new(&mut config.acceptable_straights.min, 0.0..=180.0).text("Min"));
                        ui.add(egui::Slider::new(&mut config.acceptable_straights.max, 0.0..=180.0).text("Max"));
                        ui.add(egui::Slider::new(&mut config.mesh_radius, 0.0..=10.0)
                            .text("Road Radius (m)")
                            .suffix(" m"));
                    });

                    egui::CollapsingHeader::new("Buildings")
                        .default_open(false)
                        .show(ui, |ui| {
                        ui.add(egui::Slider::new(&mut config.building_along_road_chance, 0.0..=1.0)
                            .text("Chance"));
                        // never longer than a single step, shorter roads only come from splits
                        let max_length = config.step_distance.max(0.0);
                        ui.add(egui::Slider::new(&mut config.min_road_length_for_building, 0.0..=max_length)
                            .text("Min Road Length (m)")
                            .suffix(" m"));
                        factor_sliders(ui, "Length Factor:", &mut config.building_length_factor, FACTOR_BOUNDS);
                        factor_sliders(ui, "Width Factor:", &mut config.building_width_factor, FACTOR_BOUNDS);
                        factor_sliders(ui, "Height Factor:", &mut config.building_height_factor, HEIGHT_FACTOR_BOUNDS);
                    });

                    // errors are checked while editing, apply stays disabled until the config is valid
                    let validation = config.clamped().validate();
                    let dirty = network.generator.config() != &config.clamped();
                    ui.horizontal(|ui| {
                        let apply = ui.add_enabled(validation.is_ok() && dirty, egui::Button::new("Apply"));
                        if apply.clicked() {
                            events.write(PipelineEvent(PipelineAction::ApplyConfig));
                        }
                        if ui.button("Revert").clicked() {
                            *config = network.generator.config().clone();
                        }
                    });
                    if let Err(err) = &validation {
                        ui.label(egui::RichText::new(err.to_string()).color(ERROR_COLOR));
                    } else if let Some(err) = &status.0 {
                        ui.label(egui::RichText::new(format!("Rejected: {err}")).color(ERROR_COLOR));
                    }

                    ui.separator();

                    // pipeline
                    ui.label("Roads:");
                    ui.horizontal_wrapped(|ui| {
                        action_button(ui, "Spread", "Place the starting points", &mut events, PipelineAction::Spread);
                        if network.stepping {
                            action_button(ui, "Stop", "Stop stepping", &mut events, PipelineAction::StopStepping);
                        } else {
                            action_button(ui, "Step", "Step one iteration per frame until done", &mut events, PipelineAction::StartStepping);
                        }
                        action_button(ui, "Step Once", "Advance a single iteration", &mut events, PipelineAction::StepOnce);
                    });
                    ui.horizontal_wrapped(|ui| {
                        action_button(ui, "Merge Close", "Merge points closer than the merge distance", &mut events, PipelineAction::MergeByDistance);
                        action_button(ui, "Merge Straights", "Contract points with unacceptable angles", &mut events, PipelineAction::MergeStraights);
                    });
                    ui.horizontal_wrapped(|ui| {
                        action_button(ui, "Double Link", "Repair asymmetric connections", &mut events, PipelineAction::DoubleLink);
                        action_button(ui, "Verify", "Audit the connections", &mut events, PipelineAction::Verify);
                    });

                    ui.label("Buildings:");
                    ui.horizontal_wrapped(|ui| {
                        action_button(ui, "Generate", "Place footprints along the roads", &mut events, PipelineAction::GenerateBuildings);
                        action_button(ui, "Clear", "Remove every footprint", &mut events, PipelineAction::ClearBuildings);
                    });

                    ui.separator();
                    ui.horizontal_wrapped(|ui| {
                        let regenerate = egui::Button::new("Regenerate").fill(egui::Color32::from_rgb(45, 72, 116));
                        if ui.add(regenerate).on_hover_text("Run the whole pipeline from scratch (Enter)").clicked() {
                            events.write(PipelineEvent(PipelineAction::Regenerate));
                        }
                        let clear = egui::Button::new("Clear Roads").fill(egui::Color32::from_rgb(130, 22, 22));
                        if ui.add(clear).clicked() {
                            events.write(PipelineEvent(PipelineAction::ClearRoads));
                        }
                        action_button(ui, "Reset RNG", "Restart the random sequence from the seed", &mut events, PipelineAction::ResetRng);
                    });

                    ui.separator();

                    // status
                    let generator = &network.generator;
                    let graph = generator.graph();
                    ui.label(format!("Points: {}", graph.point_count()));
                    ui.label(format!("Roads: {}", graph.road_count()));
                    ui.label(format!("Buildings: {}", generator.buildings().len()));
                    ui.label(format!("Iterations: {}", generator.iterations()));
                    ui.label(format!(
                        "Zones: {} avoided, {} bridged",
                        network.zones.avoid.len(),
                        network.zones.bridge_over.len()
                    ));
                    ui.horizontal(|ui| {
                        ui.label("Connections:");
                        match &network.last_report {
                            None => {
                                ui.label("not verified");
                            }
                            Some(report) if report.is_valid() => {
                                ui.label(egui::RichText::new("Valid").color(VALID_COLOR));
                            }
                            Some(report) => {
                                ui.label(egui::RichText::new(format!("{} invalid", report.violations.len())).color(ERROR_COLOR))
                                    .on_hover_text(report.to_string());
                            }
                        }
                    });

                    ui.separator();
                    ui.label("Space - Step / Stop");
                    ui.label("N - Step Once");
                    ui.label("ESC - Exit");
                });
            });
    }
}

fn status_overlay(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
    network: Res<RoadNetwork>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Area::new(egui::Id::new("status_overlay"))
            .anchor(egui::Align2::RIGHT_TOP, egui::Vec2::new(-10.0, 10.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::RIGHT), |ui| {
                    if let Some(fps) = diagnostics
                        .get(&FrameTimeDiagnosticsPlugin::FPS)
                        .and_then(|fps| fps.smoothed())
                    {
                        ui.label(egui::RichText::new(format!("{:.0}", fps))
                            .size(26.0)
                            .color(egui::Color32::WHITE));
                    }

                    let (text, color) = match (network.stepping, network.generator.state()) {
                        (true, _) => ("STEPPING", egui::Color32::from_rgb(50, 91, 34)),
                        (false, GrowthState::Growing) => ("PAUSED", egui::Color32::from_rgb(136, 46, 217)),
                        (false, GrowthState::Done) => ("DONE", egui::Color32::from_rgb(45, 72, 116)),
                    };
                    egui::Frame::new()
                        .fill(color)
                        .inner_margin(egui::Margin::symmetric(4, 1))
                        .corner_radius(egui::CornerRadius::same(3))
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(text)
                                .size(12.0)
                                .color(egui::Color32::WHITE)
                                .strong());
                        });
                });
            });
    }
}
