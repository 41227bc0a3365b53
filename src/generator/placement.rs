// building footprints along finished roads
// footprints are not tested against each other, two buildings may overlap

use std::f32::consts::FRAC_PI_2;

use bevy::log::info;
use bevy::math::Vec2;
use rand::Rng;

use crate::config::FactorRange;

use super::RoadGenerator;
use super::geometry::BoundingPolygon;
use super::graph::Road;
use super::zones::ZoneOracle;

// slightly more than one, so a footprint never touches its own road
const SIDE_CLEARANCE: f32 = 1.001;

/// A building footprint. `surface` is (width across the road, length along it).
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingBox {
    pub pos: Vec2,
    pub surface: Vec2,
    pub height: f32,
    /// radians, counter-clockwise, 0 means the length runs along +y
    pub rotation: f32,
    polygon: BoundingPolygon,
}

impl BuildingBox {
    pub fn new(pos: Vec2, surface: Vec2, height: f32, rotation: f32) -> Self {
        Self {
            pos,
            surface,
            height,
            rotation,
            polygon: BoundingPolygon::rotated_rect(pos, surface, rotation),
        }
    }

    pub fn polygon(&self) -> &BoundingPolygon {
        &self.polygon
    }

    /// 2D overlap only, height is ignored.
    pub fn overlaps(&self, other: &BuildingBox) -> bool {
        self.polygon.collides(&other.polygon)
    }

    pub fn overlaps_road(&self, road: &Road) -> bool {
        self.polygon.collides(road.polygon())
    }

    fn touches_zone(&self, zones: &impl ZoneOracle) -> bool {
        self.polygon
            .corners()
            .iter()
            .copied()
            .chain(std::iter::once(self.pos))
            .any(|p| zones.is_forbidden(p) || zones.is_bridge_zone(p))
    }
}

/// A candidate footprint is clear when it stays out of every zone and every road corridor.
pub fn footprint_is_clear<'a>(
    candidate: &BuildingBox,
    roads: impl IntoIterator<Item = &'a Road>,
    zones: &impl ZoneOracle,
) -> bool {
    if candidate.touches_zone(zones) {
        return false;
    }
    !roads.into_iter().any(|road| candidate.overlaps_road(road))
}

impl RoadGenerator {
    /// Tries one footprint on each side of every eligible road.
    /// # Returns the number of footprints placed
    pub fn generate_buildings_along_roads(&mut self, zones: &impl ZoneOracle) -> usize {
        let before = self.buildings.len();
        let candidates: Vec<Road> = self.graph.roads().map(|(_, road)| road.clone()).collect();

        for road in &candidates {
            if self.rng.random::<f32>() >= self.config.building_along_road_chance {
                continue;
            }
            // too short to hold a building, or crossing a bridge zone
            if road.length() < self.config.min_road_length_for_building || road.bridge {
                continue;
            }

            for side in [-SIDE_CLEARANCE, SIDE_CLEARANCE] {
                let candidate = self.building_candidate(road, side);
                if footprint_is_clear(&candidate, &candidates, zones) {
                    self.buildings.push(candidate);
                }
            }
        }

        let placed = self.buildings.len() - before;
        info!("placed {} buildings along {} roads", placed, candidates.len());
        placed
    }

    fn building_candidate(&mut self, road: &Road, side: f32) -> BuildingBox {
        let length = road.length();
        let width = length * self.factor(self.config.building_width_factor);
        let depth = length * self.factor(self.config.building_length_factor);
        let height = length * self.factor(self.config.building_height_factor);

        // offset from the middle of the road by the corridor half-width and half the building
        let direction = road.direction();
        let offset = direction.perp() * (self.graph.mesh_radius() + width * 0.5);
        let pos = road.midpoint() + offset * side;

        // local +y follows the road
        let rotation = direction.to_angle() - FRAC_PI_2;
        BuildingBox::new(pos, Vec2::new(width, depth), height, rotation)
    }

    fn factor(&mut self, range: FactorRange) -> f32 {
        self.rng.random_range(range.min..=range.max)
    }
}
