// handles the growth of the road network
// every head point takes exactly one step per iteration and settles afterwards,
// so a pass always runs out of heads

use std::f32::consts::FRAC_PI_2;

use bevy::log::{debug, info, warn};
use bevy::math::Vec2;
use rand::Rng;
use rand_distr::{Distribution, UnitCircle};

use crate::config::MAX_SPAWN_ATTEMPTS;

use super::geometry::{rotate, segment_intersection};
use super::graph::{Point, PointId, RoadId};
use super::zones::ZoneOracle;
use super::{GrowthState, RoadGenerator};

// an intersection closer than this to a vertex lands on that vertex
const SNAP_EPSILON: f32 = 1e-3;

/// What a single step did to the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// a new leaf point was created
    Grew(PointId),
    /// the step ran into an existing road and now ends on this point
    Joined(PointId),
    /// nothing was built
    Blocked,
}

impl StepOutcome {
    pub fn grown(self) -> Option<PointId> {
        match self {
            StepOutcome::Grew(id) => Some(id),
            _ => None,
        }
    }
}

impl RoadGenerator {
    /// Places the configured number of seed points inside the centered spawn area.
    /// # Returns how many seeds were placed, fewer if the area is mostly off limits
    pub fn spread_starting_points(&mut self, zones: &impl ZoneOracle) -> usize {
        let (min_x, min_y) = self.config.spawn_min();
        let (max_x, max_y) = self.config.spawn_max();
        let min = Vec2::new(min_x, min_y);
        let max = Vec2::new(max_x, max_y);

        let mut placed = 0;
        for _ in 0..self.config.initial_start_points {
            let Some(pos) = self.find_spawn_position(min, max, zones) else {
                warn!(
                    "no free spawn position after {} attempts, placed {} of {} starting points",
                    MAX_SPAWN_ATTEMPTS, placed, self.config.initial_start_points
                );
                break;
            };

            let [x, y]: [f32; 2] = UnitCircle.sample(&mut self.rng);
            self.graph.add_point(Point::seed(pos, Vec2::new(x, y)));
            placed += 1;
        }

        info!("spread {} starting points", placed);
        placed
    }

    fn find_spawn_position(&mut self, min: Vec2, max: Vec2, zones: &impl ZoneOracle) -> Option<Vec2> {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let pos = Vec2::new(
                self.rng.random_range(min.x..=max.x),
                self.rng.random_range(min.y..=max.y),
            );
            if !zones.is_forbidden(pos) && !zones.is_bridge_zone(pos) {
                return Some(pos);
            }
        }
        None
    }

    /// Steps every current head once. Points created here wait for the next call.
    pub fn advance_one_iteration(&mut self, zones: &impl ZoneOracle) -> GrowthState {
        let heads = self.graph.head_ids();
        if heads.is_empty() {
            return GrowthState::Done;
        }

        for id in heads {
            self.step_point(id, zones);
            if let Some(point) = self.graph.point_mut(id) {
                point.head = false;
            }
        }

        self.iterations += 1;
        self.state()
    }

    /// Keeps stepping until no head is left.
    /// # Returns the number of iterations it took
    pub fn run_to_completion(&mut self, zones: &impl ZoneOracle) -> usize {
        let start = self.iterations;
        while self.advance_one_iteration(zones) == GrowthState::Growing {}

        let ran = self.iterations - start;
        info!(
            "stepping done after {} iterations: {} points, {} roads",
            ran,
            self.graph.point_count(),
            self.graph.road_count()
        );
        ran
    }

    fn step_point(&mut self, id: PointId, zones: &impl ZoneOracle) {
        let Some((dir, split_chance)) = self
            .graph
            .point(id)
            .and_then(|p| p.dir.map(|dir| (dir, p.split_chance)))
        else {
            return;
        };

        // always take a step forward
        let primary = self.grow_towards(id, dir, zones);

        // maybe we can split off
        if self.rng.random::<f32>() >= split_chance {
            return;
        }
        let turn = if self.rng.random_bool(0.5) { FRAC_PI_2 } else { -FRAC_PI_2 };

        // splitting resets the clock on both branches
        if let StepOutcome::Grew(side) = self.grow_towards(id, rotate(dir, turn), zones) {
            for child in [Some(side), primary.grown()].into_iter().flatten() {
                if let Some(point) = self.graph.point_mut(child) {
                    point.split_chance = 0.0;
                }
            }
        }
    }

    /// Takes one step from `id` along `dir`.
    pub fn grow_towards(&mut self, id: PointId, dir: Vec2, zones: &impl ZoneOracle) -> StepOutcome {
        let Some(point) = self.graph.point(id) else {
            return StepOutcome::Blocked;
        };
        let from = point.pos;
        let split_chance = point.split_chance;

        let mut to = from + dir * self.config.step_distance;

        // crossing a bridge zone takes a longer step to reach the other side
        let bridge = zones.is_bridge_zone(to) || zones.is_bridge_zone((from + to) * 0.5);
        if bridge {
            to = from + dir * self.config.step_distance_for_bridges;
            if zones.is_bridge_zone(to) {
                return StepOutcome::Blocked;
            }
        }
        if zones.is_forbidden(to) {
            return StepOutcome::Blocked;
        }

        if let Some((road, at)) = self.closest_intersection(id, from, to) {
            return self.split_road(id, road, at, bridge);
        }

        let new_dir = rotate(dir, self.rotation.sample(&mut self.rng));
        let head = self.in_bounds(to);
        let child = self.graph.add_point(Point::grown(
            to,
            new_dir,
            split_chance + self.config.new_road_chance,
            head,
        ));
        self.graph.add_road(id, child, bridge);

        StepOutcome::Grew(child)
    }

    fn in_bounds(&self, pos: Vec2) -> bool {
        (0.0..=self.config.width).contains(&pos.x) && (0.0..=self.config.height).contains(&pos.y)
    }

    /// Closest crossing of `from..to` with any road not attached to `id`.
    /// Equal distances keep the road found first.
    fn closest_intersection(&self, id: PointId, from: Vec2, to: Vec2) -> Option<(RoadId, Vec2)> {
        let mut closest: Option<(RoadId, Vec2, f32)> = None;

        for (road_id, road) in self.graph.roads() {
            if road.touches(id) {
                continue;
            }
            let Some(at) = segment_intersection(from, to, road.start(), road.end()) else {
                continue;
            };

            let distance = from.distance_squared(at);
            if closest.is_none_or(|(_, _, best)| distance < best) {
                closest = Some((road_id, at, distance));
            }
        }

        closest.map(|(road, at, _)| (road, at))
    }

    /// Ends the step of `stepper` on `road` at `at`, splitting the road in two when needed.
    fn split_road(&mut self, stepper: PointId, road_id: RoadId, at: Vec2, bridge: bool) -> StepOutcome {
        let Some(road) = self.graph.road(road_id) else {
            return StepOutcome::Blocked;
        };
        let (p1, p2, road_bridge) = (road.p1, road.p2, road.bridge);
        let ends = [(p1, road.start()), (p2, road.end())];
        let Some(from) = self.graph.point(stepper).map(|p| p.pos) else {
            return StepOutcome::Blocked;
        };

        // landed on an existing vertex, connect to it instead of splitting
        for (vertex, pos) in ends {
            if at.distance(pos) > SNAP_EPSILON {
                continue;
            }
            if from.distance(pos) <= SNAP_EPSILON || self.graph.road_between(stepper, vertex).is_some() {
                return StepOutcome::Blocked;
            }
            self.graph.add_road(stepper, vertex, bridge);
            return StepOutcome::Joined(vertex);
        }

        self.graph.remove_road(road_id);

        // the stepper already sits on the road, it becomes the split vertex
        if at.distance(from) <= SNAP_EPSILON {
            for end in [p1, p2] {
                if self.graph.road_between(end, stepper).is_none() {
                    self.graph.add_road(end, stepper, road_bridge);
                }
            }
            return StepOutcome::Joined(stepper);
        }

        let split = self.graph.add_point(Point::intersection(at));
        self.graph.add_road(p1, split, road_bridge);
        self.graph.add_road(split, p2, road_bridge);
        self.graph.add_road(stepper, split, bridge);
        debug!("{} split {} at ({}, {})", stepper, road_id, at.x, at.y);

        StepOutcome::Joined(split)
    }
}
