// road network graph
// points and roads live in slot arenas and refer to each other by id,
// slots are never reused so ids stay stable for the lifetime of the graph

use std::fmt;

use bevy::math::Vec2;

use super::geometry::BoundingPolygon;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoadId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point {}", self.0)
    }
}

impl fmt::Display for RoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road {}", self.0)
    }
}

/// How a point came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointKind {
    Seed,
    Grown,
    Intersection,
}

/// Graph vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub pos: Vec2,
    /// growth direction, intersection points have none
    pub dir: Option<Vec2>,
    /// still growing
    pub head: bool,
    pub split_chance: f32,
    pub kind: PointKind,
    pub(crate) connections: Vec<RoadId>,
}

impl Point {
    pub fn seed(pos: Vec2, dir: Vec2) -> Self {
        Self {
            pos,
            dir: Some(dir),
            head: true,
            split_chance: 0.0,
            kind: PointKind::Seed,
            connections: Vec::new(),
        }
    }

    pub fn grown(pos: Vec2, dir: Vec2, split_chance: f32, head: bool) -> Self {
        Self {
            pos,
            dir: Some(dir),
            head,
            split_chance,
            kind: PointKind::Grown,
            connections: Vec::new(),
        }
    }

    pub fn intersection(pos: Vec2) -> Self {
        Self {
            pos,
            dir: None,
            head: false,
            split_chance: 0.0,
            kind: PointKind::Intersection,
            connections: Vec::new(),
        }
    }

    /// Incident roads, in the order they were attached.
    pub fn connections(&self) -> &[RoadId] {
        &self.connections
    }
}

/// Graph edge between two distinct points. Geometry is fixed at creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Road {
    pub p1: PointId,
    pub p2: PointId,
    pub bridge: bool,
    start: Vec2,
    end: Vec2,
    polygon: BoundingPolygon,
}

impl Road {
    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn end(&self) -> Vec2 {
        self.end
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    pub fn direction(&self) -> Vec2 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn polygon(&self) -> &BoundingPolygon {
        &self.polygon
    }

    pub fn touches(&self, point: PointId) -> bool {
        self.p1 == point || self.p2 == point
    }

    /// The endpoint that is not `point`, if `point` is an endpoint at all.
    pub fn other(&self, point: PointId) -> Option<PointId> {
        if self.p1 == point {
            Some(self.p2)
        } else if self.p2 == point {
            Some(self.p1)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoadGraph {
    points: Vec<Option<Point>>,
    roads: Vec<Option<Road>>,
    point_count: usize,
    road_count: usize,
    mesh_radius: f32,
}

impl RoadGraph {
    pub fn new(mesh_radius: f32) -> Self {
        Self {
            mesh_radius,
            ..Default::default()
        }
    }

    pub fn mesh_radius(&self) -> f32 {
        self.mesh_radius
    }

    /// Rebuilds the corridor polygon of every live road with the new half-width.
    pub fn set_mesh_radius(&mut self, mesh_radius: f32) {
        self.mesh_radius = mesh_radius;
        for road in self.roads.iter_mut().flatten() {
            road.polygon = BoundingPolygon::around_segment(road.start, road.end, mesh_radius);
        }
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn road_count(&self) -> usize {
        self.road_count
    }

    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.roads.clear();
        self.point_count = 0;
        self.road_count = 0;
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn point_mut(&mut self, id: PointId) -> Option<&mut Point> {
        self.points.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn road(&self, id: RoadId) -> Option<&Road> {
        self.roads.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn contains_point(&self, id: PointId) -> bool {
        self.point(id).is_some()
    }

    pub fn contains_road(&self, id: RoadId) -> bool {
        self.road(id).is_some()
    }

    /// Live points in creation order.
    pub fn points(&self) -> impl Iterator<Item = (PointId, &Point)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (PointId(i as u32), p)))
    }

    /// Live roads in creation order.
    pub fn roads(&self) -> impl Iterator<Item = (RoadId, &Road)> {
        self.roads
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (RoadId(i as u32), r)))
    }

    pub fn point_ids(&self) -> Vec<PointId> {
        self.points().map(|(id, _)| id).collect()
    }

    pub fn head_ids(&self) -> Vec<PointId> {
        self.points().filter(|(_, p)| p.head).map(|(id, _)| id).collect()
    }

    pub fn add_point(&mut self, mut point: Point) -> PointId {
        point.connections.clear();
        let id = PointId(self.points.len() as u32);
        self.points.push(Some(point));
        self.point_count += 1;
        id
    }

    /// Creates a road and registers it with both endpoints.
    /// # Returns `None` if either endpoint is missing or both are the same point
    pub fn add_road(&mut self, p1: PointId, p2: PointId, bridge: bool) -> Option<RoadId> {
        if p1 == p2 {
            return None;
        }
        let start = self.point(p1)?.pos;
        let end = self.point(p2)?.pos;

        let id = RoadId(self.roads.len() as u32);
        self.roads.push(Some(Road {
            p1,
            p2,
            bridge,
            start,
            end,
            polygon: BoundingPolygon::around_segment(start, end, self.mesh_radius),
        }));
        self.road_count += 1;

        for endpoint in [p1, p2] {
            if let Some(point) = self.point_mut(endpoint) {
                point.connections.push(id);
            }
        }

        Some(id)
    }

    /// Removes the road from the road set and from both endpoints' connection lists.
    pub fn remove_road(&mut self, id: RoadId) -> Option<Road> {
        let road = self.roads.get_mut(id.0 as usize)?.take()?;
        self.road_count -= 1;

        for endpoint in [road.p1, road.p2] {
            if let Some(point) = self.point_mut(endpoint) {
                point.connections.retain(|&r| r != id);
            }
        }

        Some(road)
    }

    /// Removes the point together with every road attached to it.
    pub fn remove_point(&mut self, id: PointId) -> Option<Point> {
        let connections = self.point(id)?.connections.clone();
        for road in connections {
            self.remove_road(road);
        }

        let point = self.points.get_mut(id.0 as usize)?.take()?;
        self.point_count -= 1;
        Some(point)
    }

    /// Distinct points sharing a road with `id`, in connection order.
    pub fn neighbours(&self, id: PointId) -> Vec<PointId> {
        let Some(point) = self.point(id) else {
            return Vec::new();
        };

        let mut neighbours: Vec<PointId> = Vec::with_capacity(point.connections.len());
        for road in &point.connections {
            if let Some(other) = self.road(*road).and_then(|r| r.other(id)) {
                if !neighbours.contains(&other) {
                    neighbours.push(other);
                }
            }
        }
        neighbours
    }

    pub fn road_between(&self, a: PointId, b: PointId) -> Option<RoadId> {
        self.point(a)?
            .connections
            .iter()
            .copied()
            .find(|r| self.road(*r).is_some_and(|road| road.other(a) == Some(b)))
    }

    /// Contracts `removed` into `survivor`: every other neighbour of `removed`
    /// is linked to `survivor`, then `removed` and its roads are deleted.
    /// # Returns the number of roads created
    pub fn merge_into(&mut self, removed: PointId, survivor: PointId) -> usize {
        if removed == survivor || !self.contains_point(survivor) {
            return 0;
        }
        let Some(removed_point) = self.point(removed) else {
            return 0;
        };
        let removed_pos = removed_point.pos;

        // rewired roads keep the bridge flag of the road they replace
        let rewired: Vec<(PointId, bool)> = removed_point
            .connections
            .iter()
            .filter_map(|r| self.road(*r))
            .filter_map(|road| road.other(removed).map(|n| (n, road.bridge)))
            .filter(|(n, _)| *n != survivor)
            .collect();

        self.remove_point(removed);

        let survivor_pos = self.point(survivor).map(|p| p.pos).unwrap_or(removed_pos);
        let mut created = 0;
        for (neighbour, bridge) in rewired {
            let Some(neighbour_pos) = self.point(neighbour).map(|p| p.pos) else {
                continue;
            };
            if self.road_between(neighbour, survivor).is_some()
                || neighbour_pos.distance_squared(survivor_pos) <= f32::EPSILON
            {
                continue;
            }
            if self.add_road(neighbour, survivor, bridge).is_some() {
                created += 1;
            }
        }
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(graph: &mut RoadGraph, a: Vec2, b: Vec2) -> (PointId, PointId, RoadId) {
        let p1 = graph.add_point(Point::intersection(a));
        let p2 = graph.add_point(Point::intersection(b));
        let road = graph.add_road(p1, p2, false).unwrap();
        (p1, p2, road)
    }

    #[test]
    fn roads_register_with_both_endpoints() {
        let mut graph = RoadGraph::new(1.0);
        let (p1, p2, road) = line(&mut graph, Vec2::ZERO, Vec2::new(10.0, 0.0));

        assert_eq!(graph.point(p1).unwrap().connections(), &[road]);
        assert_eq!(graph.point(p2).unwrap().connections(), &[road]);
        assert_eq!(graph.road_between(p1, p2), Some(road));
        assert_eq!(graph.road(road).unwrap().length(), 10.0);
        assert_eq!(graph.road(road).unwrap().midpoint(), Vec2::new(5.0, 0.0));
        assert_eq!(graph.road(road).unwrap().direction(), Vec2::X);
    }

    #[test]
    fn self_loops_are_refused() {
        let mut graph = RoadGraph::new(1.0);
        let p = graph.add_point(Point::intersection(Vec2::ZERO));
        assert_eq!(graph.add_road(p, p, false), None);
        assert_eq!(graph.road_count(), 0);
    }

    #[test]
    fn removing_a_road_unlinks_endpoints() {
        let mut graph = RoadGraph::new(1.0);
        let (p1, p2, road) = line(&mut graph, Vec2::ZERO, Vec2::X);

        assert!(graph.remove_road(road).is_some());
        assert!(graph.remove_road(road).is_none());
        assert!(graph.point(p1).unwrap().connections().is_empty());
        assert!(graph.point(p2).unwrap().connections().is_empty());
        assert_eq!(graph.road_count(), 0);
    }

    #[test]
    fn changing_the_radius_rebuilds_road_corridors() {
        let mut graph = RoadGraph::new(2.0);
        let (_, _, road) = line(&mut graph, Vec2::ZERO, Vec2::new(10.0, 0.0));

        graph.set_mesh_radius(0.5);
        let ys: Vec<f32> = graph.road(road).unwrap().polygon().corners().iter().map(|c| c.y.abs()).collect();
        assert!(ys.iter().all(|y| (y - 0.5).abs() < 1e-5), "{ys:?}");
        assert_eq!(graph.mesh_radius(), 0.5);
    }

    #[test]
    fn ids_stay_stable_after_removal() {
        let mut graph = RoadGraph::new(1.0);
        let a = graph.add_point(Point::intersection(Vec2::ZERO));
        let b = graph.add_point(Point::intersection(Vec2::X));
        graph.remove_point(a);
        let c = graph.add_point(Point::intersection(Vec2::Y));

        assert_ne!(a, c);
        assert_eq!(graph.point(b).unwrap().pos, Vec2::X);
        assert_eq!(graph.point_ids(), vec![b, c]);
        assert_eq!(graph.point_count(), 2);
    }

    #[test]
    fn merging_rewires_neighbours_onto_survivor() {
        // a - b - c, merge b into a: c must now be linked to a
        let mut graph = RoadGraph::new(1.0);
        let a = graph.add_point(Point::intersection(Vec2::ZERO));
        let b = graph.add_point(Point::intersection(Vec2::new(1.0, 0.0)));
        let c = graph.add_point(Point::intersection(Vec2::new(10.0, 0.0)));
        graph.add_road(a, b, false);
        graph.add_road(b, c, true);

        assert_eq!(graph.merge_into(b, a), 1);
        assert!(!graph.contains_point(b));
        let road = graph.road_between(a, c).unwrap();
        assert!(graph.road(road).unwrap().bridge);
        assert_eq!(graph.road_count(), 1);
        assert_eq!(graph.neighbours(a), vec![c]);
    }

    #[test]
    fn merging_does_not_duplicate_existing_roads() {
        let mut graph = RoadGraph::new(1.0);
        let a = graph.add_point(Point::intersection(Vec2::ZERO));
        let b = graph.add_point(Point::intersection(Vec2::new(1.0, 0.0)));
        let c = graph.add_point(Point::intersection(Vec2::new(5.0, 5.0)));
        graph.add_road(a, b, false);
        graph.add_road(b, c, false);
        graph.add_road(a, c, false);

        assert_eq!(graph.merge_into(b, a), 0);
        assert_eq!(graph.road_count(), 1);
    }
}
