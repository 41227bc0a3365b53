// graph cleanup after growth

use std::fmt;

use bevy::log::{error, info};

use super::geometry::angle_between_degrees;
use super::graph::{PointId, RoadGraph, RoadId};

/// One broken link found by [`RoadGraph::verify_connections`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// the point lists a road that is not in the road set
    DanglingConnection { point: PointId, road: RoadId },
    /// the point lists a road it is not an endpoint of
    ForeignConnection { point: PointId, road: RoadId },
    /// the road ends on a point that is not in the point set
    MissingEndpoint { road: RoadId, point: PointId },
    /// the road's endpoint does not list the road back
    UnlinkedRoad { road: RoadId, point: PointId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DanglingConnection { point, road } => {
                write!(f, "{point} has a connection to {road}, which is not in the road list")
            }
            Violation::ForeignConnection { point, road } => {
                write!(f, "{point} has a connection to {road}, which does not end on it")
            }
            Violation::MissingEndpoint { road, point } => {
                write!(f, "{road} ends on {point}, which is not in the point list")
            }
            Violation::UnlinkedRoad { road, point } => {
                write!(f, "{road} ends on {point}, which does not list it as a connection")
            }
        }
    }
}

/// Result of a consistency audit. Every violation is collected, not just the first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionReport {
    pub violations: Vec<Violation>,
}

impl ConnectionReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ConnectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "All connections are valid");
        }
        write!(f, "{} invalid connections", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n- {violation}")?;
        }
        Ok(())
    }
}

impl RoadGraph {
    /// Smallest angle in degrees between any two roads leaving the point.
    /// # Returns `None` for points with fewer than two connections, they count as perfectly straight
    pub fn straightness(&self, id: PointId) -> Option<f32> {
        let pos = self.point(id)?.pos;
        let rays: Vec<_> = self
            .neighbours(id)
            .into_iter()
            .filter_map(|n| self.point(n))
            .map(|n| n.pos - pos)
            .collect();

        let mut min: Option<f32> = None;
        for i in 0..rays.len() {
            for j in (i + 1)..rays.len() {
                let angle = angle_between_degrees(rays[i], rays[j]);
                min = Some(min.map_or(angle, |m| m.min(angle)));
            }
        }
        min
    }

    /// Contracts every pair of points closer than `threshold`, dropping the less straight one.
    /// Pairs are visited in ascending creation order, ties drop the later point.
    /// # Returns the number of points removed
    pub fn merge_by_distance(&mut self, threshold: f32) -> usize {
        let ids = self.point_ids();
        let threshold_sq = threshold * threshold;
        let mut removed = 0;

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let (Some(pa), Some(pb)) = (self.point(a), self.point(b)) else {
                    // a was merged away, nothing left to pair it with
                    if !self.contains_point(a) {
                        break;
                    }
                    continue;
                };
                if pa.pos.distance_squared(pb.pos) >= threshold_sq {
                    continue;
                }

                let straight_a = self.straightness(a).unwrap_or(f32::MAX);
                let straight_b = self.straightness(b).unwrap_or(f32::MAX);
                if straight_a < straight_b {
                    self.merge_into(a, b);
                    removed += 1;
                    break;
                }
                self.merge_into(b, a);
                removed += 1;
            }
        }

        info!("merged {} points closer than {}", removed, threshold);
        removed
    }

    /// Contracts every point whose straightness falls outside `min..=max` degrees
    /// into its nearest neighbour.
    /// # Returns the number of points removed
    pub fn merge_unacceptable_straights(&mut self, min: f32, max: f32) -> usize {
        let mut removed = 0;

        for id in self.point_ids() {
            let Some(straightness) = self.straightness(id) else {
                continue;
            };
            if (min..=max).contains(&straightness) {
                continue;
            }
            let Some(pos) = self.point(id).map(|p| p.pos) else {
                continue;
            };

            let nearest = self
                .neighbours(id)
                .into_iter()
                .filter_map(|n| self.point(n).map(|p| (n, p.pos.distance_squared(pos))))
                .fold(None, |best: Option<(PointId, f32)>, (n, d)| match best {
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((n, d)),
                });

            if let Some((survivor, _)) = nearest {
                self.merge_into(id, survivor);
                removed += 1;
            }
        }

        info!(
            "merged {} points with straightness outside {}..={}",
            removed, min, max
        );
        removed
    }

    /// Makes adjacency symmetric: both endpoints of every live road list it,
    /// and points drop connections to missing or foreign roads.
    /// # Returns the number of connection entries added or dropped
    pub fn double_link(&mut self) -> usize {
        let mut repaired = 0;

        // roads referenced by a point but missing from the other endpoint, or never registered at all
        let roads: Vec<(RoadId, PointId, PointId)> = self.roads().map(|(id, r)| (id, r.p1, r.p2)).collect();
        for (road, p1, p2) in roads {
            for endpoint in [p1, p2] {
                if let Some(point) = self.point_mut(endpoint) {
                    if !point.connections.contains(&road) {
                        point.connections.push(road);
                        repaired += 1;
                    }
                }
            }
        }

        for id in self.point_ids() {
            let stale: Vec<RoadId> = self
                .point(id)
                .map(|p| {
                    p.connections
                        .iter()
                        .copied()
                        .filter(|r| !self.road(*r).is_some_and(|road| road.touches(id)))
                        .collect()
                })
                .unwrap_or_default();

            if let Some(point) = self.point_mut(id) {
                point.connections.retain(|r| !stale.contains(r));
            }
            repaired += stale.len();
        }

        info!("double linking repaired {} connections", repaired);
        repaired
    }

    /// Audits the graph without changing it.
    pub fn verify_connections(&self) -> ConnectionReport {
        let mut violations = Vec::new();

        for (id, point) in self.points() {
            for &road_id in point.connections() {
                match self.road(road_id) {
                    None => violations.push(Violation::DanglingConnection { point: id, road: road_id }),
                    Some(road) if !road.touches(id) => {
                        violations.push(Violation::ForeignConnection { point: id, road: road_id })
                    }
                    Some(_) => {}
                }
            }
        }

        for (road_id, road) in self.roads() {
            for endpoint in [road.p1, road.p2] {
                match self.point(endpoint) {
                    None => violations.push(Violation::MissingEndpoint { road: road_id, point: endpoint }),
                    Some(point) if !point.connections().contains(&road_id) => {
                        violations.push(Violation::UnlinkedRoad { road: road_id, point: endpoint })
                    }
                    Some(_) => {}
                }
            }
        }

        let report = ConnectionReport { violations };
        if report.is_valid() {
            info!("{}", report);
        } else {
            for violation in &report.violations {
                error!("{}", violation);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use bevy::math::Vec2;

    use super::*;
    use crate::generator::graph::Point;

    fn point(graph: &mut RoadGraph, x: f32, y: f32) -> PointId {
        graph.add_point(Point::intersection(Vec2::new(x, y)))
    }

    #[test]
    fn straightness_is_the_smallest_angle() {
        let mut graph = RoadGraph::new(1.0);
        let center = point(&mut graph, 0.0, 0.0);
        let east = point(&mut graph, 10.0, 0.0);
        let north = point(&mut graph, 0.0, 10.0);
        let west = point(&mut graph, -10.0, 0.0);

        assert_eq!(graph.straightness(center), None);
        graph.add_road(center, east, false);
        assert_eq!(graph.straightness(center), None);

        graph.add_road(center, west, false);
        assert_abs_diff_eq!(graph.straightness(center).unwrap(), 180.0, epsilon = 1e-3);

        graph.add_road(center, north, false);
        assert_abs_diff_eq!(graph.straightness(center).unwrap(), 90.0, epsilon = 1e-3);
    }

    #[test]
    fn close_points_merge_into_one() {
        // a - b  c - d where b and c nearly touch
        let mut graph = RoadGraph::new(1.0);
        let a = point(&mut graph, 0.0, 0.0);
        let b = point(&mut graph, 10.0, 0.0);
        let c = point(&mut graph, 11.0, 0.0);
        let d = point(&mut graph, 20.0, 5.0);
        graph.add_road(a, b, false);
        graph.add_road(c, d, false);

        assert_eq!(graph.merge_by_distance(3.0), 1);
        assert_eq!(graph.point_count(), 3);
        // both have one connection, the tie drops the later one
        assert!(graph.contains_point(b));
        assert!(!graph.contains_point(c));
        assert!(graph.road_between(b, d).is_some());
        assert!(graph.verify_connections().is_valid());
    }

    #[test]
    fn merging_drops_the_sharper_point() {
        let mut graph = RoadGraph::new(1.0);
        // b is a sharp corner, c is a straight pass-through
        let b = point(&mut graph, 0.0, 0.0);
        let c = point(&mut graph, 1.0, 0.0);
        let b1 = point(&mut graph, -10.0, 0.0);
        let b2 = point(&mut graph, -10.0, 3.0);
        let c1 = point(&mut graph, 1.0, 10.0);
        let c2 = point(&mut graph, 1.0, -10.0);
        graph.add_road(b, b1, false);
        graph.add_road(b, b2, false);
        graph.add_road(c, c1, false);
        graph.add_road(c, c2, false);

        assert_eq!(graph.merge_by_distance(2.0), 1);
        assert!(!graph.contains_point(b));
        assert!(graph.road_between(c, b1).is_some());
        assert!(graph.road_between(c, b2).is_some());
    }

    #[test]
    fn far_points_are_left_alone() {
        let mut graph = RoadGraph::new(1.0);
        point(&mut graph, 0.0, 0.0);
        point(&mut graph, 10.0, 0.0);
        assert_eq!(graph.merge_by_distance(3.0), 0);
        assert_eq!(graph.point_count(), 2);
    }

    #[test]
    fn near_straight_points_are_contracted() {
        // a - b - c almost straight, b should disappear and a - c be linked
        let mut graph = RoadGraph::new(1.0);
        let a = point(&mut graph, 0.0, 0.0);
        let b = point(&mut graph, 10.0, 0.1);
        let c = point(&mut graph, 20.0, 0.0);
        graph.add_road(a, b, false);
        graph.add_road(b, c, false);

        assert_eq!(graph.merge_unacceptable_straights(15.0, 175.0), 1);
        assert!(!graph.contains_point(b));
        assert!(graph.road_between(a, c).is_some());
        assert_eq!(graph.road_count(), 1);
    }

    #[test]
    fn sharp_junctions_fold_into_the_nearest_neighbour() {
        // about 5.7 degrees between a-b and a-c, b is the closer of the two
        let mut graph = RoadGraph::new(1.0);
        let a = point(&mut graph, 0.0, 0.0);
        let b = point(&mut graph, 10.0, 0.0);
        let c = point(&mut graph, 10.0, 1.0);
        graph.add_road(a, b, false);
        graph.add_road(a, c, false);
        assert!(graph.straightness(a).unwrap() < 15.0);

        assert_eq!(graph.merge_unacceptable_straights(15.0, 175.0), 1);
        assert!(!graph.contains_point(a));
        assert!(graph.contains_point(b));
        assert!(graph.road_between(b, c).is_some());
        assert_eq!(graph.road_count(), 1);
    }

    #[test]
    fn acceptable_junctions_survive() {
        let mut graph = RoadGraph::new(1.0);
        let a = point(&mut graph, 0.0, 0.0);
        let b = point(&mut graph, 10.0, 0.0);
        let c = point(&mut graph, 10.0, 10.0);
        graph.add_road(a, b, false);
        graph.add_road(b, c, false);

        assert_eq!(graph.merge_unacceptable_straights(15.0, 175.0), 0);
        assert_eq!(graph.point_count(), 3);
    }

    #[test]
    fn double_link_repairs_one_sided_connections() {
        let mut graph = RoadGraph::new(1.0);
        let a = point(&mut graph, 0.0, 0.0);
        let b = point(&mut graph, 10.0, 0.0);
        let road = graph.add_road(a, b, false).unwrap();

        // break symmetry and add a stale entry
        graph.point_mut(b).unwrap().connections.clear();
        graph.point_mut(a).unwrap().connections.push(RoadId(42));

        let report = graph.verify_connections();
        assert_eq!(
            report.violations,
            vec![
                Violation::DanglingConnection { point: a, road: RoadId(42) },
                Violation::UnlinkedRoad { road, point: b },
            ]
        );

        assert_eq!(graph.double_link(), 2);
        assert!(graph.verify_connections().is_valid());
        assert_eq!(graph.point(b).unwrap().connections(), &[road]);
    }

    #[test]
    fn verify_reports_every_violation() {
        let mut graph = RoadGraph::new(1.0);
        let a = point(&mut graph, 0.0, 0.0);
        let b = point(&mut graph, 10.0, 0.0);
        let c = point(&mut graph, 20.0, 0.0);
        let ab = graph.add_road(a, b, false).unwrap();
        graph.add_road(b, c, false);

        // c claims a road it does not belong to, b forgets both of its roads
        graph.point_mut(c).unwrap().connections.push(ab);
        graph.point_mut(b).unwrap().connections.clear();

        let report = graph.verify_connections();
        assert!(!report.is_valid());
        assert!(report.violations.contains(&Violation::ForeignConnection { point: c, road: ab }));
        assert_eq!(
            report
                .violations
                .iter()
                .filter(|v| matches!(v, Violation::UnlinkedRoad { point, .. } if *point == b))
                .count(),
            2
        );
        assert!(report.to_string().starts_with("3 invalid connections"));
    }

    #[test]
    fn valid_report_prints_a_pass_line() {
        let graph = RoadGraph::new(1.0);
        assert_eq!(graph.verify_connections().to_string(), "All connections are valid");
    }
}
