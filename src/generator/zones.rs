// zones the host marks on the map
// roads never step into forbidden zones, and take a longer bridge step across bridge zones

use bevy::math::Vec2;

/// Host supplied answers about positions in generator space.
pub trait ZoneOracle {
    fn is_forbidden(&self, pos: Vec2) -> bool;
    fn is_bridge_zone(&self, pos: Vec2) -> bool;
}

/// Every position is buildable.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoZones;

impl ZoneOracle for NoZones {
    fn is_forbidden(&self, _pos: Vec2) -> bool {
        false
    }

    fn is_bridge_zone(&self, _pos: Vec2) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Zone {
    Circle { center: Vec2, radius: f32 },
    Rect { min: Vec2, max: Vec2 },
}

impl Zone {
    pub fn contains(&self, pos: Vec2) -> bool {
        match *self {
            Zone::Circle { center, radius } => pos.distance_squared(center) <= radius * radius,
            Zone::Rect { min, max } => pos.cmpge(min).all() && pos.cmple(max).all(),
        }
    }
}

/// Regions registered by the host, split by what they mean for roads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneMap {
    pub avoid: Vec<Zone>,
    pub bridge_over: Vec<Zone>,
}

impl ZoneMap {
    pub fn with_avoid(mut self, zone: Zone) -> Self {
        self.avoid.push(zone);
        self
    }

    pub fn with_bridge_over(mut self, zone: Zone) -> Self {
        self.bridge_over.push(zone);
        self
    }
}

impl ZoneOracle for ZoneMap {
    fn is_forbidden(&self, pos: Vec2) -> bool {
        self.avoid.iter().any(|zone| zone.contains(pos))
    }

    fn is_bridge_zone(&self, pos: Vec2) -> bool {
        self.bridge_over.iter().any(|zone| zone.contains(pos))
    }
}

impl<T: ZoneOracle + ?Sized> ZoneOracle for &T {
    fn is_forbidden(&self, pos: Vec2) -> bool {
        (**self).is_forbidden(pos)
    }

    fn is_bridge_zone(&self, pos: Vec2) -> bool {
        (**self).is_bridge_zone(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_map_answers_per_kind() {
        let zones = ZoneMap::default()
            .with_avoid(Zone::Circle {
                center: Vec2::new(10.0, 10.0),
                radius: 5.0,
            })
            .with_bridge_over(Zone::Rect {
                min: Vec2::new(50.0, 0.0),
                max: Vec2::new(60.0, 100.0),
            });

        assert!(zones.is_forbidden(Vec2::new(12.0, 10.0)));
        assert!(!zones.is_forbidden(Vec2::new(20.0, 10.0)));
        assert!(zones.is_bridge_zone(Vec2::new(55.0, 40.0)));
        assert!(!zones.is_bridge_zone(Vec2::new(45.0, 40.0)));
        assert!(!zones.is_bridge_zone(Vec2::new(12.0, 10.0)));
    }

    #[test]
    fn no_zones_allows_everything() {
        assert!(!NoZones.is_forbidden(Vec2::ZERO));
        assert!(!NoZones.is_bridge_zone(Vec2::ZERO));
    }
}
