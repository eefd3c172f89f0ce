//! Geospatial types

use crate::types::keys::SortOrder;

/// A longitude/latitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Longitude (x)
    pub longitude: f64,
    /// Latitude (y)
    pub latitude: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// Distance unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    /// Meters (`m`)
    #[default]
    Meters,
    /// Kilometers (`km`)
    Kilometers,
    /// Miles (`mi`)
    Miles,
    /// Feet (`ft`)
    Feet,
}

impl Metric {
    /// Unit abbreviation understood by the server
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Miles => "mi",
            Self::Feet => "ft",
        }
    }

    /// Length of one unit in meters
    pub const fn meters(self) -> f64 {
        match self {
            Self::Meters => 1.0,
            Self::Kilometers => 1000.0,
            Self::Miles => 1609.344,
            Self::Feet => 0.3048,
        }
    }
}

/// A distance in a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    /// Amount of `metric`
    pub value: f64,
    /// Unit of `value`
    pub metric: Metric,
}

impl Distance {
    /// Create a new distance
    pub const fn new(value: f64, metric: Metric) -> Self {
        Self { value, metric }
    }

    /// Distance in meters
    pub const fn meters(value: f64) -> Self {
        Self::new(value, Metric::Meters)
    }

    /// Distance in kilometers
    pub const fn kilometers(value: f64) -> Self {
        Self::new(value, Metric::Kilometers)
    }

    /// Express the same distance in another unit
    #[must_use]
    pub fn in_metric(&self, metric: Metric) -> Self {
        Self::new(self.value * self.metric.meters() / metric.meters(), metric)
    }
}

/// A circle on the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center of the circle
    pub center: Point,
    /// Radius of the circle
    pub radius: Distance,
}

impl Circle {
    /// Create a new circle
    pub const fn new(center: Point, radius: Distance) -> Self {
        Self { center, radius }
    }
}

/// A named member with its position
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation<T> {
    /// Member name
    pub name: T,
    /// Position; absent when coordinates were not requested
    pub point: Option<Point>,
}

impl<T> GeoLocation<T> {
    /// Create a new location
    pub const fn new(name: T, point: Point) -> Self {
        Self {
            name,
            point: Some(point),
        }
    }
}

/// A single search hit
#[derive(Debug, Clone, PartialEq)]
pub struct GeoResult<T> {
    /// The matching member
    pub content: GeoLocation<T>,
    /// Distance from the search center; zero when not requested
    pub distance: Distance,
}

/// All hits of a search
#[derive(Debug, Clone, PartialEq)]
pub struct GeoResults<T> {
    /// Hits in server order
    pub results: Vec<GeoResult<T>>,
    /// Mean distance of the hits, in the query's unit
    pub average_distance: Distance,
}

impl<T> GeoResults<T> {
    /// Build results, computing the average distance
    pub fn new(results: Vec<GeoResult<T>>, metric: Metric) -> Self {
        let average = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.distance.value).sum::<f64>() / results.len() as f64
        };
        Self {
            results,
            average_distance: Distance::new(average, metric),
        }
    }

    /// Number of hits
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no hits
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Options for `GEORADIUS`, `GEORADIUSBYMEMBER` and `GEOSEARCH`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoRadiusArgs {
    /// `WITHCOORD`
    pub with_coord: bool,
    /// `WITHDIST`
    pub with_dist: bool,
    /// `COUNT n`
    pub limit: Option<u64>,
    /// `ANY`, only sent together with `COUNT`
    pub any: bool,
    /// `ASC` / `DESC`
    pub sort: Option<SortOrder>,
}

impl GeoRadiusArgs {
    /// Arguments without options
    pub fn new() -> Self {
        Self::default()
    }

    /// Include coordinates of the hits
    #[must_use]
    pub const fn include_coordinates(mut self) -> Self {
        self.with_coord = true;
        self
    }

    /// Include the distance of the hits
    #[must_use]
    pub const fn include_distance(mut self) -> Self {
        self.with_dist = true;
        self
    }

    /// Return at most `count` hits
    #[must_use]
    pub const fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Return the first `count` hits found, not the closest ones
    #[must_use]
    pub const fn limit_any(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self.any = true;
        self
    }

    /// Closest hits first
    #[must_use]
    pub const fn sort_ascending(mut self) -> Self {
        self.sort = Some(SortOrder::Asc);
        self
    }

    /// Farthest hits first
    #[must_use]
    pub const fn sort_descending(mut self) -> Self {
        self.sort = Some(SortOrder::Desc);
        self
    }
}

/// Center of a `GEOSEARCH`
#[derive(Debug, Clone, PartialEq)]
pub enum GeoReference<T> {
    /// An existing member (`FROMMEMBER`)
    Member(T),
    /// Explicit coordinates (`FROMLONLAT`)
    Coordinates(Point),
}

/// Area of a `GEOSEARCH`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoShape {
    /// Circle around the reference (`BYRADIUS`)
    Radius(Distance),
    /// Axis aligned box centred on the reference (`BYBOX`)
    Box {
        /// Box width
        width: f64,
        /// Box height
        height: f64,
        /// Unit of width and height
        metric: Metric,
    },
}

impl GeoShape {
    /// Unit distances in results are reported in
    pub const fn metric(&self) -> Metric {
        match self {
            Self::Radius(distance) => distance.metric,
            Self::Box { metric, .. } => *metric,
        }
    }
}

/// Options for `GEOSEARCHSTORE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeoSearchStoreArgs {
    /// `COUNT n`
    pub limit: Option<u64>,
    /// `ANY`, only sent together with `COUNT`
    pub any: bool,
    /// `ASC` / `DESC`
    pub sort: Option<SortOrder>,
    /// `STOREDIST`: store distances instead of positions
    pub store_distance: bool,
}

impl GeoSearchStoreArgs {
    /// Arguments without options
    pub fn new() -> Self {
        Self::default()
    }

    /// Store at most `count` hits
    #[must_use]
    pub const fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Store the first `count` hits found
    #[must_use]
    pub const fn limit_any(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self.any = true;
        self
    }

    /// Closest hits first
    #[must_use]
    pub const fn sort_ascending(mut self) -> Self {
        self.sort = Some(SortOrder::Asc);
        self
    }

    /// Farthest hits first
    #[must_use]
    pub const fn sort_descending(mut self) -> Self {
        self.sort = Some(SortOrder::Desc);
        self
    }

    /// Store distances as scores
    #[must_use]
    pub const fn store_distance(mut self) -> Self {
        self.store_distance = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_conversion() {
        let d = Distance::kilometers(1.5).in_metric(Metric::Meters);
        assert!((d.value - 1500.0).abs() < f64::EPSILON);
        let miles = Distance::meters(1609.344).in_metric(Metric::Miles);
        assert!((miles.value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_distance() {
        let hit = |name: &'static str, km: f64| GeoResult {
            content: GeoLocation {
                name,
                point: None,
            },
            distance: Distance::kilometers(km),
        };
        let results = GeoResults::new(vec![hit("a", 1.0), hit("b", 3.0)], Metric::Kilometers);
        assert_eq!(results.len(), 2);
        assert_eq!(results.average_distance, Distance::kilometers(2.0));
        assert!(GeoResults::<&str>::new(vec![], Metric::Meters).is_empty());
    }
}
