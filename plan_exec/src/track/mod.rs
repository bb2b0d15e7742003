//! # Track Map
//!
//! The track map is the ordered table of centreline waypoints describing the closed-loop track.
//! It is loaded once at startup and shared read-only by every planning cycle.
//!
//! Index order is spatial order along the direction of travel. The arc-length `s` of each
//! waypoint increases monotonically with index, and wraps from `max_s` back to zero after the last
//! waypoint.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod frenet;
mod lanes;
pub mod synthetic;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Internal
pub use frenet::*;
pub use lanes::*;
use util::maths::abs_ang_dist;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Heading difference above which the closest waypoint is considered to be behind the vehicle.
const NEXT_WAYPOINT_MAX_ANGLE_RAD: f64 = std::f64::consts::FRAC_PI_4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sampled point on the track centreline.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position in the global frame
    pub position_m: Vector2<f64>,

    /// Arc-length along the centreline
    pub s_m: f64,

    /// Unit lateral normal, pointing towards increasing `d`
    pub normal: Vector2<f64>,
}

/// The immutable waypoint table of the track.
#[derive(Debug, Clone)]
pub struct TrackMap {
    waypoints: Vec<Waypoint>,

    /// Sum of the straight segment lengths from waypoint 0 up to each waypoint
    chord_s_m: Vec<f64>,

    /// Circumference of the track, the arc-length at which `s` wraps to zero
    max_s_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrackMapError {
    #[error("Could not read the map file: {0}")]
    IoError(std::io::Error),

    #[error("Could not read map row {0}: {1}")]
    CsvError(usize, csv::Error),

    #[error("Map row {0} has {1} fields, expected 5 (x y s dx dy)")]
    WrongFieldCount(usize, usize),

    #[error("Map row {0} contains a value which is not a number: \"{1}\"")]
    InvalidNumber(usize, String),

    #[error("A track map needs at least 2 waypoints, found {0}")]
    TooFewWaypoints(usize),

    #[error("The track length must be positive and finite, found {0}")]
    InvalidMaxS(f64),

    #[error("Waypoint {0} does not have an arc-length greater than the previous one")]
    NonMonotonicS(usize),

    #[error("Waypoint {0} has an arc-length beyond the track length")]
    SBeyondMax(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(x: f64, y: f64, s_m: f64, dx: f64, dy: f64) -> Self {
        Self {
            position_m: Vector2::new(x, y),
            s_m,
            normal: Vector2::new(dx, dy),
        }
    }
}

impl TrackMap {
    /// Build a map from an ordered list of waypoints and the track length.
    pub fn new(waypoints: Vec<Waypoint>, max_s_m: f64) -> Result<Self, TrackMapError> {
        if waypoints.len() < 2 {
            return Err(TrackMapError::TooFewWaypoints(waypoints.len()));
        }

        if !(max_s_m.is_finite() && max_s_m > 0.0) {
            return Err(TrackMapError::InvalidMaxS(max_s_m));
        }

        // Segment lookup is a binary search over s, so s must be strictly increasing
        for (i, pair) in waypoints.windows(2).enumerate() {
            if pair[1].s_m <= pair[0].s_m {
                return Err(TrackMapError::NonMonotonicS(i + 1));
            }
        }
        if let Some(i) = waypoints.iter().position(|w| w.s_m >= max_s_m) {
            return Err(TrackMapError::SBeyondMax(i));
        }

        let mut chord_s_m = Vec::with_capacity(waypoints.len());
        chord_s_m.push(0.0);
        for pair in waypoints.windows(2) {
            let last = chord_s_m[chord_s_m.len() - 1];
            chord_s_m.push(last + (pair[1].position_m - pair[0].position_m).norm());
        }

        Ok(Self {
            waypoints,
            chord_s_m,
            max_s_m,
        })
    }

    /// Load a map from a waypoint file.
    ///
    /// Each row is `x y s dx dy`, with no header. Fields may be separated by spaces, tabs or
    /// commas.
    pub fn from_csv_file<P: AsRef<Path>>(path: P, max_s_m: f64) -> Result<Self, TrackMapError> {
        let contents = std::fs::read_to_string(path).map_err(TrackMapError::IoError)?;

        Self::from_csv_str(&contents, max_s_m)
    }

    /// Parse a map from the contents of a waypoint file.
    pub fn from_csv_str(contents: &str, max_s_m: f64) -> Result<Self, TrackMapError> {
        // The delimiter is picked from the first row
        let delimiter = match contents.lines().next() {
            Some(l) if l.contains(',') => b',',
            Some(l) if l.contains('\t') => b'\t',
            _ => b' ',
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let mut waypoints = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| TrackMapError::CsvError(row, e))?;

            // Runs of separators produce empty fields, which are skipped
            let fields: Vec<&str> = record
                .iter()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect();

            if fields.is_empty() {
                continue;
            }
            if fields.len() != 5 {
                return Err(TrackMapError::WrongFieldCount(row, fields.len()));
            }

            let mut vals = [0f64; 5];
            for (v, f) in vals.iter_mut().zip(fields.iter()) {
                *v = f
                    .parse()
                    .map_err(|_| TrackMapError::InvalidNumber(row, f.to_string()))?;
            }

            waypoints.push(Waypoint::new(vals[0], vals[1], vals[2], vals[3], vals[4]));
        }

        debug!("Parsed {} track waypoints", waypoints.len());

        Self::new(waypoints, max_s_m)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Track circumference.
    pub fn max_s(&self) -> f64 {
        self.max_s_m
    }

    /// Index of the waypoint after `index`, wrapping at the end of the table.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    /// Index of the waypoint before `index`, wrapping at the start of the table.
    pub fn prev_index(&self, index: usize) -> usize {
        match index {
            0 => self.waypoints.len() - 1,
            i => i - 1,
        }
    }

    /// Index of the waypoint nearest to `position_m`.
    ///
    /// This is a linear scan, on ties the lowest index wins.
    pub fn closest_waypoint(&self, position_m: &Vector2<f64>) -> usize {
        let mut closest_dist_m = std::f64::INFINITY;
        let mut closest = 0;

        for (i, wp) in self.waypoints.iter().enumerate() {
            let dist_m = (wp.position_m - position_m).norm();
            if dist_m < closest_dist_m {
                closest_dist_m = dist_m;
                closest = i;
            }
        }

        closest
    }

    /// Index of the first waypoint ahead of a vehicle at `position_m` facing `heading_rad`.
    ///
    /// This is the closest waypoint, unless it lies more than 45 degrees away from the heading, in
    /// which case it is behind the vehicle and the one after it is used.
    pub fn next_waypoint(&self, position_m: &Vector2<f64>, heading_rad: f64) -> usize {
        let closest = self.closest_waypoint(position_m);

        let to_wp = self.waypoints[closest].position_m - position_m;
        let bearing_rad = to_wp.y.atan2(to_wp.x);

        if abs_ang_dist(heading_rad, bearing_rad) > NEXT_WAYPOINT_MAX_ANGLE_RAD {
            self.next_index(closest)
        } else {
            closest
        }
    }

    /// Index of the waypoint starting the segment which contains the arc-length `s_m`, i.e. the
    /// `prev` for which `s[prev] <= s < s[prev + 1]`.
    ///
    /// `s_m` must already be wrapped into `[0, max_s)`. Arc-lengths beyond the last waypoint, or
    /// before the first when the first waypoint is not at zero, belong to the closing segment
    /// from the last waypoint back to the first.
    pub fn segment_index(&self, s_m: f64) -> usize {
        match self.waypoints.partition_point(|w| w.s_m <= s_m) {
            0 => self.waypoints.len() - 1,
            i => i - 1,
        }
    }

    /// Heading of the segment starting at waypoint `index`.
    pub fn segment_heading(&self, index: usize) -> f64 {
        let diff = self.waypoints[self.next_index(index)].position_m
            - self.waypoints[index].position_m;
        diff.y.atan2(diff.x)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_map() -> TrackMap {
        // 100 m square driven anticlockwise, normals pointing outwards (to the right)
        TrackMap::new(
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 0.0, -1.0),
                Waypoint::new(100.0, 0.0, 100.0, 1.0, 0.0),
                Waypoint::new(100.0, 100.0, 200.0, 0.0, 1.0),
                Waypoint::new(0.0, 100.0, 300.0, -1.0, 0.0),
            ],
            400.0,
        )
        .unwrap()
    }

    #[test]
    fn test_new_validation() {
        assert!(matches!(
            TrackMap::new(vec![Waypoint::new(0.0, 0.0, 0.0, 0.0, 1.0)], 10.0),
            Err(TrackMapError::TooFewWaypoints(1))
        ));

        let wps = vec![
            Waypoint::new(0.0, 0.0, 0.0, 0.0, 1.0),
            Waypoint::new(1.0, 0.0, 1.0, 0.0, 1.0),
        ];
        assert!(matches!(
            TrackMap::new(wps.clone(), 0.0),
            Err(TrackMapError::InvalidMaxS(_))
        ));
        assert!(matches!(
            TrackMap::new(wps.clone(), 1.0),
            Err(TrackMapError::SBeyondMax(1))
        ));

        let mut backwards = wps;
        backwards[1].s_m = 0.0;
        assert!(matches!(
            TrackMap::new(backwards, 10.0),
            Err(TrackMapError::NonMonotonicS(1))
        ));
    }

    #[test]
    fn test_from_csv_str() {
        let spaced = "784.6001 1135.571 0 -0.02359831 -0.9997216\n\
                      815.2679  1134.93 30.6744 -0.01099479 -0.9999396\n\
                      \n\
                      844.6398 1134.911 60.0463 -0.002048373 -0.9999979\n";
        let map = TrackMap::from_csv_str(spaced, 6945.554).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.waypoints()[1].position_m, Vector2::new(815.2679, 1134.93));
        assert_eq!(map.waypoints()[2].s_m, 60.0463);
        assert_eq!(map.waypoints()[0].normal.y, -0.9997216);
        assert_eq!(map.max_s(), 6945.554);

        let commas = "0,0,0,0,-1\n10, 0, 10, 0, -1\n";
        assert_eq!(TrackMap::from_csv_str(commas, 20.0).unwrap().len(), 2);

        assert!(matches!(
            TrackMap::from_csv_str("0 0 0 0\n", 20.0),
            Err(TrackMapError::WrongFieldCount(0, 4))
        ));
        assert!(matches!(
            TrackMap::from_csv_str("0 0 0 0 -1\n1 0 x 0 -1\n", 20.0),
            Err(TrackMapError::InvalidNumber(1, _))
        ));
    }

    #[test]
    fn test_from_csv_file() {
        let path = std::env::temp_dir().join(format!("track_map_{}.csv", std::process::id()));
        std::fs::write(&path, "0 0 0 0 -1\n30 0 30 0 -1\n60 0 60 0 -1\n").unwrap();

        let map = TrackMap::from_csv_file(&path, 90.0);
        std::fs::remove_file(&path).ok();

        assert_eq!(map.unwrap().len(), 3);
        assert!(matches!(
            TrackMap::from_csv_file(std::env::temp_dir().join("no_such_map.csv"), 90.0),
            Err(TrackMapError::IoError(_))
        ));
    }

    #[test]
    fn test_closest_and_next_waypoint() {
        let map = square_map();

        assert_eq!(map.closest_waypoint(&Vector2::new(10.0, 5.0)), 0);
        assert_eq!(map.closest_waypoint(&Vector2::new(95.0, 90.0)), 2);

        // Tie between waypoints 0 and 1, lowest index wins
        assert_eq!(map.closest_waypoint(&Vector2::new(50.0, 0.0)), 0);

        // Waypoint 0 is behind a vehicle heading along +x, so the next one is 1
        assert_eq!(map.next_waypoint(&Vector2::new(10.0, 0.0), 0.0), 1);

        // Driving towards waypoint 1 it is ahead
        assert_eq!(map.next_waypoint(&Vector2::new(90.0, 0.0), 0.0), 1);

        // Wrapping past the last waypoint
        assert_eq!(map.next_waypoint(&Vector2::new(0.0, 90.0), -std::f64::consts::FRAC_PI_2), 0);
        assert_eq!(
            map.next_waypoint(&Vector2::new(0.0, 95.0), -std::f64::consts::FRAC_PI_2),
            0
        );
    }

    #[test]
    fn test_segment_index() {
        let map = square_map();

        assert_eq!(map.segment_index(0.0), 0);
        assert_eq!(map.segment_index(99.9), 0);
        assert_eq!(map.segment_index(100.0), 1);
        assert_eq!(map.segment_index(250.0), 2);
        assert_eq!(map.segment_index(399.0), 3);
        assert_eq!(map.prev_index(0), 3);
        assert_eq!(map.next_index(3), 0);
    }
}
