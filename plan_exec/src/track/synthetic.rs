//! Synthetic track generation, for tests and benchmarks which need a track without a map file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::f64::consts::TAU;

// Internal
use super::{TrackMap, TrackMapError, Waypoint};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Generate a circular track centred on the origin, driven anticlockwise.
///
/// The waypoints are evenly spaced around the circle, starting on the +x axis. Their arc-lengths
/// are the cumulative chord lengths and their normals point outwards, which is to the right of
/// the direction of travel.
pub fn circular_track(num_waypoints: usize, radius_m: f64) -> Result<TrackMap, TrackMapError> {
    let step_rad = TAU / num_waypoints as f64;
    let chord_m = 2.0 * radius_m * (step_rad / 2.0).sin();

    let waypoints = (0..num_waypoints)
        .map(|i| {
            let ang_rad = step_rad * i as f64;
            let (sin, cos) = ang_rad.sin_cos();

            Waypoint::new(radius_m * cos, radius_m * sin, chord_m * i as f64, cos, sin)
        })
        .collect();

    TrackMap::new(waypoints, chord_m * num_waypoints as f64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_circular_track() {
        let map = circular_track(8, 100.0).unwrap();

        assert_eq!(map.len(), 8);
        assert!((map.waypoints()[2].position_m.y - 100.0).abs() < 1e-9);
        assert!((map.max_s() - 8.0 * map.waypoints()[1].s_m).abs() < 1e-9);

        // The circumference of the polygon is a little less than that of the circle
        assert!(map.max_s() < TAU * 100.0);

        assert!(matches!(circular_track(1, 100.0), Err(TrackMapError::TooFewWaypoints(1))));
    }
}
