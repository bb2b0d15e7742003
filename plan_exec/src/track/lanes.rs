//! Lane layout across the track.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Equal-width lanes laid side by side, starting at the centreline and extending to the right.
///
/// Lane `k` spans `d` in `[k * width, (k + 1) * width)`, except for the rightmost lane which also
/// includes its outer edge.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct LaneGeometry {
    pub num_lanes: usize,

    pub lane_width_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LaneGeometry {
    fn default() -> Self {
        Self {
            num_lanes: 3,
            lane_width_m: 4.0,
        }
    }
}

impl LaneGeometry {
    /// The lane containing the lateral offset `d_m`, or `None` if it is off the road.
    pub fn lane_of(&self, d_m: f64) -> Option<usize> {
        if !(0.0..=self.road_width_m()).contains(&d_m) {
            return None;
        }

        Some(((d_m / self.lane_width_m) as usize).min(self.num_lanes - 1))
    }

    /// Lateral offset of the centre of `lane`.
    pub fn centre_d(&self, lane: usize) -> f64 {
        self.lane_width_m * lane as f64 + 0.5 * self.lane_width_m
    }

    pub fn road_width_m(&self) -> f64 {
        self.lane_width_m * self.num_lanes as f64
    }

    /// The lane to the right of `lane`, if there is one.
    pub fn right_of(&self, lane: usize) -> Option<usize> {
        if lane + 1 < self.num_lanes {
            Some(lane + 1)
        } else {
            None
        }
    }

    /// The lane to the left of `lane`, if there is one.
    pub fn left_of(&self, lane: usize) -> Option<usize> {
        lane.checked_sub(1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lane_of() {
        let lanes = LaneGeometry::default();

        assert_eq!(lanes.lane_of(2.0), Some(0));
        assert_eq!(lanes.lane_of(6.0), Some(1));
        assert_eq!(lanes.lane_of(10.0), Some(2));

        // Inner boundaries belong to the higher lane, the outer edge to the rightmost lane
        assert_eq!(lanes.lane_of(0.0), Some(0));
        assert_eq!(lanes.lane_of(4.0), Some(1));
        assert_eq!(lanes.lane_of(8.0), Some(2));
        assert_eq!(lanes.lane_of(12.0), Some(2));

        assert_eq!(lanes.lane_of(12.01), None);
        assert_eq!(lanes.lane_of(-0.01), None);
        assert_eq!(lanes.lane_of(std::f64::NAN), None);
    }

    #[test]
    fn test_neighbours() {
        let lanes = LaneGeometry::default();

        assert_eq!(lanes.centre_d(0), 2.0);
        assert_eq!(lanes.centre_d(2), 10.0);
        assert_eq!(lanes.right_of(1), Some(2));
        assert_eq!(lanes.right_of(2), None);
        assert_eq!(lanes.left_of(1), Some(0));
        assert_eq!(lanes.left_of(0), None);
    }
}
