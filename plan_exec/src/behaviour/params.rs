//! Behaviour planner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::track::LaneGeometry;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the behaviour planner
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Longitudinal distance within which another vehicle blocks a lane
    pub gap_m: f64,

    /// Change in target speed allowed per cycle
    ///
    /// Units: miles per hour
    pub speed_step_mph: f64,

    /// Maximum target speed
    ///
    /// Units: miles per hour
    pub max_speed_mph: f64,

    /// Layout of the lanes across the track
    #[serde(flatten)]
    pub lanes: LaneGeometry,

    /// The lane the vehicle prefers to drive in, and starts the run in
    pub centre_lane: usize,

    /// Time between consecutive horizon points, used to predict where traffic will be when the
    /// vehicle reaches the end of its leftover horizon
    pub time_step_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            gap_m: 30.0,
            speed_step_mph: 0.224,
            max_speed_mph: 49.5,
            lanes: LaneGeometry::default(),
            centre_lane: 1,
            time_step_s: 0.02,
        }
    }
}
