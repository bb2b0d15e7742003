//! Trajectory generator parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the trajectory generator
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Number of points in every emitted horizon
    pub horizon_len: usize,

    /// Time between consecutive horizon points
    pub time_step_s: f64,

    /// Local x distance over which the point spacing is calculated
    pub lookahead_m: f64,

    /// Arc-length between the far anchors
    pub anchor_spacing_m: f64,

    /// Number of far anchors placed ahead along the target lane
    pub num_far_anchors: usize,

    /// Divisor converting a target speed in miles per hour to metres per second
    pub mph_per_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            horizon_len: 50,
            time_step_s: 0.02,
            lookahead_m: 30.0,
            anchor_spacing_m: 30.0,
            num_far_anchors: 3,
            mph_per_ms: 2.24,
        }
    }
}
