//! Ego and traffic vehicle states, as seen by the planner.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use comms_if::sim::SensorFusionEntry;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose and track position of the vehicle being planned for.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct EgoState {
    /// Position in the global frame
    pub position_m: Vector2<f64>,

    /// Arc-length along the track, in `[0, max_s)`
    pub s_m: f64,

    /// Lateral offset from the track centreline
    pub d_m: f64,

    /// Heading in the global frame
    pub yaw_rad: f64,

    pub speed_mph: f64,
}

/// Another vehicle reported by sensor fusion.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct TrackedVehicle {
    pub id: u64,

    pub position_m: Vector2<f64>,

    pub velocity_ms: Vector2<f64>,

    pub s_m: f64,

    pub d_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackedVehicle {
    pub fn speed_ms(&self) -> f64 {
        self.velocity_ms.norm()
    }

    /// Arc-length the vehicle will have reached after `duration_s` at its current speed.
    ///
    /// The result is not wrapped onto the track.
    pub fn predict_s(&self, duration_s: f64) -> f64 {
        self.s_m + duration_s * self.speed_ms()
    }
}

impl From<&SensorFusionEntry> for TrackedVehicle {
    fn from(e: &SensorFusionEntry) -> Self {
        Self {
            id: e.id,
            position_m: Vector2::new(e.x, e.y),
            velocity_ms: Vector2::new(e.vx, e.vy),
            s_m: e.s,
            d_m: e.d,
        }
    }
}
