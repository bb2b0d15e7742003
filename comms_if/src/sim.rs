//! # Simulator Interface
//!
//! Messages exchanged with the driving simulator and the event framing they travel in.
//!
//! Every frame is a socket.io style event: the characters `42` (`4` for a message, `2` for an
//! event) followed by a JSON array of `[event_name, data]`. The simulator sends `telemetry`
//! events, and expects either a `control` event carrying the new horizon or a `manual` event
//! when no plan could be produced.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix which marks a frame as an event message.
pub const EVENT_PREFIX: &str = "42";

/// Name of the inbound telemetry event.
pub const TELEMETRY_EVENT: &str = "telemetry";

/// Name of the outbound control event.
pub const CONTROL_EVENT: &str = "control";

/// The frame sent back when the planner does not take control of the vehicle.
pub const MANUAL_FRAME: &str = "42[\"manual\",{}]";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry sent by the simulator once per update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    /// Ego position in the global frame
    pub x: f64,
    pub y: f64,

    /// Ego arc-length along the track
    pub s: f64,

    /// Ego lateral offset from the track centreline
    pub d: f64,

    /// Ego heading
    ///
    /// Units: degrees
    pub yaw: f64,

    /// Ego speed
    ///
    /// Units: miles per hour
    pub speed: f64,

    /// The part of the last horizon the vehicle has not driven yet, x coordinates.
    #[serde(default)]
    pub previous_path_x: Vec<f64>,

    /// The part of the last horizon the vehicle has not driven yet, y coordinates.
    #[serde(default)]
    pub previous_path_y: Vec<f64>,

    /// Arc-length of the last point of the previous path
    #[serde(default)]
    pub end_path_s: f64,

    /// Lateral offset of the last point of the previous path
    #[serde(default)]
    pub end_path_d: f64,

    /// All other vehicles on the same side of the road.
    #[serde(default)]
    pub sensor_fusion: Vec<SensorFusionEntry>,
}

/// One vehicle reported by sensor fusion.
///
/// On the wire this is the array `[id, x, y, vx, vy, s, d]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SensorFusionRow", into = "SensorFusionRow")]
pub struct SensorFusionEntry {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub s: f64,
    pub d: f64,
}

/// Wire layout of a [`SensorFusionEntry`]. The simulator is loose about integer ids, so the id is
/// read as a float.
type SensorFusionRow = (f64, f64, f64, f64, f64, f64, f64);

/// The horizon sent back to the simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResponse {
    pub next_x: Vec<f64>,
    pub next_y: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Telemetry to plan from
    Telemetry(TelemetryMessage),

    /// The simulator has no data for us, the vehicle is under manual control
    Manual,
}

#[derive(Debug, thiserror::Error)]
pub enum SimCodecError {
    #[error("Frame does not start with the event prefix \"42\"")]
    NotAnEvent,

    #[error("Frame contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Expected the frame body to be an [event, data] array")]
    BadEventShape,

    #[error("Unknown event \"{0}\"")]
    UnknownEvent(String),

    #[error("Could not deserialize the telemetry: {0}")]
    TelemetryError(serde_json::Error),

    #[error("Could not serialize the response: {0}")]
    SerializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<SensorFusionRow> for SensorFusionEntry {
    fn from(r: SensorFusionRow) -> Self {
        Self {
            id: r.0 as u64,
            x: r.1,
            y: r.2,
            vx: r.3,
            vy: r.4,
            s: r.5,
            d: r.6,
        }
    }
}

impl From<SensorFusionEntry> for SensorFusionRow {
    fn from(e: SensorFusionEntry) -> Self {
        (e.id as f64, e.x, e.y, e.vx, e.vy, e.s, e.d)
    }
}

impl TrajectoryResponse {
    /// Number of points in the response.
    pub fn len(&self) -> usize {
        self.next_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_x.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode one inbound frame.
pub fn decode_frame(frame: &str) -> Result<SimEvent, SimCodecError> {
    let body = frame
        .trim()
        .strip_prefix(EVENT_PREFIX)
        .ok_or(SimCodecError::NotAnEvent)?;

    let mut val: Value = serde_json::from_str(body).map_err(SimCodecError::InvalidJson)?;

    let event = val
        .get(0)
        .and_then(Value::as_str)
        .ok_or(SimCodecError::BadEventShape)?
        .to_string();

    // Missing or null data is how the simulator signals manual driving
    let data = match val.get_mut(1) {
        Some(v) if !v.is_null() => v.take(),
        _ => return Ok(SimEvent::Manual),
    };

    match event.as_str() {
        TELEMETRY_EVENT => Ok(SimEvent::Telemetry(
            serde_json::from_value(data).map_err(SimCodecError::TelemetryError)?,
        )),
        _ => Err(SimCodecError::UnknownEvent(event)),
    }
}

/// Encode a control frame carrying the given horizon.
pub fn encode_control(response: &TrajectoryResponse) -> Result<String, SimCodecError> {
    let body =
        serde_json::to_string(&(CONTROL_EVENT, response)).map_err(SimCodecError::SerializeError)?;

    Ok(format!("{}{}", EVENT_PREFIX, body))
}
