//! # Planning Cycle Controller
//!
//! Runs one planning cycle per telemetry message: advance the ego arc-length to the end of the
//! leftover horizon, let the behaviour planner update the lane and target speed, then let the
//! trajectory generator fill the horizon back up.
//!
//! [`plan_cycle`] is the cycle itself, a pure function of its inputs and the session. [`PlanCtrl`]
//! wraps it with the map, the session carried between cycles, and the report archive.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;
