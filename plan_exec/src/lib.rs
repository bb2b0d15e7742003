//! # Track planner library.
//!
//! This library allows the executable, benchmarks and other crates in the workspace to access the
//! planning core.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Behaviour planner - picks the lane and target speed from the surrounding traffic
pub mod behaviour;

/// Planning cycle controller - runs the behaviour planner and trajectory generator once per cycle
pub mod plan_ctrl;

/// Plan server - receives telemetry from and sends horizons to the simulator
pub mod plan_server;

/// Track map - the waypoint table and conversions to and from track coordinates
pub mod track;

/// Trajectory generator - produces the smooth horizon the vehicle follows
pub mod traj_gen;

/// Ego and traffic vehicle states
pub mod vehicle;
