//! # Communications interface crate.
//!
//! Provides the interfaces between the planner and the driving simulator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulator message definitions and event framing
pub mod sim;

/// Network module
pub mod net;
