//! # Behaviour Planner
//!
//! The behaviour planner picks the lane to drive in and the speed to drive at. Once per cycle it
//! looks at the traffic reported by sensor fusion and applies a fixed priority policy:
//!
//! 1. If a vehicle ahead in our lane is within the gap, change into the right lane if it is clear,
//!    otherwise into the left lane if it is clear, otherwise slow down.
//! 2. Otherwise head back towards the centre lane if the way is clear, and speed up towards the
//!    maximum speed.
//!
//! Traffic positions are predicted forward to the time the vehicle reaches the end of its leftover
//! horizon, since that is where the new part of the trajectory starts. The only state carried
//! between cycles is the [`PlannerSession`], which is passed in and handed back explicitly.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use crate::vehicle::{EgoState, TrackedVehicle};
pub use params::Params;
use util::maths::{clamp, wrapped_diff};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State carried from one planning cycle to the next.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PlannerSession {
    /// The lane the vehicle is driving in, or changing into
    pub lane: usize,

    /// Speed the trajectory is generated for
    ///
    /// Units: miles per hour
    pub target_speed_mph: f64,
}

/// The behaviour planner.
#[derive(Debug, Clone)]
pub struct BehaviourPlanner {
    params: Params,

    /// Track length, used to measure gaps across the start line
    max_s_m: f64,
}

/// What the planner saw and did in one cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct BehaviourReport {
    /// A vehicle ahead in our lane is within the gap
    pub too_close: bool,

    /// A vehicle in the lane to the left is within the gap, ahead or behind
    pub car_left: bool,

    /// A vehicle in the lane to the right is within the gap, ahead or behind
    pub car_right: bool,

    /// Number of vehicles on the road
    pub num_tracked: usize,

    pub decision: Decision,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The action taken by the behaviour planner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Decision {
    KeepLane,
    ChangeRight,
    ChangeLeft,
    SlowDown,
    ReturnToCentre,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Decision {
    fn default() -> Self {
        Decision::KeepLane
    }
}

impl PlannerSession {
    /// The session at the start of a run: in the centre lane and stationary.
    pub fn new(params: &Params) -> Self {
        Self {
            lane: params.centre_lane,
            target_speed_mph: 0.0,
        }
    }
}

impl BehaviourPlanner {
    pub fn new(params: Params, max_s_m: f64) -> Self {
        Self { params, max_s_m }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Plan the lane and target speed for this cycle.
    ///
    /// `ego.s_m` must already be advanced to the end of the leftover horizon, which is
    /// `prev_size` points long.
    pub fn plan(
        &self,
        ego: &EgoState,
        prev_size: usize,
        traffic: &[TrackedVehicle],
        session: PlannerSession,
    ) -> (PlannerSession, BehaviourReport) {
        let mut report = self.assess_traffic(ego, prev_size, traffic, session.lane);
        let mut next = session;

        let lanes = &self.params.lanes;

        if report.too_close {
            match (lanes.right_of(session.lane), lanes.left_of(session.lane)) {
                (Some(right), _) if !report.car_right => {
                    next.lane = right;
                    report.decision = Decision::ChangeRight;
                }
                (_, Some(left)) if !report.car_left => {
                    next.lane = left;
                    report.decision = Decision::ChangeLeft;
                }
                _ => {
                    next.target_speed_mph = clamp(
                        session.target_speed_mph - self.params.speed_step_mph,
                        0.0,
                        self.params.max_speed_mph,
                    );
                    report.decision = Decision::SlowDown;
                }
            }
        } else {
            // Step one lane back towards the centre, if that side is clear
            let towards_centre = if session.lane < self.params.centre_lane {
                lanes.right_of(session.lane).filter(|_| !report.car_right)
            } else if session.lane > self.params.centre_lane {
                lanes.left_of(session.lane).filter(|_| !report.car_left)
            } else {
                None
            };

            if let Some(lane) = towards_centre {
                next.lane = lane;
                report.decision = Decision::ReturnToCentre;
            }

            if session.target_speed_mph < self.params.max_speed_mph {
                next.target_speed_mph = clamp(
                    session.target_speed_mph + self.params.speed_step_mph,
                    0.0,
                    self.params.max_speed_mph,
                );
            }
        }

        if next.lane != session.lane {
            debug!(
                "{:?}: lane {} -> {} at s = {:.1} m",
                report.decision, session.lane, next.lane, ego.s_m
            );
        }
        trace!(
            "Target speed {:.3} -> {:.3} mph (too close: {}, left: {}, right: {})",
            session.target_speed_mph,
            next.target_speed_mph,
            report.too_close,
            report.car_left,
            report.car_right
        );

        (next, report)
    }

    /// Classify the traffic and set the occupancy flags of the report.
    fn assess_traffic(
        &self,
        ego: &EgoState,
        prev_size: usize,
        traffic: &[TrackedVehicle],
        lane: usize,
    ) -> BehaviourReport {
        let mut report = BehaviourReport::default();

        let horizon_s = prev_size as f64 * self.params.time_step_s;
        let gap_m = self.params.gap_m;

        for vehicle in traffic {
            let vehicle_lane = match self.params.lanes.lane_of(vehicle.d_m) {
                Some(l) => l,
                None => continue,
            };
            report.num_tracked += 1;

            // Positive when the vehicle will be ahead of us, including across the start line
            let gap_ahead_m =
                wrapped_diff(vehicle.predict_s(horizon_s), ego.s_m, self.max_s_m);

            if vehicle_lane == lane {
                report.too_close |= gap_ahead_m > 0.0 && gap_ahead_m < gap_m;
            } else if vehicle_lane == lane + 1 {
                report.car_right |= gap_ahead_m.abs() < gap_m;
            } else if vehicle_lane + 1 == lane {
                report.car_left |= gap_ahead_m.abs() < gap_m;
            }
        }

        report
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector2;

    const MAX_S: f64 = 6945.554;

    fn ego(s_m: f64, d_m: f64) -> EgoState {
        EgoState {
            s_m,
            d_m,
            ..Default::default()
        }
    }

    fn vehicle(id: u64, s_m: f64, d_m: f64, speed_ms: f64) -> TrackedVehicle {
        TrackedVehicle {
            id,
            velocity_ms: Vector2::new(speed_ms, 0.0),
            s_m,
            d_m,
            ..Default::default()
        }
    }

    fn session(lane: usize, target_speed_mph: f64) -> PlannerSession {
        PlannerSession {
            lane,
            target_speed_mph,
        }
    }

    fn planner() -> BehaviourPlanner {
        BehaviourPlanner::new(Params::default(), MAX_S)
    }

    #[test]
    fn test_too_close_blocked_slows_down() {
        let traffic = [
            vehicle(0, 110.0, 6.0, 0.0),
            vehicle(1, 100.0, 2.0, 0.0),
            vehicle(2, 95.0, 10.0, 0.0),
        ];

        let (next, report) = planner().plan(&ego(100.0, 6.0), 0, &traffic, session(1, 20.0));

        assert!(report.too_close && report.car_left && report.car_right);
        assert_eq!(report.decision, Decision::SlowDown);
        assert_eq!(report.num_tracked, 3);
        assert_eq!(next.lane, 1);
        assert!((next.target_speed_mph - (20.0 - 0.224)).abs() < 1e-12);
    }

    #[test]
    fn test_too_close_clear_right_changes_right() {
        let traffic = [vehicle(0, 110.0, 6.0, 0.0), vehicle(1, 100.0, 2.0, 0.0)];

        let (next, report) = planner().plan(&ego(100.0, 6.0), 0, &traffic, session(1, 20.0));

        assert_eq!(report.decision, Decision::ChangeRight);
        assert_eq!(next.lane, 2);
        assert_eq!(next.target_speed_mph, 20.0);
    }

    #[test]
    fn test_too_close_in_rightmost_lane_changes_left() {
        let traffic = [vehicle(0, 110.0, 10.0, 0.0)];

        let (next, report) = planner().plan(&ego(100.0, 10.0), 0, &traffic, session(2, 20.0));

        assert_eq!(report.decision, Decision::ChangeLeft);
        assert_eq!(next.lane, 1);
        assert_eq!(next.target_speed_mph, 20.0);
    }

    #[test]
    fn test_speed_floor_and_cap() {
        let blocked = [
            vehicle(0, 110.0, 6.0, 0.0),
            vehicle(1, 100.0, 2.0, 0.0),
            vehicle(2, 100.0, 10.0, 0.0),
        ];
        let (next, _) = planner().plan(&ego(100.0, 6.0), 0, &blocked, session(1, 0.1));
        assert_eq!(next.target_speed_mph, 0.0);

        let (next, report) = planner().plan(&ego(100.0, 6.0), 0, &[], session(1, 49.4));
        assert_eq!(report.decision, Decision::KeepLane);
        assert_eq!(next.target_speed_mph, 49.5);

        let (next, _) = planner().plan(&ego(100.0, 6.0), 0, &[], session(1, 49.5));
        assert_eq!(next.target_speed_mph, 49.5);
    }

    #[test]
    fn test_return_to_centre() {
        // Free road, drift back to the centre from either side
        let (next, report) = planner().plan(&ego(100.0, 2.0), 0, &[], session(0, 30.0));
        assert_eq!(report.decision, Decision::ReturnToCentre);
        assert_eq!(next.lane, 1);
        assert!((next.target_speed_mph - 30.224).abs() < 1e-12);

        let (next, _) = planner().plan(&ego(100.0, 10.0), 0, &[], session(2, 30.0));
        assert_eq!(next.lane, 1);

        // Centre lane occupied alongside, stay put but still speed up
        let traffic = [vehicle(0, 90.0, 6.0, 0.0)];
        let (next, report) = planner().plan(&ego(100.0, 10.0), 0, &traffic, session(2, 30.0));
        assert!(report.car_left);
        assert_eq!(report.decision, Decision::KeepLane);
        assert_eq!(next.lane, 2);
        assert!((next.target_speed_mph - 30.224).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_uses_leftover_horizon() {
        // 20 m/s, 10 m behind now, 6 m ahead after 40 points of 0.02 s
        let traffic = [vehicle(0, 90.0, 6.0, 20.0)];

        let (_, report) = planner().plan(&ego(100.0, 6.0), 0, &traffic, session(1, 20.0));
        assert!(!report.too_close);

        let (_, report) = planner().plan(&ego(100.0, 6.0), 40, &traffic, session(1, 20.0));
        assert!(report.too_close);
    }

    #[test]
    fn test_gap_across_start_line() {
        let traffic = [vehicle(0, 5.0, 6.0, 0.0), vehicle(1, MAX_S - 5.0, 2.0, 0.0)];

        let (_, report) =
            planner().plan(&ego(MAX_S - 10.0, 6.0), 0, &traffic, session(1, 20.0));
        assert!(report.too_close);
        assert!(report.car_left);

        // Vehicles just behind the ego across the line are not ahead
        let (_, report) = planner().plan(&ego(10.0, 6.0), 0, &traffic, session(1, 20.0));
        assert!(!report.too_close);
        assert!(report.car_left);
    }

    #[test]
    fn test_off_road_traffic_ignored() {
        let traffic = [
            vehicle(0, 110.0, -285.8, 0.0),
            vehicle(1, 110.0, 12.5, 0.0),
            vehicle(2, 110.0, 12.0, 0.0),
        ];

        let (_, report) = planner().plan(&ego(100.0, 10.0), 0, &traffic, session(2, 20.0));

        assert_eq!(report.num_tracked, 1);
        assert!(report.too_close);
    }

    #[test]
    fn test_initial_session() {
        let s = PlannerSession::new(&Params::default());
        assert_eq!(s.lane, 1);
        assert_eq!(s.target_speed_mph, 0.0);
    }
}
