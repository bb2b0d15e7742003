//! # Trajectory Generator
//!
//! The trajectory generator produces the horizon, the fixed-length sequence of positions the
//! vehicle will occupy at each future time step.
//!
//! The part of the previous horizon the vehicle has not yet driven is kept unchanged at the start
//! of the new one, so the vehicle never sees a jump in its demanded path. New points are appended
//! after it along a smooth curve:
//!
//! 1. Two anchors fix the start of the curve and its direction. These are the last two leftover
//!    points, or, when there is no usable leftover, the vehicle position and a point one metre
//!    behind it along its heading.
//! 2. Far anchors are placed ahead at regular arc-length intervals in the centre of the target
//!    lane.
//! 3. The anchors are moved into a local frame with the reference point at the origin, facing
//!    along +x, and a cubic spline `y(x)` is fitted through them.
//! 4. The spline is sampled at even x increments, chosen so that consecutive points are one time
//!    step apart at the target speed, and the samples are moved back to the global frame.
//!
//! Acceleration is not limited here, the behaviour planner only changes the target speed in small
//! steps.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod spline;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use nalgebra::{Rotation2, Vector2};
use serde::Serialize;

// Internal
use crate::{
    behaviour::PlannerSession,
    track::{LaneGeometry, TrackMap},
    vehicle::EgoState,
};
use comms_if::sim::TrajectoryResponse;
pub use params::Params;
pub use spline::{CubicSpline, SplineError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance travelled per time step below which the vehicle is treated as stationary.
const MIN_STEP_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered sequence of future positions, one time step apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Horizon {
    pub points_m: Vec<Vector2<f64>>,
}

/// The trajectory generator.
#[derive(Debug, Clone)]
pub struct TrajGen {
    params: Params,
    lanes: LaneGeometry,
}

/// Monitoring quantities from one generation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct TrajGenReport {
    /// Number of points appended after the leftover
    pub num_new_points: usize,

    /// Number of anchors removed because they did not lie ahead of the previous anchor
    pub anchors_dropped: usize,

    /// The spline could not be fitted and the new points follow the reference heading instead
    pub spline_fallback: bool,
}

/// The start of the new part of the trajectory.
struct Reference {
    position_m: Vector2<f64>,
    heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Horizon {
    /// Build a horizon from parallel coordinate arrays, truncating to the shorter of the two.
    pub fn from_xy(x: &[f64], y: &[f64]) -> Self {
        Self {
            points_m: x
                .iter()
                .zip(y.iter())
                .map(|(x, y)| Vector2::new(*x, *y))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }

    pub fn last(&self) -> Option<&Vector2<f64>> {
        self.points_m.last()
    }
}

impl From<&Horizon> for TrajectoryResponse {
    fn from(h: &Horizon) -> Self {
        Self {
            next_x: h.points_m.iter().map(|p| p.x).collect(),
            next_y: h.points_m.iter().map(|p| p.y).collect(),
        }
    }
}

impl TrajGen {
    pub fn new(params: Params, lanes: LaneGeometry) -> Self {
        Self { params, lanes }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Generate the horizon for this cycle.
    ///
    /// `ego.s_m` must already be advanced to the end of `leftover`. The returned horizon starts
    /// with `leftover` unchanged and is filled up to the horizon length with new points. A
    /// leftover which is already at least a full horizon long is returned as it is.
    pub fn generate(
        &self,
        map: &TrackMap,
        ego: &EgoState,
        session: &PlannerSession,
        leftover: &Horizon,
    ) -> (Horizon, TrajGenReport) {
        let mut report = TrajGenReport::default();

        let (reference, mut anchors_m) = self.start_anchors(ego, leftover);

        let target_d_m = self.lanes.centre_d(session.lane);
        for k in 1..=self.params.num_far_anchors {
            anchors_m.push(map.to_cartesian(
                ego.s_m + self.params.anchor_spacing_m * k as f64,
                target_d_m,
            ));
        }

        // Move into the local frame, keeping only anchors which progress along +x
        let to_local = Rotation2::new(-reference.heading_rad);
        let mut knots_x: Vec<f64> = Vec::with_capacity(anchors_m.len());
        let mut knots_y: Vec<f64> = Vec::with_capacity(anchors_m.len());

        for anchor in anchors_m.iter() {
            let local = to_local * (anchor - reference.position_m);

            match knots_x.last() {
                Some(&last_x) if local.x <= last_x => report.anchors_dropped += 1,
                _ => {
                    knots_x.push(local.x);
                    knots_y.push(local.y);
                }
            }
        }

        if report.anchors_dropped > 0 {
            debug!("Dropped {} non-monotonic anchors", report.anchors_dropped);
        }

        let spline = match CubicSpline::new(&knots_x, &knots_y) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Could not fit trajectory spline, continuing straight: {}", e);
                report.spline_fallback = true;
                None
            }
        };
        let curve_y = |x: f64| spline.as_ref().map_or(0.0, |s| s.eval(x));

        // Spacing in local x which makes consecutive points one time step apart
        let lookahead_m = self.params.lookahead_m;
        let chord_m = lookahead_m.hypot(curve_y(lookahead_m));
        let step_m =
            self.params.time_step_s * session.target_speed_mph / self.params.mph_per_ms;

        let x_inc_m = if step_m > MIN_STEP_M {
            lookahead_m / (chord_m / step_m).max(1.0)
        } else {
            trace!("Target speed is zero, holding position");
            0.0
        };

        let mut horizon = leftover.clone();
        report.num_new_points = self.params.horizon_len.saturating_sub(leftover.len());

        let to_global = to_local.inverse();
        for i in 1..=report.num_new_points {
            let x_m = x_inc_m * i as f64;
            let local = Vector2::new(x_m, curve_y(x_m));

            horizon.points_m.push(to_global * local + reference.position_m);
        }

        (horizon, report)
    }

    /// The reference point and the two anchors which fix the start of the curve.
    fn start_anchors(&self, ego: &EgoState, leftover: &Horizon) -> (Reference, Vec<Vector2<f64>>) {
        let n = leftover.len();
        let mut anchors_m = Vec::with_capacity(2 + self.params.num_far_anchors);

        let reference = if n < 2 {
            // Synthesise a point behind the vehicle so the curve starts tangent to its heading
            let heading = Vector2::new(ego.yaw_rad.cos(), ego.yaw_rad.sin());

            anchors_m.push(ego.position_m - heading);
            anchors_m.push(ego.position_m);

            Reference {
                position_m: ego.position_m,
                heading_rad: ego.yaw_rad,
            }
        } else {
            let last_m = leftover.points_m[n - 1];
            let prev_m = leftover.points_m[n - 2];
            let diff_m = last_m - prev_m;

            anchors_m.push(prev_m);
            anchors_m.push(last_m);

            // Coincident points (vehicle stopped) carry no heading information
            let heading_rad = if diff_m.norm() > 0.0 {
                diff_m.y.atan2(diff_m.x)
            } else {
                ego.yaw_rad
            };

            Reference {
                position_m: last_m,
                heading_rad,
            }
        };

        (reference, anchors_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::track::synthetic;

    fn map() -> TrackMap {
        synthetic::circular_track(360, 1000.0).unwrap()
    }

    /// Ego in the middle of a lane at `s`, facing along the track.
    fn ego_at(map: &TrackMap, s_m: f64, d_m: f64) -> EgoState {
        let seg = map.segment_index(s_m);
        EgoState {
            position_m: map.to_cartesian(s_m, d_m),
            s_m,
            d_m,
            yaw_rad: map.segment_heading(seg),
            speed_mph: 0.0,
        }
    }

    fn session(lane: usize, target_speed_mph: f64) -> PlannerSession {
        PlannerSession {
            lane,
            target_speed_mph,
        }
    }

    fn traj_gen() -> TrajGen {
        TrajGen::new(Params::default(), LaneGeometry::default())
    }

    #[test]
    fn test_first_cycle() {
        let map = map();
        let ego = ego_at(&map, 100.0, 6.0);

        let (horizon, report) = traj_gen().generate(&map, &ego, &session(1, 0.224), &Horizon::default());

        assert_eq!(horizon.len(), 50);
        assert_eq!(report.num_new_points, 50);
        assert_eq!(report.anchors_dropped, 0);
        assert!(!report.spline_fallback);
        assert!(horizon.points_m.iter().all(|p| p.x.is_finite() && p.y.is_finite()));

        // Slow start, the whole horizon stays within a metre of the vehicle
        let last = horizon.last().unwrap();
        assert!((last - ego.position_m).norm() < 1.0);
    }

    #[test]
    fn test_leftover_kept_unchanged() {
        let map = map();
        let ego = ego_at(&map, 100.0, 6.0);

        let (first, _) = traj_gen().generate(&map, &ego, &session(1, 30.0), &Horizon::default());

        // The vehicle drove 30 points, 20 are left over
        let leftover = Horizon {
            points_m: first.points_m[30..].to_vec(),
        };
        let end = map.to_frenet(&leftover.points_m[19], ego.yaw_rad);
        let next_ego = EgoState {
            s_m: end.s_m,
            ..ego_at(&map, 100.0 + 30.0 * 0.02 * 30.0 / 2.24, 6.0)
        };

        let (horizon, report) = traj_gen().generate(&map, &next_ego, &session(1, 30.224), &leftover);

        assert_eq!(horizon.len(), 50);
        assert_eq!(report.num_new_points, 30);
        assert_eq!(&horizon.points_m[..20], &leftover.points_m[..]);

        // No jump at the join
        let join_m = (horizon.points_m[20] - horizon.points_m[19]).norm();
        assert!(join_m > 0.2 && join_m < 0.35, "join spacing {}", join_m);
    }

    #[test]
    fn test_point_spacing_matches_speed() {
        let map = map();
        let ego = ego_at(&map, 500.0, 6.0);

        let (horizon, _) = traj_gen().generate(&map, &ego, &session(1, 49.5), &Horizon::default());

        let step_m = 0.02 * 49.5 / 2.24;
        for pair in horizon.points_m.windows(2) {
            let spacing_m = (pair[1] - pair[0]).norm();
            assert!((spacing_m - step_m).abs() < 0.01 * step_m, "spacing {}", spacing_m);
        }
    }

    #[test]
    fn test_zero_speed_holds_position() {
        let map = map();
        let ego = ego_at(&map, 100.0, 6.0);

        let (horizon, report) = traj_gen().generate(&map, &ego, &session(1, 0.0), &Horizon::default());

        assert_eq!(horizon.len(), 50);
        assert_eq!(report.num_new_points, 50);
        for p in horizon.points_m.iter() {
            assert!((p - ego.position_m).norm() < 1e-9);
        }
    }

    #[test]
    fn test_lane_change_moves_right() {
        let map = map();
        let ego = ego_at(&map, 200.0, 6.0);

        let (horizon, _) = traj_gen().generate(&map, &ego, &session(2, 49.5), &Horizon::default());

        let d_start = map.to_frenet(&horizon.points_m[0], ego.yaw_rad).d_m;
        let d_end = map.to_frenet(&horizon.points_m[49], ego.yaw_rad).d_m;

        assert!(d_start < 6.5);
        assert!(d_end > d_start + 0.5 && d_end < 10.5, "d from {} to {}", d_start, d_end);
    }

    #[test]
    fn test_across_start_line() {
        let map = map();
        let s_m = map.max_s() - 10.0;
        let ego = ego_at(&map, s_m, 6.0);

        let (horizon, report) = traj_gen().generate(&map, &ego, &session(1, 49.5), &Horizon::default());

        assert_eq!(report.anchors_dropped, 0);
        assert!(!report.spline_fallback);
        for pair in horizon.points_m.windows(2) {
            assert!((pair[1] - pair[0]).norm() < 0.5);
        }

        let end = map.to_frenet(&horizon.points_m[49], ego.yaw_rad);
        assert!(end.s_m < 20.0);
        assert!((end.d_m - 6.0).abs() < 0.2);
    }

    #[test]
    fn test_stationary_leftover() {
        let map = map();
        let ego = ego_at(&map, 100.0, 6.0);

        // Two identical leftover points give no heading, the ego yaw is used instead
        let leftover = Horizon {
            points_m: vec![ego.position_m, ego.position_m],
        };
        let (horizon, report) = traj_gen().generate(&map, &ego, &session(1, 10.0), &leftover);

        assert_eq!(horizon.len(), 50);
        assert_eq!(report.anchors_dropped, 1);
        assert!(!report.spline_fallback);

        let heading = Vector2::new(ego.yaw_rad.cos(), ego.yaw_rad.sin());
        assert!((horizon.points_m[49] - ego.position_m).dot(&heading) > 0.0);
    }

    #[test]
    fn test_full_leftover_kept_whole() {
        let map = map();
        let ego = ego_at(&map, 100.0, 6.0);

        let (first, _) = traj_gen().generate(&map, &ego, &session(1, 20.0), &Horizon::default());
        let (horizon, report) = traj_gen().generate(&map, &ego, &session(1, 20.0), &first);

        assert_eq!(report.num_new_points, 0);
        assert_eq!(horizon, first);
    }
}
