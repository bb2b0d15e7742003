//! Planning cycle controller state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector2;
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::Params;
use crate::{
    behaviour::{BehaviourPlanner, Decision, PlannerSession},
    track::{TrackMap, TrackMapError},
    traj_gen::{Horizon, TrajGen},
    vehicle::{EgoState, TrackedVehicle},
};
use comms_if::sim::{TelemetryMessage, TrajectoryResponse};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    host,
    maths::wrap,
    params,
    session::{self, Session, SessionError},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Archive of the per-cycle reports, relative to the session archive root.
const REPORT_ARCH_DIR: &str = "plan_ctrl";
const REPORT_ARCH_FILE: &str = "plan_ctrl/report.csv";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The planning cycle controller.
pub struct PlanCtrl {
    params: Params,

    map: Arc<TrackMap>,

    behaviour: BehaviourPlanner,

    traj_gen: TrajGen,

    /// Lane and target speed carried between cycles
    session: PlannerSession,

    /// Report of the last cycle
    report: PlanReport,

    arch_report: Archiver,

    num_cycles: u64,
}

/// One cycle's worth of input, in the planner's own units.
#[derive(Debug, Clone, Default)]
pub struct CycleInput {
    /// Ego state as reported, with the yaw in radians and `s` on the track
    pub ego: EgoState,

    /// The part of the previous horizon not yet driven
    pub leftover: Horizon,

    /// Arc-length of the end of the leftover
    pub end_path_s_m: f64,

    pub traffic: Vec<TrackedVehicle>,
}

/// The status report of one planning cycle.
///
/// Archived as one CSV row per cycle, so it is kept flat.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct PlanReport {
    pub cycle: u64,

    /// Seconds since the start of the session
    pub time_s: f64,

    /// Number of leftover points carried into this cycle
    pub prev_size: usize,

    /// Ego arc-length used for planning, i.e. at the end of the leftover
    pub ego_s_m: f64,

    /// Lane after this cycle
    pub lane: usize,

    /// Target speed after this cycle
    pub target_speed_mph: f64,

    pub too_close: bool,
    pub car_left: bool,
    pub car_right: bool,

    /// Number of vehicles on the road
    pub num_tracked: usize,

    pub decision: Decision,

    pub num_new_points: usize,
    pub anchors_dropped: usize,
    pub spline_fallback: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlanCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("The software root environment variable is not set, cannot locate the map")]
    SwRootNotSet,

    #[error("Could not load the track map: {0}")]
    MapLoadError(TrackMapError),

    #[error("Could not create the archive directory: {0}")]
    ArchiveDirError(SessionError),

    #[error("Could not open the report archive: {0}")]
    ArchiveError(ArchiveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlanCtrl {
    /// Initialise the controller from a parameter file.
    ///
    /// The map is loaded from the file named in the parameters, and the per-cycle reports are
    /// archived into the session.
    pub fn init(params_path: &str, session: &Session) -> Result<Self, PlanCtrlError> {
        let params: Params = params::load(params_path).map_err(PlanCtrlError::ParamLoadError)?;

        let map_path = host::get_sw_root()
            .map_err(|_| PlanCtrlError::SwRootNotSet)?
            .join(&params.track.map_file);

        let map = TrackMap::from_csv_file(&map_path, params.track.max_s_m)
            .map_err(PlanCtrlError::MapLoadError)?;

        info!(
            "Loaded {} waypoints from {:?}, track length {} m",
            map.len(),
            map_path,
            map.max_s()
        );

        let mut ctrl = Self::new(params, Arc::new(map));

        session
            .arch_subdir(REPORT_ARCH_DIR)
            .map_err(PlanCtrlError::ArchiveDirError)?;
        ctrl.arch_report =
            Archiver::from_path(session, REPORT_ARCH_FILE).map_err(PlanCtrlError::ArchiveError)?;

        Ok(ctrl)
    }

    /// Create a controller around an already loaded map, without archiving.
    pub fn new(params: Params, map: Arc<TrackMap>) -> Self {
        if (params.behaviour.time_step_s - params.traj_gen.time_step_s).abs() > std::f64::EPSILON {
            warn!(
                "Behaviour time step ({} s) differs from the trajectory time step ({} s), \
                traffic prediction will not match the horizon",
                params.behaviour.time_step_s, params.traj_gen.time_step_s
            );
        }

        let behaviour = BehaviourPlanner::new(params.behaviour.clone(), map.max_s());
        let traj_gen = TrajGen::new(params.traj_gen.clone(), params.behaviour.lanes);
        let session = PlannerSession::new(&params.behaviour);

        Self {
            params,
            map,
            behaviour,
            traj_gen,
            session,
            report: PlanReport::default(),
            arch_report: Archiver::default(),
            num_cycles: 0,
        }
    }

    /// Process one telemetry message, returning the new horizon.
    ///
    /// This never fails, every cycle produces a horizon.
    pub fn proc(&mut self, msg: &TelemetryMessage) -> (TrajectoryResponse, PlanReport) {
        let input = CycleInput::from_telemetry(msg, self.map.max_s());

        let (next_session, horizon, mut report) = plan_cycle(
            &self.map,
            &self.behaviour,
            &self.traj_gen,
            self.session,
            &input,
        );

        self.session = next_session;
        self.num_cycles += 1;

        report.cycle = self.num_cycles;
        report.time_s = session::get_elapsed_seconds();
        self.report = report;

        ((&horizon).into(), report)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn map(&self) -> &TrackMap {
        &self.map
    }

    /// The session as it stands after the last cycle.
    pub fn session(&self) -> PlannerSession {
        self.session
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }
}

impl Archived for PlanCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

impl CycleInput {
    /// Convert a telemetry message into planner units.
    ///
    /// The yaw is converted from degrees, arc-lengths are wrapped onto the track, and previous
    /// path arrays of different lengths are cut to the shorter one.
    pub fn from_telemetry(msg: &TelemetryMessage, max_s_m: f64) -> Self {
        if msg.previous_path_x.len() != msg.previous_path_y.len() {
            warn!(
                "Previous path has {} x values but {} y values, truncating",
                msg.previous_path_x.len(),
                msg.previous_path_y.len()
            );
        }

        Self {
            ego: EgoState {
                position_m: Vector2::new(msg.x, msg.y),
                s_m: wrap(msg.s, max_s_m),
                d_m: msg.d,
                yaw_rad: msg.yaw.to_radians(),
                speed_mph: msg.speed,
            },
            leftover: Horizon::from_xy(&msg.previous_path_x, &msg.previous_path_y),
            end_path_s_m: wrap(msg.end_path_s, max_s_m),
            traffic: msg.sensor_fusion.iter().map(TrackedVehicle::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Run one planning cycle.
///
/// Returns the updated session, the new horizon and the cycle's report. The `cycle` and `time_s`
/// fields of the report are left for the caller to fill.
pub fn plan_cycle(
    map: &TrackMap,
    behaviour: &BehaviourPlanner,
    traj_gen: &TrajGen,
    session: PlannerSession,
    input: &CycleInput,
) -> (PlannerSession, Horizon, PlanReport) {
    let prev_size = input.leftover.len();

    // Plan from where the vehicle will be once it has driven the leftover
    let mut ego = input.ego;
    if prev_size > 0 {
        ego.s_m = input.end_path_s_m;
    }

    let (session, behaviour_report) = behaviour.plan(&ego, prev_size, &input.traffic, session);
    let (horizon, traj_report) = traj_gen.generate(map, &ego, &session, &input.leftover);

    debug!(
        "Cycle: {} leftover + {} new points, lane {}, {:.3} mph",
        prev_size, traj_report.num_new_points, session.lane, session.target_speed_mph
    );

    let report = PlanReport {
        prev_size,
        ego_s_m: ego.s_m,
        lane: session.lane,
        target_speed_mph: session.target_speed_mph,
        too_close: behaviour_report.too_close,
        car_left: behaviour_report.car_left,
        car_right: behaviour_report.car_right,
        num_tracked: behaviour_report.num_tracked,
        decision: behaviour_report.decision,
        num_new_points: traj_report.num_new_points,
        anchors_dropped: traj_report.anchors_dropped,
        spline_fallback: traj_report.spline_fallback,
        ..Default::default()
    };

    (session, horizon, report)
}
