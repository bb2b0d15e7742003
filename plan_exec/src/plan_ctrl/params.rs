//! Planning cycle controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::{behaviour, traj_gen};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the whole planner, as stored in `plan_exec.toml`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Params {
    pub behaviour: behaviour::Params,

    pub traj_gen: traj_gen::Params,

    pub track: TrackParams,
}

/// Where to find the track map.
#[derive(Deserialize, Debug, Clone)]
pub struct TrackParams {
    /// Path to the waypoint file, relative to the software root
    pub map_file: String,

    /// Track circumference
    pub max_s_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            map_file: String::from("data/highway_map.csv"),
            max_s_m: 6945.554,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_param_file_matches_defaults() {
        let params: Params =
            util::params::from_str(include_str!("../../../params/plan_exec.toml")).unwrap();
        let default = Params::default();

        assert_eq!(params.behaviour.gap_m, default.behaviour.gap_m);
        assert_eq!(params.behaviour.speed_step_mph, default.behaviour.speed_step_mph);
        assert_eq!(params.behaviour.max_speed_mph, default.behaviour.max_speed_mph);
        assert_eq!(params.behaviour.lanes, default.behaviour.lanes);
        assert_eq!(params.behaviour.centre_lane, default.behaviour.centre_lane);
        assert_eq!(params.traj_gen.horizon_len, default.traj_gen.horizon_len);
        assert_eq!(params.traj_gen.mph_per_ms, default.traj_gen.mph_per_ms);
        assert_eq!(params.track.max_s_m, default.track.max_s_m);
        assert_eq!(params.track.map_file, default.track.map_file);
    }
}
