//! Conversion between the global frame and the track-aligned (s, d) frame.
//!
//! `s` is the arc-length along the track centreline, in `[0, max_s)`, and `d` is the lateral
//! offset from the centreline. Positive `d` lies to the right of the direction of travel, which is
//! the side the waypoint normals point to.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

// Internal
use super::TrackMap;
use util::maths::wrap;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position in the track-aligned frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct Frenet {
    /// Arc-length along the centreline
    pub s_m: f64,

    /// Lateral offset from the centreline, positive to the right
    pub d_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackMap {
    /// Convert a global position to track coordinates.
    ///
    /// The point is projected onto the segment ending at the next waypoint ahead of the vehicle.
    /// The projection is signed, so a point slightly behind the start of the segment gets a
    /// slightly smaller `s`. The side is given by the cross product of the segment tangent and the
    /// offset of the point, so it depends only on the local geometry of the track.
    pub fn to_frenet(&self, position_m: &Vector2<f64>, heading_rad: f64) -> Frenet {
        let next = self.next_waypoint(position_m, heading_rad);
        let prev = self.prev_index(next);

        let start_m = self.waypoints[prev].position_m;
        let seg_m = self.waypoints[next].position_m - start_m;
        let offset_m = position_m - start_m;
        let seg_len_m = seg_m.norm();

        let (along_m, d_m) = if seg_len_m > 0.0 {
            (
                offset_m.dot(&seg_m) / seg_len_m,
                (offset_m.x * seg_m.y - offset_m.y * seg_m.x) / seg_len_m,
            )
        } else {
            // Coincident waypoints, fall back on the stored normal for the lateral axis
            (0.0, offset_m.dot(&self.waypoints[prev].normal))
        };

        Frenet {
            s_m: wrap(self.chord_s_m[prev] + along_m, self.max_s_m),
            d_m,
        }
    }

    /// Convert track coordinates to a global position.
    ///
    /// `s_m` may lie outside `[0, max_s)`, it is wrapped onto the track first.
    pub fn to_cartesian(&self, s_m: f64, d_m: f64) -> Vector2<f64> {
        let s_m = wrap(s_m, self.max_s_m);

        let prev = self.segment_index(s_m);
        let heading_rad = self.segment_heading(prev);

        // On the closing segment s has wrapped past zero, so the residual is taken modulo max_s
        let seg_s_m = wrap(s_m - self.waypoints[prev].s_m, self.max_s_m);

        let perp_rad = heading_rad - FRAC_PI_2;

        self.waypoints[prev].position_m
            + Vector2::new(heading_rad.cos(), heading_rad.sin()) * seg_s_m
            + Vector2::new(perp_rad.cos(), perp_rad.sin()) * d_m
    }
}
