//! # Plan Server
//!
//! Serves horizons to the simulator. Each request is one simulator event frame and each reply is
//! one event frame back, so the socket strictly alternates between receiving and sending.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;

use comms_if::{
    net::{zmq, FrameSocket, NetError, NetParams, SocketOptions},
    sim::{self, SimCodecError, SimEvent, TrajectoryResponse},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Planner server
pub struct PlanServer {
    socket: FrameSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlanServerError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not encode the response: {0}")]
    EncodeError(SimCodecError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlanServer {
    /// Create a new instance of the plan server, bound to the planner endpoint.
    ///
    /// This function will not block until a client connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, PlanServerError> {
        let socket = FrameSocket::new(
            ctx,
            zmq::REP,
            SocketOptions::server(params),
            &params.planner_endpoint,
        )
        .map_err(PlanServerError::SocketError)?;

        Ok(Self { socket })
    }

    /// Receive the next event from the simulator.
    ///
    /// Returns `Ok(None)` if no request arrived within the receive timeout. A frame that cannot
    /// be decoded is treated as a request for manual driving, since the planner has nothing to
    /// plan from and a reply must still be sent.
    pub fn recv_event(&self) -> Result<Option<SimEvent>, PlanServerError> {
        let frame = match self.socket.recv_frame() {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(None),
            Err(NetError::NonUtf8Frame) => {
                warn!("Received a frame which is not valid UTF-8, replying manual");
                return Ok(Some(SimEvent::Manual));
            }
            Err(e) => return Err(PlanServerError::SocketError(e)),
        };

        match sim::decode_frame(&frame) {
            Ok(event) => Ok(Some(event)),
            Err(e) => {
                warn!("Could not decode simulator frame, replying manual: {}", e);
                Ok(Some(SimEvent::Manual))
            }
        }
    }

    /// Reply with a new horizon.
    pub fn send_control(&self, response: &TrajectoryResponse) -> Result<(), PlanServerError> {
        let frame = sim::encode_control(response).map_err(PlanServerError::EncodeError)?;

        self.socket
            .send_frame(&frame)
            .map_err(PlanServerError::SocketError)
    }

    /// Reply that the planner is not driving.
    pub fn send_manual(&self) -> Result<(), PlanServerError> {
        self.socket
            .send_frame(sim::MANUAL_FRAME)
            .map_err(PlanServerError::SocketError)
    }
}
