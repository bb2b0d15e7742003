//! # Network Module
//!
//! This module provides networking abstractions over ZMQ. The planner serves the simulator bridge
//! over a REP socket: every request is one inbound frame, every reply is one outbound frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Endpoint the planner serves on, for example `"tcp://*:4567"`
    pub planner_endpoint: String,

    /// Maximum time a receive blocks for before returning no frame
    ///
    /// Units: milliseconds
    pub recv_timeout_ms: i32,

    /// Maximum time a send blocks for before failing
    ///
    /// Units: milliseconds
    pub send_timeout_ms: i32,
}

/// A zmq socket carrying text frames.
pub struct FrameSocket {
    socket: Socket,
}

/// Options set on a [`FrameSocket`].
///
/// These correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
pub struct SocketOptions {
    /// Servers bind to the endpoint, clients connect to it.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_REQ_RELAXED`: relax strict alternation between request and reply
    pub req_relaxed: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not bind or connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not send the frame: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a frame: {0}")]
    RecvError(zmq::Error),

    #[error("Received a frame which is not valid UTF-8")]
    NonUtf8Frame,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameSocket {
    /// Create a new socket and bind or connect it to `endpoint`.
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: SocketOptions,
        endpoint: &str,
    ) -> Result<Self, NetError> {
        let socket = ctx.socket(socket_type).map_err(NetError::CreateSocketError)?;

        socket_options.set(&socket)?;

        match socket_options.bind {
            true => socket.bind(endpoint),
            false => socket.connect(endpoint),
        }
        .map_err(|e| NetError::CouldNotConnect(endpoint.to_string(), e))?;

        Ok(Self { socket })
    }

    /// Receive one text frame.
    ///
    /// `Ok(None)` is returned if the receive timeout elapses before a frame arrives.
    pub fn recv_frame(&self) -> Result<Option<String>, NetError> {
        match self.socket.recv_string(0) {
            Ok(Ok(s)) => Ok(Some(s)),
            Ok(Err(_)) => Err(NetError::NonUtf8Frame),
            Err(zmq::Error::EAGAIN) => Ok(None),
            Err(e) => Err(NetError::RecvError(e)),
        }
    }

    /// Send one text frame.
    pub fn send_frame(&self, frame: &str) -> Result<(), NetError> {
        self.socket.send(frame, 0).map_err(NetError::SendError)
    }
}

impl std::ops::Deref for FrameSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_linger, self.linger),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        if let Ok(SocketType::REQ) = socket.get_socket_type() {
            set_sockopts!(socket, (set_req_relaxed, self.req_relaxed));
        }

        Ok(())
    }

    /// Options for a server socket built from the network parameters.
    pub fn server(params: &NetParams) -> Self {
        Self {
            bind: true,
            linger: 1,
            recv_timeout: params.recv_timeout_ms,
            send_timeout: params.send_timeout_ms,
            ..Default::default()
        }
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            linger: 30_000,
            recv_timeout: -1,
            send_timeout: -1,
            req_relaxed: false,
        }
    }
}
