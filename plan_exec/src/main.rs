//! Main planner executable entry point.
//!
//! # Architecture
//!
//! The executable serves the driving simulator, which drives the request/reply cycle:
//!
//!     - Initialise the session, logging, parameters and track map
//!     - Main loop:
//!         - Wait for a simulator event
//!         - Telemetry: run one planning cycle and reply with the new horizon
//!         - Anything else: reply that the planner is not driving
//!         - Archive the cycle report

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, trace, warn};
use std::time::Instant;

// Internal
use comms_if::{net::NetParams, sim::SimEvent};
use plan_lib::{plan_ctrl::PlanCtrl, plan_server::PlanServer};
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::std_duration_to_millis,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("plan_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Track Planner Executable\n");
    info!("Running on: {}", host::get_platform());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut plan_ctrl =
        PlanCtrl::init("plan_exec.toml", &session).wrap_err("Failed to initialise PlanCtrl")?;
    info!("PlanCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let plan_server = {
        let s = PlanServer::new(&zmq_ctx, &net_params)
            .wrap_err("Failed to initialise PlanServer")?;
        info!("PlanServer listening on {}", net_params.planner_endpoint);
        s
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        let event = match plan_server.recv_event() {
            Ok(Some(e)) => e,
            Ok(None) => continue,
            Err(e) => {
                return Err(e).wrap_err("An error occured while receiving from the simulator")
            }
        };

        match event {
            SimEvent::Telemetry(msg) => {
                let cycle_start_instant = Instant::now();

                let (response, report) = plan_ctrl.proc(&msg);

                trace!(
                    "Cycle {} took {:.3} ms: {:?}",
                    report.cycle,
                    std_duration_to_millis(cycle_start_instant.elapsed()),
                    report
                );

                if let Err(e) = plan_server.send_control(&response) {
                    warn!("Could not send the horizon: {}", e);
                }

                if let Err(e) = plan_ctrl.write() {
                    warn!("Could not archive the cycle report: {}", e);
                }
            }
            SimEvent::Manual => {
                if let Err(e) = plan_server.send_manual() {
                    warn!("Could not send the manual reply: {}", e);
                }
            }
        }
    }
}
