//! Atomic Reactor Simulation - Main Entry Point
//!
//! Demo runner for the reactor cycle. Loads tunables from
//! `config/reactor.json` when present and initial conditions from an
//! optional scenario file given as the first argument, then runs the cycle
//! to termination. Ctrl-C cancels cooperatively at the next iteration
//! boundary; the final state is printed as JSON either way.

use std::env;
use std::process::ExitCode;

use log::{error, info, warn};

use atomic_reactor_lib::{CancelToken, ReactorConfig, ReactorCycle, ReactorError, ReactorState};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ReactorError> {
    let config = ReactorConfig::load_or_default()?;
    let mut state = match env::args().nth(1) {
        Some(path) => ReactorState::from_file(path)?,
        None => ReactorState::default(),
    };

    // Ctrl-C requests cooperative cancellation; the cycle finishes its
    // current iteration and stops at the next boundary.
    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("cancellation requested");
            signal_token.cancel();
        }
    });

    let mut cycle = ReactorCycle::new(config);
    cycle.on_high_temperature(|temperature| {
        warn!("high temperature alarm: {temperature}");
    });

    info!(
        "starting reactor cycle: temperature {}, fuel {}, mode {:?}",
        state.temperature, state.fuel, state.work_mode
    );
    let cause = cycle.run(&mut state, &cancel).await;
    info!("terminal cause: {cause:?}");

    match serde_json::to_string_pretty(&state) {
        Ok(snapshot) => println!("{snapshot}"),
        Err(err) => warn!("could not serialize final state: {err}"),
    }

    Ok(())
}
