//! # PTZ Control Executable
//!
//! This executable drives a pan/tilt camera rig from an operator console. Each console command
//! runs on its own worker thread against a shared controller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

// Internal
use ptz_if::tc::PtzCmd;
use ptz_lib::{
    console,
    params::PtzExecParams,
    preset_store::FilePresetStore,
    ptz_ctrl::PtzCtrl,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "ptz $ ";

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("ptz_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("PTZ Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: PtzExecParams =
        util::params::load("ptz_exec.toml").wrap_err("Failed to load parameters")?;

    info!("Parameters loaded");

    // ---- CONTROLLER INITIALISATION ----

    let presets = FilePresetStore::new(&params.preset_file);
    match presets.load() {
        Ok(n) => info!("Loaded {} presets from {:?}", n, presets.path()),
        Err(e) => warn!("Starting with no presets: {}", e),
    }

    let ctrl = Arc::new(
        PtzCtrl::new(
            params.ctrl.clone(),
            Box::new(presets),
            params.actuator.build(),
        )
        .wrap_err("Failed to initialise the controller")?,
    );

    info!("Controller initialised at {}", ctrl.get_pose());

    // ---- CONSOLE ----

    let mut history_path = host::get_ptz_sw_root().wrap_err("Failed to get the software root")?;
    history_path.push(&params.history_file);

    let mut rl = DefaultEditor::new().wrap_err("Failed to start the console")?;
    if rl.load_history(&history_path).is_err() {
        info!("No console history found at {:?}", history_path);
    }

    info!("Initialisation complete, entering main loop");

    let mut workers: Vec<JoinHandle<()>> = Vec::new();

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Console read failed"),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line).ok();

        if line == "exit" || line == "quit" {
            break;
        }

        let cmd = match PtzCmd::from_line(line) {
            Ok(c) => c,
            Err(e) => {
                println!("{}", e.message);
                continue;
            }
        };

        // One worker per command
        let ctrl = ctrl.clone();
        workers.push(thread::spawn(move || match console::execute(&ctrl, cmd) {
            Ok(report) => println!("{}", report),
            Err(e) => warn!("Command rejected: {}", e),
        }));

        workers.retain(|w| !w.is_finished());
    }

    // ---- SHUTDOWN ----

    info!("Waiting for {} running commands", workers.len());
    for w in workers {
        if w.join().is_err() {
            warn!("A command worker panicked");
        }
    }

    if let Err(e) = rl.save_history(&history_path) {
        warn!("Could not save console history: {}", e);
    }

    info!("Exiting");

    Ok(())
}
