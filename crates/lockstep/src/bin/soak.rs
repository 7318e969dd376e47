//! Headless soak run of the reference world.
//!
//! Boots the wave, runs the threaded frame loop until the world drains
//! itself (or a watchdog fires), and reports the totals. Usage:
//!
//! ```text
//! soak [config.toml]
//! ```
//!
//! Log verbosity follows `RUST_LOG`.

use std::path::Path;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lockstep::backends::{NullPhysics, NullRenderer};
use lockstep::{KernelConfig, World, WorldFrame};

/// Upper bound on the run; the world normally quits itself well before.
const WATCHDOG_SECS: u64 = 30;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match KernelConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => KernelConfig::default(),
    };

    let renderer = NullRenderer::default();
    let tap = renderer.tap();
    let mut world = World::new(&config, Box::new(NullPhysics::default()));
    let frame = WorldFrame::new(Box::new(renderer));

    let (quit_tx, quit_rx) = bounded(1);
    world.quit_on_halt(quit_tx.clone());
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(WATCHDOG_SECS));
        let _ = quit_tx.send(());
    });

    let (world, _frame) = world.run(frame, &quit_rx);
    let stats = world.stats();
    info!(
        frames = stats.frames,
        destroyed = stats.destroyed,
        expired = stats.expired,
        rendered = tap.frames(),
        submits = tap.total_submits(),
        "soak finished"
    );

    if world.is_halted() {
        ExitCode::SUCCESS
    } else {
        error!("watchdog fired before the world drained");
        ExitCode::FAILURE
    }
}
