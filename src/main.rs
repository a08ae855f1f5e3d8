//! Trash Focus headless driver
//!
//! Runs the app at 60 Hz on a simulated clock: a focus session starts right
//! away, the window wobbles, and an optional focus loss interrupts the session
//! (whose trash then gets a cleanup session). Prints statistics as JSON and
//! saves on exit.

use std::path::PathBuf;

use chrono::{Duration, Local};
use clap::Parser;
use glam::Vec2;

use trash_focus::consts::{MAX_SESSION_MINUTES, SIM_DT};
use trash_focus::persistence::SaveFiles;
use trash_focus::{AppEvent, FocusApp, FrameInput};

/// Focus timer whose interruptions leave trash behind
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Directory holding settings and snapshots
    #[arg(long, value_name = "DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Session length in minutes (default: the selected preset)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_SESSION_MINUTES as i64))]
    minutes: Option<u32>,

    /// Simulated seconds to run (default: session length plus a minute)
    #[arg(long)]
    run_secs: Option<u32>,

    /// Lose window focus this many seconds into the session
    #[arg(long, value_name = "SECS")]
    interrupt_at: Option<u32>,

    /// RNG seed for body placement and shake
    #[arg(long)]
    seed: Option<u64>,

    /// Wipe bodies and achievements before running
    #[arg(long)]
    reset: bool,
}

/// Window drifting in a slow loop, with a jolt every few seconds
fn window_pos(t: f32) -> Vec2 {
    let drift = Vec2::new((t * 0.7).sin() * 30.0, (t * 0.4).cos() * 15.0);
    let jolt = if (t % 7.0) < 0.1 { Vec2::new(25.0, 0.0) } else { Vec2::ZERO };
    Vec2::new(400.0, 300.0) + drift + jolt
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let files = SaveFiles::new(&cli.data_dir);
    let seed = cli
        .seed
        .unwrap_or_else(|| Local::now().timestamp_millis() as u64);

    let mut app = FocusApp::load(&files, seed);
    if cli.reset {
        app.reset_progress();
    }

    let session_secs = cli
        .minutes
        .map(|m| m.saturating_mul(60))
        .unwrap_or_else(|| app.settings().session_secs());
    if let Err(e) = app.start_focus(session_secs) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    log::info!(
        "Focus session of {} started with {} bodies in the arena",
        app.timer().format_remaining(),
        app.store().active_count()
    );

    let run_secs = cli.run_secs.unwrap_or(session_secs.saturating_add(60));
    let interrupt_frame = cli.interrupt_at.map(|s| (s as f32 / SIM_DT).round() as u64);
    let total_frames = (run_secs as f32 / SIM_DT).round() as u64;
    let start = Local::now();

    for frame in 0..total_frames {
        let t = frame as f32 * SIM_DT;
        let now = start + Duration::milliseconds((t * 1000.0) as i64);
        let input = FrameInput {
            elapsed: SIM_DT,
            window_pos: Some(window_pos(t)),
            focused: interrupt_frame != Some(frame),
        };

        for event in app.frame(&input, &now) {
            match event {
                AppEvent::Interrupted { spawned, .. } => {
                    app.acknowledge();
                    if let Some(body) = spawned {
                        if let Err(e) = app.start_cleanup(body) {
                            log::warn!("Could not start cleanup of {body}: {e}");
                        }
                    }
                }
                AppEvent::AchievementUnlocked(id) => println!("Unlocked: {}", id.name()),
                other => log::debug!("{:?}", other),
            }
        }
    }

    match serde_json::to_string_pretty(&app.statistics()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("Could not serialize statistics: {e}"),
    }

    if let Err(e) = app.save(&files) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
