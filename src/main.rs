// Entry point: headless sandbox demo driving the audio engine.
//
// Spawns a starting orb trio and scripts pseudo-random collisions between
// them at the 60 Hz simulation rate, so the full path (collision routing,
// effect ramps, FM voices, master limiter, device/wav output) runs end to
// end until ctrl-C or --duration-sec elapses.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::bounded;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use orbfield::audio::writer::WavOutput;
use orbfield::audio::AudioEngine;
use orbfield::config::AppConfig;
use orbfield::orb::{OrbKind, Session};

const TICK_HZ: f32 = 60.0;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Play audio in realtime
    #[arg(long, default_value_t = true, num_args = 0..=1, default_missing_value = "true")]
    play: bool,

    /// Write audio to wav file
    #[arg(long)]
    wav: Option<String>,

    /// Path to config TOML
    #[arg(long, default_value = "orbfield.toml")]
    config: String,

    /// Key for the session, e.g. "Eb minor"
    #[arg(long, default_value = "C major")]
    key: String,

    /// Seed for the collision script
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Stop after this many seconds (0 = run until ctrl-C)
    #[arg(long, default_value_t = 0.0)]
    duration_sec: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cfg = AppConfig::load_or_default(&args.config);

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_ctrlc = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_for_ctrlc.store(true, Ordering::SeqCst);
    })?;

    let (wav_tx, wav_rx) = bounded(256);
    let wav_tx = args.wav.is_some().then_some(wav_tx);

    let mut engine = AudioEngine::start(&cfg, args.play, wav_tx)?;
    let wav_handle = args
        .wav
        .clone()
        .map(|path| WavOutput::run(wav_rx, path, engine.sample_rate()));

    let mut session = Session::new(engine.commands(), cfg.collision.clone());
    session.set_master_volume(0.8);
    if let Some((root, tonality)) = args.key.split_once(' ') {
        session.set_scale_str(root, tonality);
    }

    // Starting trio, one of each kind at spread-out sizes.
    session.spawn_orb(OrbKind::Blue, 320.0);
    session.spawn_orb(OrbKind::Purple, 220.0);
    session.spawn_orb(OrbKind::Red, 130.0);

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let tick = Duration::from_secs_f32(1.0 / TICK_HZ);
    let started = Instant::now();
    let mut next_deadline = Instant::now();

    info!(seed = args.seed, "demo session running");
    while !stop_flag.load(Ordering::SeqCst) {
        if args.duration_sec > 0.0 && started.elapsed().as_secs_f32() >= args.duration_sec {
            break;
        }

        // Occasionally churn the population to exercise voice lifecycle.
        if rng.random_bool(0.002) && session.active_orb_count() > 1 {
            let ids = session.orb_ids();
            let victim = ids[rng.random_range(0..ids.len())];
            session.remove_orb(victim);
        }
        if rng.random_bool(0.003) && session.active_orb_count() < 8 {
            let kind = OrbKind::ALL[rng.random_range(0..OrbKind::ALL.len())];
            let size = rng.random_range(90.0..390.0);
            session.spawn_orb(kind, size);
        }

        // A sparse stream of impulses, as two bodies knocking about would
        // produce. Most are audible hits, some fall under the threshold.
        if rng.random_bool(0.06) && session.active_orb_count() >= 2 {
            let ids = session.orb_ids();
            let i = rng.random_range(0..ids.len());
            let mut j = rng.random_range(0..ids.len());
            if j == i {
                j = (j + 1) % ids.len();
            }
            let impulse = rng.random_range(100_000.0..5_000_000.0);
            session.on_collision(impulse, ids[i], ids[j]);
        }

        session.tick();

        next_deadline += tick;
        let now = Instant::now();
        if now < next_deadline {
            std::thread::sleep(next_deadline - now);
        } else {
            next_deadline = now;
        }
    }

    info!("shutting down");
    engine.stop();
    if let Some(handle) = wav_handle {
        let _ = handle.join();
    }
    Ok(())
}
