//! Audio engine lifecycle.
//!
//! `start()` opens the output device (hard failure if that is impossible)
//! and spawns the render worker that owns the [`Mixer`]. The worker drains
//! the command channel between hop renders; `stop()` tears everything down
//! and is safe to call after a partial start or more than once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use ringbuf::HeapProd;
use tracing::{debug, info};

use crate::audio::limiter::LimiterMeter;
use crate::audio::mixer::{EngineCommand, Mixer};
use crate::audio::output::AudioOutput;
use crate::config::AppConfig;

/// Samples per render hop (~5 ms at 48 kHz).
const HOP: usize = 256;

/// Command backlog between simulation and render threads.
const COMMAND_DEPTH: usize = 1024;

#[derive(Debug)]
pub enum EngineError {
    NoOutputDevice,
    DeviceConfig(cpal::DefaultStreamConfigError),
    BuildStream(cpal::BuildStreamError),
    PlayStream(cpal::PlayStreamError),
    WorkerSpawn(std::io::Error),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NoOutputDevice => write!(f, "no default audio output device"),
            EngineError::DeviceConfig(err) => write!(f, "querying device config: {err}"),
            EngineError::BuildStream(err) => write!(f, "building output stream: {err}"),
            EngineError::PlayStream(err) => write!(f, "starting output stream: {err}"),
            EngineError::WorkerSpawn(err) => write!(f, "spawning render worker: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::NoOutputDevice => None,
            EngineError::DeviceConfig(err) => Some(err),
            EngineError::BuildStream(err) => Some(err),
            EngineError::PlayStream(err) => Some(err),
            EngineError::WorkerSpawn(err) => Some(err),
        }
    }
}

pub struct AudioEngine {
    cmd_tx: Sender<EngineCommand>,
    stop_flag: Arc<AtomicBool>,
    output: Option<AudioOutput>,
    worker: Option<thread::JoinHandle<()>>,
    sample_rate: u32,
}

impl AudioEngine {
    /// Start the engine. With `play` false the worker renders into the wav
    /// channel only, paced by wall clock (no device is opened).
    pub fn start(
        cfg: &AppConfig,
        play: bool,
        wav_tx: Option<Sender<Arc<[f32]>>>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = bounded::<EngineCommand>(COMMAND_DEPTH);

        let (output, producer, sample_rate) = if play {
            let (out, prod) = AudioOutput::new(cfg.audio.latency_ms)?;
            let sample_rate = out.sample_rate();
            (Some(out), Some(prod), sample_rate)
        } else {
            (None, None, cfg.audio.sample_rate)
        };

        let meter = Arc::new(LimiterMeter::default());
        let mixer = Mixer::new(
            sample_rate,
            cfg.audio.output_guard.into(),
            Some(meter.clone()),
        );

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_for_worker = stop_flag.clone();
        let worker = thread::Builder::new()
            .name("render".into())
            .spawn(move || {
                render_loop(
                    mixer,
                    cmd_rx,
                    producer,
                    wav_tx,
                    meter,
                    stop_for_worker,
                    sample_rate,
                )
            })
            .map_err(EngineError::WorkerSpawn)?;

        info!(sample_rate, play, "audio engine started");
        Ok(Self {
            cmd_tx,
            stop_flag,
            output,
            worker: Some(worker),
            sample_rate,
        })
    }

    /// Simulation-side handle for issuing commands.
    pub fn commands(&self) -> Sender<EngineCommand> {
        self.cmd_tx.clone()
    }

    /// Rate the mixer renders at (device rate, or the configured rate in
    /// wav-only mode).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Idempotent teardown: stop the worker, then the device stream.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        if let Some(mut output) = self.output.take() {
            output.stop();
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render_loop(
    mut mixer: Mixer,
    cmd_rx: Receiver<EngineCommand>,
    mut producer: Option<HeapProd<f32>>,
    wav_tx: Option<Sender<Arc<[f32]>>>,
    meter: Arc<LimiterMeter>,
    stop: Arc<AtomicBool>,
    sample_rate: u32,
) {
    let mut buf = vec![0.0f32; HOP];
    let hop_duration = Duration::from_secs_f32(HOP as f32 / sample_rate as f32);
    let mut next_deadline = Instant::now();
    let mut last_meter_log = Instant::now();

    loop {
        if stop.load(Ordering::SeqCst) {
            debug!("render worker stopping");
            break;
        }

        while let Ok(cmd) = cmd_rx.try_recv() {
            mixer.apply(cmd);
        }

        mixer.render_hop(&mut buf);

        if let Some(prod) = producer.as_mut() {
            // Device consumption paces us through ring backpressure.
            AudioOutput::push_samples(prod, &buf);
        }
        if let Some(tx) = &wav_tx {
            let _ = tx.try_send(Arc::from(buf.as_slice()));
        }

        next_deadline += hop_duration;
        if producer.is_none() {
            let now = Instant::now();
            if now < next_deadline {
                thread::sleep(next_deadline - now);
            } else {
                next_deadline = now;
            }
        }

        if last_meter_log.elapsed() >= Duration::from_secs(1) {
            if let Some(stats) = meter.take_snapshot() {
                debug!(
                    num_over = stats.num_over,
                    max_reduction_db = stats.max_reduction_db,
                    "limiter engaged"
                );
            }
            last_meter_log = Instant::now();
        }
    }
}
