//! Wav capture of the master bus. The worker sends already-limited hops,
//! so the writer only converts to 16-bit.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::warn;

pub struct WavOutput;

impl WavOutput {
    pub fn run(
        rx: Receiver<Arc<[f32]>>,
        path: String,
        sample_rate: u32,
    ) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            let spec = WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            let mut writer = match WavWriter::create(&path, spec) {
                Ok(w) => w,
                Err(err) => {
                    warn!("cannot create wav file {path}: {err}");
                    return;
                }
            };

            while let Ok(samples) = rx.recv() {
                for &s in samples.iter() {
                    let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    if writer.write_sample(v).is_err() {
                        warn!("wav write failed; stopping capture");
                        return;
                    }
                }
            }

            if let Err(err) = writer.finalize() {
                warn!("wav finalize failed: {err}");
            }
        })
    }
}
