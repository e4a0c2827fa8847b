//! Output device transport.
//!
//! The render worker pushes mono samples into a ring buffer; the cpal
//! callback only pops it and duplicates the value across hardware channels.
//! Nothing on the audio callback path can block on the simulation side.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::*;
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::error;

use crate::audio::engine::EngineError;

pub struct AudioOutput {
    stream: Option<cpal::Stream>,
    pub config: cpal::StreamConfig,
}

impl AudioOutput {
    /// Open the default output device and start the stream. Returns the
    /// producer half of the sample ring for the render worker.
    pub fn new(latency_ms: f32) -> Result<(Self, HeapProd<f32>), EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;

        let supported_config = device
            .default_output_config()
            .map_err(EngineError::DeviceConfig)?;
        let sample_rate = supported_config.sample_rate().0;
        let channels = supported_config.channels();

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        // Mono ring sized for the requested latency, with headroom.
        let capacity = ((sample_rate as f32 * latency_ms / 1000.0) as usize).max(256);
        let rb = HeapRb::<f32>::new(capacity * 4);
        let (prod, mut cons): (HeapProd<f32>, HeapCons<f32>) = rb.split();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let n_frames = data.len() / channels as usize;
                    for frame in 0..n_frames {
                        // Underrun plays silence rather than stalling.
                        let s = cons.try_pop().unwrap_or(0.0);
                        for ch in 0..channels as usize {
                            data[frame * channels as usize + ch] = s;
                        }
                    }
                },
                |err| error!("output stream error: {err}"),
                None,
            )
            .map_err(EngineError::BuildStream)?;
        stream.play().map_err(EngineError::PlayStream)?;

        Ok((
            Self {
                stream: Some(stream),
                config,
            },
            prod,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn stop(&mut self) {
        self.stream.take(); // take and drop
    }

    /// Push a rendered hop, backing off briefly while the ring is full.
    /// This is the render worker's pacing against real time.
    pub fn push_samples(prod: &mut HeapProd<f32>, samples: &[f32]) {
        let mut offset = 0;
        while offset < samples.len() {
            let written = prod.push_slice(&samples[offset..]);
            offset += written;
            if offset < samples.len() {
                std::thread::sleep(std::time::Duration::from_micros(200));
            }
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stream.take();
    }
}
