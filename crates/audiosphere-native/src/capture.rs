use crate::analyser::Analyser;
use audiosphere_core::{AudioError, AudioFrame, SignalSampler};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Most recent mono samples written by the capture callback.
#[derive(Debug)]
pub struct SampleRing {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Downmix interleaved frames to mono and append, dropping the oldest.
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks(channels) {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            if self.samples.len() == self.capacity {
                self.samples.pop_front();
            }
            self.samples.push_back(mono);
        }
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Copy the whole window into `out`.
    pub fn snapshot(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.samples.iter().copied());
    }
}

/// Captures the default input device and analyses it on demand.
pub struct CaptureSampler {
    ring: Arc<Mutex<SampleRing>>,
    failed: Arc<AtomicBool>,
    analyser: Analyser,
    sample_rate: f32,
    window: Vec<f32>,
    stream: cpal::Stream,
    running: bool,
}

impl CaptureSampler {
    pub fn open_default(fft_size: usize, smoothing: f32) -> Result<Self, AudioError> {
        let analyser = Analyser::new(fft_size, smoothing)?;
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no default input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        log::info!(
            "capture: {} @ {} Hz, {} ch",
            device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels
        );

        let ring = Arc::new(Mutex::new(SampleRing::new(fft_size)));
        let failed = Arc::new(AtomicBool::new(false));
        let config: cpal::StreamConfig = supported.config();
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                build_input::<f32>(&device, &config, channels, ring.clone(), failed.clone())
            }
            cpal::SampleFormat::I16 => {
                build_input::<i16>(&device, &config, channels, ring.clone(), failed.clone())
            }
            cpal::SampleFormat::U16 => {
                build_input::<u16>(&device, &config, channels, ring.clone(), failed.clone())
            }
            other => {
                return Err(AudioError::StreamBuild(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        Ok(Self {
            ring,
            failed,
            analyser,
            sample_rate,
            window: Vec::with_capacity(fft_size),
            stream,
            running: false,
        })
    }

    pub fn resume(&mut self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::Resume(e.to_string()))?;
        self.running = true;
        Ok(())
    }
}

impl SignalSampler for CaptureSampler {
    fn sample(&mut self) -> Option<AudioFrame> {
        if !self.running || self.failed.load(Ordering::Relaxed) {
            return None;
        }
        {
            let ring = self.ring.lock().ok()?;
            // wait for one full window before reporting a signal
            if !ring.is_full() {
                return None;
            }
            ring.snapshot(&mut self.window);
        }
        let (bins, waveform) = self.analyser.analyse(&self.window);
        Some(AudioFrame::new(bins, waveform, self.sample_rate))
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    ring: Arc<Mutex<SampleRing>>,
    failed: Arc<AtomicBool>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            scratch.clear();
            scratch.extend(data.iter().map(|&s| f32::from_sample(s)));
            if let Ok(mut ring) = ring.lock() {
                ring.push_interleaved(&scratch, channels);
            }
        },
        move |err| {
            log::error!("audio stream error: {err}");
            failed.store(true, Ordering::Relaxed);
        },
        None,
    )
}
