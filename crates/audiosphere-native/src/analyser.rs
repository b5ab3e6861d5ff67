//! Native stand-in for a WebAudio `AnalyserNode`.
//!
//! Produces the same byte views the browser does: a Blackman-windowed FFT,
//! magnitudes smoothed over time, converted to decibels and mapped onto
//! 0..=255 between `min_db` and `max_db`; plus the raw window as 8-bit
//! samples centred on 128.

use audiosphere_core::AudioError;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

pub const DEFAULT_MIN_DB: f32 = -100.0;
pub const DEFAULT_MAX_DB: f32 = -30.0;
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32_768;

/// Blackman window (alpha = 0.16) as used by WebAudio analysers.
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let a0 = 0.42;
    let a1 = 0.5;
    let a2 = 0.08;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

pub struct Analyser {
    fft_size: usize,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(fft_size: usize, smoothing: f32) -> Result<Self, AudioError> {
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(AudioError::InvalidAnalyser(format!(
                "fft size must be a power of two in {MIN_FFT_SIZE}..={MAX_FFT_SIZE}, got {fft_size}"
            )));
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Ok(Self {
            fft_size,
            smoothing: smoothing.clamp(0.0, 1.0),
            min_db: DEFAULT_MIN_DB,
            max_db: DEFAULT_MAX_DB,
            window: (0..fft_size).map(|i| blackman_window(i, fft_size)).collect(),
            fft,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Analyse the most recent `fft_size` samples of `samples` (zero padded
    /// at the front when shorter). Returns `(frequency_bins, waveform)`.
    pub fn analyse(&mut self, samples: &[f32]) -> (Vec<u8>, Vec<u8>) {
        let n = self.fft_size;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let pad = n - tail.len();

        let mut waveform = vec![128u8; n];
        for (i, &s) in tail.iter().enumerate() {
            waveform[pad + i] = time_domain_byte(s);
        }

        for (i, c) in self.buffer.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { tail[i - pad] };
            *c = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let scale = 1.0 / n as f32;
        let range = self.max_db - self.min_db;
        let mut bins = vec![0u8; self.bin_count()];
        for (k, out) in bins.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() * scale;
            let prev = self.smoothed[k];
            let mut v = self.smoothing * prev + (1.0 - self.smoothing) * magnitude;
            if !v.is_finite() {
                v = 0.0;
            }
            self.smoothed[k] = v;
            let db = 20.0 * v.log10();
            let scaled = 255.0 / range * (db - self.min_db);
            *out = if scaled.is_finite() {
                scaled.floor().clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
        (bins, waveform)
    }
}

#[inline]
fn time_domain_byte(sample: f32) -> u8 {
    (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}
