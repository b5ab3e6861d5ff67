//! Per-display-frame orchestration.
//!
//! One [`FrameDriver::tick`] runs sample, aggregate/estimate, smooth,
//! particle tick and emit, in that order, and always runs to completion.
//! The only state carried between ticks is the smoother's memory and the
//! particle pool.

use crate::bands::{compute_bands, BandName};
use crate::config::VisualizerConfig;
use crate::particles::{ParticleEngine, ParticleInstance};
use crate::sampler::SignalSampler;
use crate::smoother::{ControlState, Measurement, ParameterSmoother, ParticleModulation};
use crate::timing::clamp_frame_dt;
use crate::volume::compute_volume;

/// Everything a renderer needs for one frame. Rebuilt every tick.
#[derive(Clone, Debug, Default)]
pub struct ControlFrame {
    pub controls: ControlState,
    pub particles: Vec<ParticleInstance>,
    /// True when at least one particle respawned this tick; consumers may
    /// skip re-uploading particle attributes otherwise.
    pub particles_changed: bool,
    /// `base_strength + volume * audio_boost_factor` for post-processing.
    pub bloom_strength: f32,
    /// Whether the sampler produced a frame this tick.
    pub signal_present: bool,
    /// Simulated seconds since the particle field was created.
    pub time: f64,
}

impl ControlFrame {
    #[inline]
    pub fn band(&self, band: BandName) -> f32 {
        self.controls.band(band)
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.controls.volume
    }
}

pub struct FrameDriver<S: SignalSampler> {
    sampler: S,
    config: VisualizerConfig,
    pending: Option<VisualizerConfig>,
    smoother: ParameterSmoother,
    particles: ParticleEngine,
    frame: ControlFrame,
}

impl<S: SignalSampler> FrameDriver<S> {
    pub fn new(sampler: S, config: VisualizerConfig, seed: u64) -> Self {
        let particles = ParticleEngine::new(config.particles.clone(), seed);
        log::info!(
            "frame driver ready: {} particles, {} bins @ {} Hz",
            particles.len(),
            sampler.bin_count(),
            sampler.sample_rate()
        );
        Self {
            sampler,
            config,
            pending: None,
            smoother: ParameterSmoother::new(),
            particles,
            frame: ControlFrame::default(),
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    /// The configuration the next tick will run with.
    pub fn next_config(&self) -> &VisualizerConfig {
        self.pending.as_ref().unwrap_or(&self.config)
    }

    /// Queue a new configuration for the start of the next tick.
    pub fn set_config(&mut self, config: VisualizerConfig) {
        self.pending = Some(config);
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    pub fn particles(&self) -> &ParticleEngine {
        &self.particles
    }

    pub fn controls(&self) -> &ControlState {
        self.smoother.controls()
    }

    pub fn modulation(&self) -> ParticleModulation {
        self.smoother.modulation()
    }

    /// The frame emitted by the most recent tick.
    pub fn frame(&self) -> &ControlFrame {
        &self.frame
    }

    fn apply_pending(&mut self) {
        let Some(next) = self.pending.take() else {
            return;
        };
        if next.particles != self.config.particles {
            let before = self.particles.len();
            self.particles.set_config(next.particles.clone());
            if self.particles.len() != before {
                log::info!(
                    "particle pool recreated: {} -> {} particles",
                    before,
                    self.particles.len()
                );
            }
        }
        log::debug!("configuration applied");
        self.config = next;
    }

    pub fn tick(&mut self, dt: f32) -> &ControlFrame {
        self.apply_pending();
        let dt = clamp_frame_dt(dt);

        let measurement = self.sampler.sample().map(|frame| Measurement {
            bands: compute_bands(&frame, &self.config.bands),
            volume: compute_volume(&frame.waveform),
        });
        self.smoother
            .update(measurement.as_ref(), &self.config.smoothing);

        let modulation = self.smoother.modulation();
        let changed = self.particles.tick(dt, modulation.volume, modulation.mid);

        let controls = *self.smoother.controls();
        self.frame.controls = controls;
        self.frame.particles.clear();
        self.frame
            .particles
            .extend_from_slice(self.particles.instances());
        self.frame.particles_changed = changed;
        self.frame.bloom_strength = self.config.boost.strength(controls.volume);
        self.frame.signal_present = measurement.is_some();
        self.frame.time = self.particles.time();
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::BufferedSampler;

    #[test]
    fn pending_config_applies_on_next_tick() {
        let mut cfg = VisualizerConfig::default();
        cfg.particles.capacity = 10;
        let mut driver = FrameDriver::new(BufferedSampler::new(44_100.0, 1024), cfg.clone(), 1);
        cfg.particles.capacity = 20;
        driver.set_config(cfg);
        assert_eq!(driver.particles().len(), 10);
        let frame = driver.tick(0.016);
        assert_eq!(frame.particles.len(), 20);
    }
}
