//! Temporal smoothing of raw band/volume measurements.
//!
//! Raw measurements jump from frame to frame even on steady audio. Each
//! channel is pulled toward its latest measurement with a per-tick lerp:
//! the attack rate while a signal is present, and a slower release rate
//! toward zero while the audio graph is unavailable.

use crate::bands::{BandEnergy, BandName, BAND_COUNT};
use crate::constants::{DEFAULT_ATTACK, DEFAULT_PARTICLE_RELEASE, DEFAULT_RELEASE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingConfig {
    pub attack: f32,
    /// Release for the control state consumed by the sphere/bloom side.
    pub release: f32,
    /// Release for the volume/mid pair that modulates the particle field.
    pub particle_release: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            attack: DEFAULT_ATTACK,
            release: DEFAULT_RELEASE,
            particle_release: DEFAULT_PARTICLE_RELEASE,
        }
    }
}

/// One tick's raw measurements.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Measurement {
    pub bands: BandEnergy,
    pub volume: f32,
}

/// Smoothed per-band energies plus volume, each in \[0, 1\].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlState {
    pub bands: BandEnergy,
    pub volume: f32,
}

impl ControlState {
    #[inline]
    pub fn band(&self, band: BandName) -> f32 {
        self.bands.get(band)
    }

    /// Advance every channel one tick. `None` means no signal: all channels
    /// decay toward zero at `release`; otherwise they approach the
    /// measurement at `attack`.
    pub fn smoothed(&self, measurement: Option<&Measurement>, attack: f32, release: f32) -> Self {
        let (target, alpha) = match measurement {
            Some(m) => (*m, attack),
            None => (Measurement::default(), release),
        };
        let mut bands = [0.0; BAND_COUNT];
        for (i, band) in BandName::ALL.iter().enumerate() {
            bands[i] = lerp(self.bands.get(*band), target.bands.get(*band), alpha);
        }
        Self {
            bands: BandEnergy::from_array(bands),
            volume: lerp(self.volume, target.volume, alpha),
        }
    }
}

/// Volume and mid-band values that drive particle size and drift.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleModulation {
    pub volume: f32,
    pub mid: f32,
}

/// Owns the cross-tick smoothing memory of the feature-extraction side.
#[derive(Clone, Debug, Default)]
pub struct ParameterSmoother {
    controls: ControlState,
    modulation: ParticleModulation,
}

impl ParameterSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    pub fn modulation(&self) -> ParticleModulation {
        self.modulation
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, measurement: Option<&Measurement>, config: &SmoothingConfig) {
        self.controls = self
            .controls
            .smoothed(measurement, config.attack, config.release);

        let (target, alpha) = match measurement {
            Some(m) => (
                ParticleModulation {
                    volume: m.volume,
                    mid: m.bands.get(BandName::Mid),
                },
                config.attack,
            ),
            None => (ParticleModulation::default(), config.particle_release),
        };
        self.modulation = ParticleModulation {
            volume: lerp(self.modulation.volume, target.volume, alpha),
            mid: lerp(self.modulation.mid, target.mid, alpha),
        };
    }
}

/// Linear interpolation with `t` held to \[0, 1\] so a step never overshoots.
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    from + (to - from) * t
}

/// Ticks needed for a constant-alpha lerp to close all but `epsilon` of the gap.
pub fn ticks_to_converge(alpha: f32, epsilon: f32) -> u32 {
    if alpha >= 1.0 {
        return 1;
    }
    if alpha <= 0.0 || epsilon <= 0.0 {
        return u32::MAX;
    }
    (epsilon.ln() / (1.0 - alpha).ln()).ceil().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(v: f32) -> Measurement {
        Measurement {
            bands: BandEnergy::from_array([v; BAND_COUNT]),
            volume: v,
        }
    }

    #[test]
    fn attack_moves_a_fifth_of_the_gap() {
        let s = ControlState::default().smoothed(Some(&measurement(1.0)), 0.2, 0.1);
        assert!((s.volume - 0.2).abs() < 1e-6);
        assert!((s.band(BandName::Treble) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn release_decays_toward_zero() {
        let start = ControlState {
            bands: BandEnergy::from_array([1.0; BAND_COUNT]),
            volume: 1.0,
        };
        let s = start.smoothed(None, 0.2, 0.1);
        assert!((s.volume - 0.9).abs() < 1e-6);
        assert!((s.band(BandName::Bass) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn particle_channels_release_slower() {
        let mut smoother = ParameterSmoother::new();
        let cfg = SmoothingConfig::default();
        for _ in 0..60 {
            smoother.update(Some(&measurement(0.8)), &cfg);
        }
        for _ in 0..10 {
            smoother.update(None, &cfg);
        }
        assert!(smoother.modulation().volume > smoother.controls().volume);
        assert!(smoother.modulation().mid > smoother.controls().band(BandName::Mid));
    }

    #[test]
    fn lerp_never_overshoots() {
        assert_eq!(lerp(0.0, 1.0, 3.0), 1.0);
        assert_eq!(lerp(0.5, 1.0, -1.0), 0.5);
        assert_eq!(lerp(0.5, 1.0, f32::NAN), 0.5);
    }

    #[test]
    fn ticks_to_converge_matches_closed_form() {
        // (0.8)^n <= 0.01 first at n = 21
        assert_eq!(ticks_to_converge(0.2, 0.01), 21);
        assert_eq!(ticks_to_converge(1.0, 0.01), 1);
    }
}
