//! Runtime configuration and flat preset mapping.
//!
//! A [`VisualizerConfig`] is an ordinary value. Control surfaces build a new
//! one (for example through [`VisualizerConfig::with_preset`]) and hand it to
//! the frame driver, which decides when to apply it.

use crate::bands::{BandName, BandTable, DEFAULT_BANDS};
use crate::constants::{DEFAULT_AUDIO_BOOST_FACTOR, DEFAULT_BLOOM_BASE_STRENGTH};
use crate::particles::ParticleConfig;
use crate::smoother::SmoothingConfig;
use fnv::FnvHashMap;

/// Flat key to numeric value mapping used to save and restore settings.
pub type Preset = FnvHashMap<String, f32>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostConfig {
    pub base_strength: f32,
    pub audio_boost_factor: f32,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            base_strength: DEFAULT_BLOOM_BASE_STRENGTH,
            audio_boost_factor: DEFAULT_AUDIO_BOOST_FACTOR,
        }
    }
}

impl BoostConfig {
    /// Post-processing intensity for the given smoothed volume.
    #[inline]
    pub fn strength(&self, volume: f32) -> f32 {
        self.base_strength + volume * self.audio_boost_factor
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualizerConfig {
    pub bands: BandTable,
    pub particles: ParticleConfig,
    pub smoothing: SmoothingConfig,
    pub boost: BoostConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS,
            particles: ParticleConfig::default(),
            smoothing: SmoothingConfig::default(),
            boost: BoostConfig::default(),
        }
    }
}

const PARTICLE_COUNT: &str = "particle_count";
const MIN_LIFESPAN: &str = "min_lifespan";
const MAX_LIFESPAN: &str = "max_lifespan";
const INNER_RADIUS: &str = "inner_radius";
const OUTER_RADIUS: &str = "outer_radius";
const MIN_BASE_SIZE: &str = "min_base_size";
const MAX_BASE_SIZE: &str = "max_base_size";
const COLOR_FLOOR: &str = "color_floor";
const COLOR_CEILING: &str = "color_ceiling";
const SIZE_VOLUME_GAIN: &str = "size_volume_gain";
const SIZE_MID_GAIN: &str = "size_mid_gain";
const DRIFT_SPEED: &str = "drift_speed";
const DRIFT_AMPLITUDE: &str = "drift_amplitude";
const ATTACK: &str = "attack";
const RELEASE: &str = "release";
const PARTICLE_RELEASE: &str = "particle_release";
const BLOOM_BASE_STRENGTH: &str = "bloom_base_strength";
const AUDIO_BOOST_FACTOR: &str = "audio_boost_factor";

fn band_key(band: BandName, edge: &str) -> String {
    format!("{}_{}_hz", band.as_str(), edge)
}

impl VisualizerConfig {
    /// Copy of `self` with every recognised key in `preset` applied.
    /// Missing keys keep their current value; unknown keys and non-finite
    /// values are ignored.
    pub fn with_preset(&self, preset: &Preset) -> Self {
        let mut next = self.clone();
        for (key, &value) in preset {
            if !value.is_finite() {
                log::warn!("preset: ignoring non-finite value for {key}");
                continue;
            }
            if !next.set_field(key, value) {
                log::debug!("preset: unknown key {key}");
            }
        }
        next
    }

    /// Set one field by preset key. Returns false for unknown keys.
    pub fn set_field(&mut self, key: &str, value: f32) -> bool {
        let p = &mut self.particles;
        match key {
            PARTICLE_COUNT => p.capacity = value.round().max(0.0) as usize,
            MIN_LIFESPAN => p.min_lifespan = value,
            MAX_LIFESPAN => p.max_lifespan = value,
            INNER_RADIUS => p.inner_radius = value,
            OUTER_RADIUS => p.outer_radius = value,
            MIN_BASE_SIZE => p.base_size_range[0] = value,
            MAX_BASE_SIZE => p.base_size_range[1] = value,
            COLOR_FLOOR => p.color_floor = value,
            COLOR_CEILING => p.color_ceiling = value,
            SIZE_VOLUME_GAIN => p.size_volume_gain = value,
            SIZE_MID_GAIN => p.size_mid_gain = value,
            DRIFT_SPEED => p.drift_speed = value,
            DRIFT_AMPLITUDE => p.drift_amplitude = value,
            ATTACK => self.smoothing.attack = value,
            RELEASE => self.smoothing.release = value,
            PARTICLE_RELEASE => self.smoothing.particle_release = value,
            BLOOM_BASE_STRENGTH => self.boost.base_strength = value,
            AUDIO_BOOST_FACTOR => self.boost.audio_boost_factor = value,
            _ => return self.set_band_edge(key, value),
        }
        true
    }

    fn set_band_edge(&mut self, key: &str, value: f32) -> bool {
        for def in self.bands.iter_mut() {
            if key == band_key(def.name, "low") {
                def.low_hz = value;
                return true;
            }
            if key == band_key(def.name, "high") {
                def.high_hz = value;
                return true;
            }
        }
        false
    }

    /// Flatten into the preset mapping understood by [`Self::with_preset`].
    pub fn to_preset(&self) -> Preset {
        let p = &self.particles;
        let mut out = Preset::default();
        let mut put = |k: &str, v: f32| {
            out.insert(k.to_string(), v);
        };
        put(PARTICLE_COUNT, p.capacity as f32);
        put(MIN_LIFESPAN, p.min_lifespan);
        put(MAX_LIFESPAN, p.max_lifespan);
        put(INNER_RADIUS, p.inner_radius);
        put(OUTER_RADIUS, p.outer_radius);
        put(MIN_BASE_SIZE, p.base_size_range[0]);
        put(MAX_BASE_SIZE, p.base_size_range[1]);
        put(COLOR_FLOOR, p.color_floor);
        put(COLOR_CEILING, p.color_ceiling);
        put(SIZE_VOLUME_GAIN, p.size_volume_gain);
        put(SIZE_MID_GAIN, p.size_mid_gain);
        put(DRIFT_SPEED, p.drift_speed);
        put(DRIFT_AMPLITUDE, p.drift_amplitude);
        put(ATTACK, self.smoothing.attack);
        put(RELEASE, self.smoothing.release);
        put(PARTICLE_RELEASE, self.smoothing.particle_release);
        put(BLOOM_BASE_STRENGTH, self.boost.base_strength);
        put(AUDIO_BOOST_FACTOR, self.boost.audio_boost_factor);
        for def in &self.bands {
            put(&band_key(def.name, "low"), def.low_hz);
            put(&band_key(def.name, "high"), def.high_hz);
        }
        out
    }
}
