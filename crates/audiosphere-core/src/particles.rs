//! Fixed-population particle field.
//!
//! Particles live in a struct-of-arrays pool whose size only changes when the
//! whole pool is recreated. Every tick ages each particle by `dt`; a particle
//! whose life runs out is redrawn in place within the same tick, so indices
//! stay stable and nothing is allocated or freed on the steady-state path.
//! Render-facing values (alpha envelope, audio-scaled size, drift) are derived
//! from `life / max_life` each tick and never stored back into the pool.

use crate::constants::*;
use crate::timing::clamp_frame_dt;
use glam::Vec3;
use rand::prelude::*;
use std::f32::consts::TAU;

#[derive(Clone, Debug, PartialEq)]
pub struct ParticleConfig {
    pub capacity: usize,
    pub min_lifespan: f32,
    pub max_lifespan: f32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub base_size_range: [f32; 2],
    pub color_floor: f32,
    pub color_ceiling: f32,
    /// Size gain applied to smoothed volume (k1).
    pub size_volume_gain: f32,
    /// Size gain applied to smoothed mid energy (k2).
    pub size_mid_gain: f32,
    pub drift_speed: f32,
    pub drift_amplitude: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_PARTICLE_CAPACITY,
            min_lifespan: DEFAULT_MIN_LIFESPAN_SEC,
            max_lifespan: DEFAULT_MAX_LIFESPAN_SEC,
            inner_radius: DEFAULT_INNER_RADIUS,
            outer_radius: DEFAULT_OUTER_RADIUS,
            base_size_range: DEFAULT_BASE_SIZE_RANGE,
            color_floor: DEFAULT_COLOR_FLOOR,
            color_ceiling: DEFAULT_COLOR_CEILING,
            size_volume_gain: DEFAULT_SIZE_VOLUME_GAIN,
            size_mid_gain: DEFAULT_SIZE_MID_GAIN,
            drift_speed: DEFAULT_DRIFT_SPEED,
            drift_amplitude: DEFAULT_DRIFT_AMPLITUDE,
        }
    }
}

impl ParticleConfig {
    /// Lifespan bounds that always admit a strictly positive draw.
    pub fn lifespan_range(&self) -> (f32, f32) {
        sanitize_lifespan(self.min_lifespan, self.max_lifespan)
    }

    pub fn clamped_capacity(&self) -> usize {
        self.capacity.min(MAX_PARTICLE_CAPACITY)
    }

    fn radius_range(&self) -> (f32, f32) {
        ordered(
            finite_or(self.inner_radius, 0.0).clamp(0.0, MAX_SPAWN_RADIUS),
            finite_or(self.outer_radius, 0.0).clamp(0.0, MAX_SPAWN_RADIUS),
        )
    }

    fn size_range(&self) -> (f32, f32) {
        ordered(
            finite_or(self.base_size_range[0], 0.0).clamp(0.0, MAX_BASE_SIZE),
            finite_or(self.base_size_range[1], 0.0).clamp(0.0, MAX_BASE_SIZE),
        )
    }

    /// Warn about settings that spawning will not use as given.
    fn warn_clamped(&self) {
        let (min, max) = self.lifespan_range();
        if (min, max) != (self.min_lifespan, self.max_lifespan) {
            log::warn!(
                "lifespan {}..{} clamped to {}..{}",
                self.min_lifespan,
                self.max_lifespan,
                min,
                max
            );
        }
        let (inner, outer) = self.radius_range();
        if inner.max(outer) < self.inner_radius.max(self.outer_radius) {
            log::warn!("spawn radius clamped to {}", MAX_SPAWN_RADIUS);
        }
        let (_, size) = self.size_range();
        if size < self.base_size_range[0].max(self.base_size_range[1]) {
            log::warn!("base size clamped to {}", MAX_BASE_SIZE);
        }
    }

    fn color_range(&self) -> (f32, f32) {
        ordered(
            finite_or(self.color_floor, 0.0).clamp(0.0, 1.0),
            finite_or(self.color_ceiling, 1.0).clamp(0.0, 1.0),
        )
    }
}

/// Clamp a lifespan range so it is non-empty, strictly positive and bounded
/// by [`MAX_LIFESPAN_SEC`].
pub fn sanitize_lifespan(min: f32, max: f32) -> (f32, f32) {
    let min = finite_or(min, MIN_LIFESPAN_FLOOR_SEC)
        .clamp(MIN_LIFESPAN_FLOOR_SEC, MAX_LIFESPAN_SEC - MIN_LIFESPAN_SPAN_SEC);
    let max = if max.is_finite() && max > min {
        max.min(MAX_LIFESPAN_SEC)
    } else {
        min + MIN_LIFESPAN_SPAN_SEC
    };
    (min, max)
}

#[inline]
fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

#[inline]
fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Snapshot of one pooled particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub color: [f32; 3],
    pub base_size: f32,
    /// Desynchronizes drift and alpha phase across the population.
    pub random_factor: f32,
    pub life: f32,
    pub max_life: f32,
}

impl Particle {
    #[inline]
    pub fn normalized_age(&self) -> f32 {
        normalized_age(self.life, self.max_life)
    }
}

#[inline]
pub fn normalized_age(life: f32, max_life: f32) -> f32 {
    if max_life <= 0.0 {
        return 1.0;
    }
    (1.0 - life / max_life).clamp(0.0, 1.0)
}

/// Struct-of-arrays particle storage. Index `i` of every column belongs to
/// the same particle.
#[derive(Clone, Debug, Default)]
pub struct ParticlePool {
    positions: Vec<Vec3>,
    colors: Vec<[f32; 3]>,
    base_sizes: Vec<f32>,
    random_factors: Vec<f32>,
    lives: Vec<f32>,
    max_lives: Vec<f32>,
}

impl ParticlePool {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            base_sizes: Vec::with_capacity(capacity),
            random_factors: Vec::with_capacity(capacity),
            lives: Vec::with_capacity(capacity),
            max_lives: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, p: Particle) {
        self.positions.push(p.position);
        self.colors.push(p.color);
        self.base_sizes.push(p.base_size);
        self.random_factors.push(p.random_factor);
        self.lives.push(p.life);
        self.max_lives.push(p.max_life);
    }

    fn write(&mut self, i: usize, p: Particle) {
        self.positions[i] = p.position;
        self.colors[i] = p.color;
        self.base_sizes[i] = p.base_size;
        self.random_factors[i] = p.random_factor;
        self.lives[i] = p.life;
        self.max_lives[i] = p.max_life;
    }

    pub fn len(&self) -> usize {
        self.lives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lives.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Particle> {
        if i >= self.len() {
            return None;
        }
        Some(Particle {
            position: self.positions[i],
            color: self.colors[i],
            base_size: self.base_sizes[i],
            random_factor: self.random_factors[i],
            life: self.lives[i],
            max_life: self.max_lives[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn base_sizes(&self) -> &[f32] {
        &self.base_sizes
    }

    pub fn lives(&self) -> &[f32] {
        &self.lives
    }

    pub fn random_factors(&self) -> &[f32] {
        &self.random_factors
    }

    pub fn max_lives(&self) -> &[f32] {
        &self.max_lives
    }
}

/// Render-ready per-particle values, laid out for direct buffer upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub alpha: f32,
}

/// Fade in over the first 20% of life, hold, then fade out over the last 30%.
pub fn alpha_envelope(normalized_age: f32) -> f32 {
    let age = normalized_age.clamp(0.0, 1.0);
    let a = if age < FADE_IN_END {
        age / FADE_IN_END
    } else if age <= FADE_OUT_START {
        1.0
    } else {
        (1.0 - age) / (1.0 - FADE_OUT_START)
    };
    a.clamp(0.0, 1.0)
}

/// Uniform direction on the unit sphere.
pub fn random_unit_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vec3::new(sin_phi * cos_theta, sin_phi * sin_theta, cos_phi)
}

// every drift component repeats after this much phase
const DRIFT_PHASE_PERIOD: f64 = 20.0 * std::f64::consts::PI;

/// Slow wander around a particle's base position.
///
/// `time` stays `f64` until the phase is wrapped, so the motion stays smooth
/// however long the field has been running.
pub fn drift_offset(time: f64, random_factor: f32, audio_mid: f32, speed: f32, amplitude: f32) -> Vec3 {
    let phase = random_factor * TAU;
    let rate = (speed * (0.5 + random_factor)) as f64;
    let t = (time * rate + phase as f64).rem_euclid(DRIFT_PHASE_PERIOD) as f32;
    let amp = amplitude * (1.0 + audio_mid * DRIFT_MID_GAIN);
    Vec3::new(t.sin(), (t * 0.7 + phase).cos(), (t * 1.3).sin() * (t * 0.5).cos()) * amp
}

pub struct ParticleEngine {
    config: ParticleConfig,
    pool: ParticlePool,
    rng: StdRng,
    time: f64,
    instances: Vec<ParticleInstance>,
}

impl ParticleEngine {
    pub fn new(config: ParticleConfig, seed: u64) -> Self {
        let mut engine = Self {
            config,
            pool: ParticlePool::default(),
            rng: StdRng::seed_from_u64(seed),
            time: 0.0,
            instances: Vec::new(),
        };
        engine.populate();
        engine
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Seconds of simulated time since construction.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Derived instances from the most recent tick.
    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    /// Replace the configuration. Parameters other than capacity apply to
    /// future respawns; a capacity change rebuilds the whole pool.
    pub fn set_config(&mut self, config: ParticleConfig) {
        let recreate = config.clamped_capacity() != self.config.clamped_capacity();
        self.config = config;
        if recreate {
            self.populate();
        } else {
            self.config.warn_clamped();
        }
    }

    /// Throw away every particle and build a fresh pool from `config`.
    pub fn recreate(&mut self, config: ParticleConfig) {
        self.config = config;
        self.populate();
    }

    fn populate(&mut self) {
        if self.config.capacity > MAX_PARTICLE_CAPACITY {
            log::warn!(
                "particle capacity {} exceeds limit, clamping to {}",
                self.config.capacity,
                MAX_PARTICLE_CAPACITY
            );
        }
        self.config.warn_clamped();
        let capacity = self.config.clamped_capacity();
        let mut pool = ParticlePool::with_capacity(capacity);
        for _ in 0..capacity {
            let mut p = self.spawn();
            // stagger initial ages so the first generation does not expire together
            p.life = p.max_life * (1.0 - self.rng.gen::<f32>());
            pool.push(p);
        }
        self.pool = pool;
        self.instances.clear();
        self.instances.resize(capacity, ParticleInstance::default());
        log::debug!("particle pool populated: {} particles", capacity);
    }

    fn spawn(&mut self) -> Particle {
        let (r_min, r_max) = self.config.radius_range();
        let (c_min, c_max) = self.config.color_range();
        let (s_min, s_max) = self.config.size_range();
        let (l_min, l_max) = self.config.lifespan_range();

        let rng = &mut self.rng;
        let radius = rng.gen_range(r_min..=r_max);
        let position = random_unit_direction(rng) * radius;
        let color = [
            rng.gen_range(c_min..=c_max),
            rng.gen_range(c_min..=c_max),
            rng.gen_range(c_min..=c_max),
        ];
        let base_size = rng.gen_range(s_min..=s_max);
        let random_factor = rng.gen::<f32>();
        let max_life = rng.gen_range(l_min..=l_max).max(MIN_LIFESPAN_FLOOR_SEC);
        Particle {
            position,
            color,
            base_size,
            random_factor,
            life: max_life,
            max_life,
        }
    }

    /// Age every particle by `dt`, respawn the expired ones and recompute the
    /// render instances. Returns whether any particle respawned.
    pub fn tick(&mut self, dt: f32, audio_volume: f32, audio_mid: f32) -> bool {
        let dt = clamp_frame_dt(dt);
        self.time += dt as f64;
        let mut changed = false;
        for i in 0..self.pool.len() {
            self.pool.lives[i] -= dt;
            if self.pool.lives[i] <= 0.0 {
                let p = self.spawn();
                self.pool.write(i, p);
                changed = true;
            }
        }
        self.rebuild_instances(audio_volume, audio_mid);
        changed
    }

    fn rebuild_instances(&mut self, audio_volume: f32, audio_mid: f32) {
        let volume = finite_or(audio_volume, 0.0).clamp(0.0, 1.0);
        let mid = finite_or(audio_mid, 0.0).clamp(0.0, 1.0);
        let size_scale =
            1.0 + volume * self.config.size_volume_gain + mid * self.config.size_mid_gain;
        let pool = &self.pool;
        self.instances.resize(pool.len(), ParticleInstance::default());
        for (i, inst) in self.instances.iter_mut().enumerate() {
            let rf = pool.random_factors[i];
            let age = normalized_age(pool.lives[i], pool.max_lives[i]);
            let offset = drift_offset(
                self.time,
                rf,
                mid,
                self.config.drift_speed,
                self.config.drift_amplitude,
            );
            *inst = ParticleInstance {
                position: (pool.positions[i] + offset).to_array(),
                size: pool.base_sizes[i] * size_scale,
                color: pool.colors[i],
                alpha: alpha_envelope(age) * (0.5 + 0.5 * rf),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(capacity: usize) -> ParticleConfig {
        ParticleConfig {
            capacity,
            min_lifespan: 0.5,
            max_lifespan: 1.0,
            ..ParticleConfig::default()
        }
    }

    #[test]
    fn envelope_shape() {
        assert_eq!(alpha_envelope(0.0), 0.0);
        assert!((alpha_envelope(0.1) - 0.5).abs() < 1e-6);
        assert_eq!(alpha_envelope(0.2), 1.0);
        assert_eq!(alpha_envelope(0.5), 1.0);
        assert_eq!(alpha_envelope(0.7), 1.0);
        assert!((alpha_envelope(0.85) - 0.5).abs() < 1e-5);
        assert_eq!(alpha_envelope(1.0), 0.0);
    }

    #[test]
    fn inverted_lifespan_is_clamped() {
        let (min, max) = sanitize_lifespan(5.0, 1.0);
        assert_eq!(min, 5.0);
        assert!(max > min);
        let (min, max) = sanitize_lifespan(-1.0, 0.0);
        assert!(min > 0.0 && max > min);
        let (min, max) = sanitize_lifespan(f32::NAN, f32::INFINITY);
        assert!(min > 0.0 && max > min && max.is_finite());
    }

    #[test]
    fn lifespan_is_capped() {
        let (min, max) = sanitize_lifespan(1.0, f32::MAX);
        assert_eq!(min, 1.0);
        assert_eq!(max, MAX_LIFESPAN_SEC);
        let (min, max) = sanitize_lifespan(f32::MAX, f32::MAX);
        assert!(min < max && max <= MAX_LIFESPAN_SEC);
    }

    #[test]
    fn huge_ranges_spawn_without_panicking() {
        let cfg = ParticleConfig {
            max_lifespan: f32::MAX,
            inner_radius: -f32::MAX,
            outer_radius: f32::MAX,
            base_size_range: [0.0, f32::MAX],
            ..small_config(64)
        };
        let mut engine = ParticleEngine::new(cfg, 2);
        for _ in 0..10 {
            engine.tick(MAX_FRAME_DT_SEC, 1.0, 1.0);
        }
        for p in engine.pool().iter() {
            assert!(p.life > 0.0 && p.life <= p.max_life);
            assert!(p.max_life <= MAX_LIFESPAN_SEC);
            assert!(p.position.length() <= MAX_SPAWN_RADIUS + 1.0);
            assert!(p.base_size <= MAX_BASE_SIZE);
        }
    }

    #[test]
    fn alpha_is_envelope_scaled_by_random_factor() {
        let mut engine = ParticleEngine::new(small_config(64), 21);
        engine.tick(0.016, 0.3, 0.3);
        let pool = engine.pool();
        for (i, inst) in engine.instances().iter().enumerate() {
            let age = normalized_age(pool.lives()[i], pool.max_lives()[i]);
            let expected = alpha_envelope(age) * (0.5 + 0.5 * pool.random_factors()[i]);
            assert!((inst.alpha - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn particles_drift_without_respawning() {
        let mut engine = ParticleEngine::new(small_config(32), 4);
        for i in 0..engine.len() {
            engine.pool.lives[i] = engine.pool.max_lives[i];
        }
        engine.tick(0.0, 0.0, 0.0);
        let base: Vec<Vec3> = engine.pool().positions().to_vec();
        let before: Vec<[f32; 3]> = engine.instances().iter().map(|i| i.position).collect();

        assert!(!engine.tick(0.04, 0.0, 0.0));
        assert_eq!(engine.pool().positions(), base.as_slice());
        for (inst, prev) in engine.instances().iter().zip(before) {
            assert_ne!(inst.position, prev);
        }
    }

    #[test]
    fn mid_energy_widens_drift() {
        let (t, rf) = (1.3, 0.4);
        let quiet = drift_offset(t, rf, 0.0, DEFAULT_DRIFT_SPEED, DEFAULT_DRIFT_AMPLITUDE);
        let loud = drift_offset(t, rf, 1.0, DEFAULT_DRIFT_SPEED, DEFAULT_DRIFT_AMPLITUDE);
        assert!(quiet.length() > 0.0);
        assert!(loud.length() > quiet.length());
        assert!((loud.length() / quiet.length() - (1.0 + DRIFT_MID_GAIN)).abs() < 1e-4);
    }

    #[test]
    fn drift_stays_smooth_after_hours() {
        let t = 10.0 * 3600.0;
        let a = drift_offset(t, 0.3, 0.0, DEFAULT_DRIFT_SPEED, DEFAULT_DRIFT_AMPLITUDE);
        let b = drift_offset(t + 0.001, 0.3, 0.0, DEFAULT_DRIFT_SPEED, DEFAULT_DRIFT_AMPLITUDE);
        assert_ne!(a, b);
        assert!((a - b).length() < 1e-3);
    }

    #[test]
    fn unit_directions_are_normalized() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let d = random_unit_direction(&mut rng);
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn spawned_positions_lie_in_shell() {
        let engine = ParticleEngine::new(small_config(500), 3);
        let cfg = engine.config();
        for p in engine.pool().iter() {
            let r = p.position.length();
            assert!(r >= cfg.inner_radius - 1e-3 && r <= cfg.outer_radius + 1e-3);
        }
    }

    #[test]
    fn particle_at_zero_life_respawns_same_tick() {
        let mut engine = ParticleEngine::new(small_config(4), 11);
        engine.pool.lives[2] = 0.01;
        let changed = engine.tick(0.01, 0.0, 0.0);
        assert!(changed);
        let p = engine.pool().get(2).unwrap();
        assert!(p.life > 0.0);
        assert_eq!(p.life, p.max_life);
    }

    #[test]
    fn no_respawn_reports_unchanged() {
        let mut engine = ParticleEngine::new(small_config(16), 5);
        for i in 0..engine.len() {
            engine.pool.lives[i] = engine.pool.max_lives[i];
        }
        assert!(!engine.tick(0.001, 0.5, 0.5));
    }

    #[test]
    fn size_breathes_with_audio() {
        let mut engine = ParticleEngine::new(small_config(8), 9);
        engine.tick(0.0, 0.0, 0.0);
        let quiet: Vec<f32> = engine.instances().iter().map(|i| i.size).collect();
        engine.tick(0.0, 1.0, 1.0);
        let cfg = engine.config().clone();
        for (inst, q) in engine.instances().iter().zip(quiet) {
            let expected = q * (1.0 + cfg.size_volume_gain + cfg.size_mid_gain);
            assert!((inst.size - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn capacity_change_recreates_pool() {
        let mut engine = ParticleEngine::new(small_config(10), 1);
        engine.set_config(small_config(25));
        assert_eq!(engine.len(), 25);
        assert_eq!(engine.instances().len(), 25);
        engine.set_config(ParticleConfig {
            max_lifespan: 3.0,
            ..small_config(25)
        });
        assert_eq!(engine.len(), 25);
    }

    #[test]
    fn capacity_is_bounded() {
        let engine = ParticleEngine::new(small_config(MAX_PARTICLE_CAPACITY + 10), 1);
        assert_eq!(engine.len(), MAX_PARTICLE_CAPACITY);
    }
}
