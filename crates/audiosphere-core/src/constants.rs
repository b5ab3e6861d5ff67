// Shared tuning constants for the analysis pipeline and particle field.

// Frame timing
pub const MAX_FRAME_DT_SEC: f32 = 0.05; // upper bound on a single tick step after a stall

// Analyser byte data
pub const MAX_BIN_MAGNITUDE: f32 = 255.0; // largest value an 8-bit magnitude can take
pub const WAVEFORM_CENTER: f32 = 128.0; // 8-bit time-domain zero line

// Smoothing rates (per-tick lerp factors)
pub const DEFAULT_ATTACK: f32 = 0.2;
pub const DEFAULT_RELEASE: f32 = 0.1; // sphere-facing channels
pub const DEFAULT_PARTICLE_RELEASE: f32 = 0.05; // particle-facing channels

// Particle pool
pub const DEFAULT_PARTICLE_CAPACITY: usize = 5_000;
pub const MAX_PARTICLE_CAPACITY: usize = 50_000;
pub const DEFAULT_MIN_LIFESPAN_SEC: f32 = 2.0;
pub const DEFAULT_MAX_LIFESPAN_SEC: f32 = 6.0;
pub const MIN_LIFESPAN_FLOOR_SEC: f32 = 0.05; // smallest lifespan ever drawn
pub const MIN_LIFESPAN_SPAN_SEC: f32 = 0.1; // width forced onto an empty/inverted range
pub const MAX_LIFESPAN_SEC: f32 = 20.0; // longest lifespan ever drawn

// Spawn shell around the sphere
pub const DEFAULT_INNER_RADIUS: f32 = 1.5;
pub const DEFAULT_OUTER_RADIUS: f32 = 4.0;
pub const MAX_SPAWN_RADIUS: f32 = 1_000.0;

// Particle appearance
pub const DEFAULT_BASE_SIZE_RANGE: [f32; 2] = [0.02, 0.08];
pub const MAX_BASE_SIZE: f32 = 10.0;
pub const DEFAULT_COLOR_FLOOR: f32 = 0.5; // keeps particles from going muddy
pub const DEFAULT_COLOR_CEILING: f32 = 1.0;
pub const DEFAULT_SIZE_VOLUME_GAIN: f32 = 1.5; // k1
pub const DEFAULT_SIZE_MID_GAIN: f32 = 0.8; // k2

// Drift
pub const DEFAULT_DRIFT_SPEED: f32 = 0.3; // radians per second at randomFactor = 0
pub const DEFAULT_DRIFT_AMPLITUDE: f32 = 0.15; // world units
pub const DRIFT_MID_GAIN: f32 = 1.0; // how much mid energy widens the drift

// Alpha envelope breakpoints (normalized age)
pub const FADE_IN_END: f32 = 0.2;
pub const FADE_OUT_START: f32 = 0.7;

// Post-processing boost
pub const DEFAULT_BLOOM_BASE_STRENGTH: f32 = 0.9;
pub const DEFAULT_AUDIO_BOOST_FACTOR: f32 = 1.2;
