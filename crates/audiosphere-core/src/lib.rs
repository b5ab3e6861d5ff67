pub mod bands;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod particles;
pub mod sampler;
pub mod smoother;
pub mod timing;
pub mod volume;

pub use bands::{compute_bands, BandDefinition, BandEnergy, BandName, BandTable, DEFAULT_BANDS};
pub use config::{BoostConfig, Preset, VisualizerConfig};
pub use driver::{ControlFrame, FrameDriver};
pub use error::AudioError;
pub use particles::{Particle, ParticleConfig, ParticleEngine, ParticleInstance, ParticlePool};
pub use sampler::{AudioFrame, BufferedSampler, SignalSampler};
pub use smoother::{ControlState, Measurement, ParameterSmoother, ParticleModulation, SmoothingConfig};
pub use timing::clamp_frame_dt;
pub use volume::compute_volume;
