use thiserror::Error;

/// Failures of the audio-graph collaborator that the caller should surface.
///
/// Expected unavailability (graph not started yet, or paused) is not an error;
/// samplers report that as `None` from [`crate::SignalSampler::sample`].
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio device available: {0}")]
    DeviceUnavailable(String),
    #[error("failed to build audio stream: {0}")]
    StreamBuild(String),
    #[error("failed to resume audio graph: {0}")]
    Resume(String),
    #[error("failed to suspend audio graph: {0}")]
    Suspend(String),
    #[error("invalid analyser configuration: {0}")]
    InvalidAnalyser(String),
}
