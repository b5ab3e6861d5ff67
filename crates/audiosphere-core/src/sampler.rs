//! Per-tick snapshots of the audio graph's analysis buffers.
//!
//! A [`SignalSampler`] is the boundary to whatever owns the audio graph (a
//! WebAudio `AnalyserNode`, a native capture stream, a test fixture). Each
//! call to [`SignalSampler::sample`] yields one [`AudioFrame`] whose spectral
//! and waveform data come from the same analysis window, or `None` while the
//! graph is not running.

/// One analysis snapshot. Never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioFrame {
    /// 8-bit magnitudes, ascending frequency, one per bin.
    pub frequency_bins: Vec<u8>,
    /// 8-bit time-domain samples centred on 128.
    pub waveform: Vec<u8>,
    pub sample_rate: f32,
}

impl AudioFrame {
    pub fn new(frequency_bins: Vec<u8>, waveform: Vec<u8>, sample_rate: f32) -> Self {
        Self {
            frequency_bins,
            waveform,
            sample_rate,
        }
    }

    #[inline]
    pub fn bin_count(&self) -> usize {
        self.frequency_bins.len()
    }

    #[inline]
    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }
}

/// Source of analysis frames, polled once per display frame.
pub trait SignalSampler {
    /// Capture the current analysis window, or `None` if the audio graph is
    /// not actively running. Unavailability is a steady state, not a failure.
    fn sample(&mut self) -> Option<AudioFrame>;

    fn sample_rate(&self) -> f32;

    fn bin_count(&self) -> usize;
}

impl<S: SignalSampler + ?Sized> SignalSampler for Box<S> {
    fn sample(&mut self) -> Option<AudioFrame> {
        (**self).sample()
    }

    fn sample_rate(&self) -> f32 {
        (**self).sample_rate()
    }

    fn bin_count(&self) -> usize {
        (**self).bin_count()
    }
}

/// In-memory sampler: hands out the most recently pushed frame while running.
///
/// Useful for embedding the pipeline behind a custom audio source and for
/// driving it deterministically in tests.
#[derive(Clone, Debug)]
pub struct BufferedSampler {
    sample_rate: f32,
    bin_count: usize,
    running: bool,
    latest: Option<AudioFrame>,
}

impl BufferedSampler {
    pub fn new(sample_rate: f32, bin_count: usize) -> Self {
        Self {
            sample_rate,
            bin_count,
            running: false,
            latest: None,
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Replace the frame returned by subsequent samples.
    pub fn push_frame(&mut self, frequency_bins: Vec<u8>, waveform: Vec<u8>) {
        if frequency_bins.len() != self.bin_count {
            log::debug!(
                "buffered sampler: bin count changed {} -> {}",
                self.bin_count,
                frequency_bins.len()
            );
            self.bin_count = frequency_bins.len();
        }
        self.latest = Some(AudioFrame::new(frequency_bins, waveform, self.sample_rate));
    }
}

impl SignalSampler for BufferedSampler {
    fn sample(&mut self) -> Option<AudioFrame> {
        if !self.running {
            return None;
        }
        self.latest.clone()
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn bin_count(&self) -> usize {
        self.bin_count
    }
}
