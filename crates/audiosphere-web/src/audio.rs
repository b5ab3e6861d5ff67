use audiosphere_core::{AudioError, AudioFrame, SignalSampler};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

const MIN_FFT_SIZE: u32 = 32;
const MAX_FFT_SIZE: u32 = 32_768;

fn js_err(e: JsValue) -> String {
    format!("{:?}", e)
}

// Create an analyser with the requested window size and temporal smoothing
pub fn create_analyser(
    audio_ctx: &web::AudioContext,
    fft_size: u32,
    smoothing_time_constant: f64,
) -> Result<web::AnalyserNode, AudioError> {
    if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
        return Err(AudioError::InvalidAnalyser(format!(
            "fft size must be a power of two in {MIN_FFT_SIZE}..={MAX_FFT_SIZE}, got {fft_size}"
        )));
    }
    let analyser = web::AnalyserNode::new(audio_ctx).map_err(|e| {
        log::error!("AnalyserNode error: {:?}", e);
        AudioError::InvalidAnalyser(js_err(e))
    })?;
    analyser.set_fft_size(fft_size);
    analyser.set_smoothing_time_constant(smoothing_time_constant.clamp(0.0, 1.0));
    Ok(analyser)
}

pub async fn resume(audio_ctx: &web::AudioContext) -> Result<(), AudioError> {
    let promise = audio_ctx
        .resume()
        .map_err(|e| AudioError::Resume(js_err(e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| AudioError::Resume(js_err(e)))?;
    log::info!("audio context running @ {} Hz", audio_ctx.sample_rate());
    Ok(())
}

pub async fn suspend(audio_ctx: &web::AudioContext) -> Result<(), AudioError> {
    let promise = audio_ctx
        .suspend()
        .map_err(|e| AudioError::Suspend(js_err(e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| AudioError::Suspend(js_err(e)))?;
    log::info!("audio context suspended");
    Ok(())
}

/// Reads byte spectra and waveforms from a WebAudio analyser.
pub struct AnalyserSampler {
    audio_ctx: web::AudioContext,
    analyser: web::AnalyserNode,
    bins: Vec<u8>,
    waveform: Vec<u8>,
}

impl AnalyserSampler {
    pub fn new(audio_ctx: web::AudioContext, analyser: web::AnalyserNode) -> Self {
        let bins = vec![0u8; analyser.frequency_bin_count() as usize];
        let waveform = vec![128u8; analyser.fft_size() as usize];
        Self {
            audio_ctx,
            analyser,
            bins,
            waveform,
        }
    }

    pub fn audio_ctx(&self) -> &web::AudioContext {
        &self.audio_ctx
    }

    pub fn analyser(&self) -> &web::AnalyserNode {
        &self.analyser
    }
}

impl SignalSampler for AnalyserSampler {
    fn sample(&mut self) -> Option<AudioFrame> {
        if self.audio_ctx.state() != web::AudioContextState::Running {
            return None;
        }
        // fftSize may have been changed from JS since construction
        let bins = self.analyser.frequency_bin_count() as usize;
        if self.bins.len() != bins {
            self.bins.resize(bins, 0);
            self.waveform.resize(self.analyser.fft_size() as usize, 128);
        }
        // back to back so spectrum and waveform describe the same window
        self.analyser.get_byte_frequency_data(&mut self.bins);
        self.analyser.get_byte_time_domain_data(&mut self.waveform);
        Some(AudioFrame::new(
            self.bins.clone(),
            self.waveform.clone(),
            self.audio_ctx.sample_rate(),
        ))
    }

    fn sample_rate(&self) -> f32 {
        self.audio_ctx.sample_rate()
    }

    fn bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }
}
