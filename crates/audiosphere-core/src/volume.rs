use crate::constants::WAVEFORM_CENTER;

/// Mean absolute deviation of an 8-bit waveform from its centre line,
/// normalized to \[0, 1\]. An empty waveform is silent.
pub fn compute_volume(waveform: &[u8]) -> f32 {
    if waveform.is_empty() {
        return 0.0;
    }
    let sum: f32 = waveform
        .iter()
        .map(|&s| (s as f32 - WAVEFORM_CENTER).abs() / WAVEFORM_CENTER)
        .sum();
    (sum / waveform.len() as f32).clamp(0.0, 1.0)
}
