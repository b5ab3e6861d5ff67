//! Named frequency bands and their reduction to normalized energies.

use crate::constants::MAX_BIN_MAGNITUDE;
use crate::sampler::AudioFrame;
use std::ops::RangeInclusive;

pub const BAND_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BandName {
    Bass,
    LowMid,
    Mid,
    HighMid,
    Treble,
}

impl BandName {
    pub const ALL: [BandName; BAND_COUNT] = [
        BandName::Bass,
        BandName::LowMid,
        BandName::Mid,
        BandName::HighMid,
        BandName::Treble,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BandName::Bass => "bass",
            BandName::LowMid => "low_mid",
            BandName::Mid => "mid",
            BandName::HighMid => "high_mid",
            BandName::Treble => "treble",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandDefinition {
    pub name: BandName,
    pub low_hz: f32,
    pub high_hz: f32,
}

impl BandDefinition {
    pub const fn new(name: BandName, low_hz: f32, high_hz: f32) -> Self {
        Self {
            name,
            low_hz,
            high_hz,
        }
    }
}

/// Fixed table of the five named bands, one entry per [`BandName`] in order.
pub type BandTable = [BandDefinition; BAND_COUNT];

pub const DEFAULT_BANDS: BandTable = [
    BandDefinition::new(BandName::Bass, 20.0, 140.0),
    BandDefinition::new(BandName::LowMid, 140.0, 400.0),
    BandDefinition::new(BandName::Mid, 400.0, 2600.0),
    BandDefinition::new(BandName::HighMid, 2600.0, 5200.0),
    BandDefinition::new(BandName::Treble, 5200.0, 14000.0),
];

/// Per-band energy in \[0, 1\], recomputed from scratch each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandEnergy {
    values: [f32; BAND_COUNT],
}

impl BandEnergy {
    pub fn from_array(values: [f32; BAND_COUNT]) -> Self {
        Self { values }
    }

    #[inline]
    pub fn get(&self, band: BandName) -> f32 {
        self.values[band.index()]
    }

    #[inline]
    pub fn set(&mut self, band: BandName, value: f32) {
        self.values[band.index()] = value;
    }

    pub fn as_array(&self) -> &[f32; BAND_COUNT] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (BandName, f32)> + '_ {
        BandName::ALL.iter().map(move |&b| (b, self.get(b)))
    }
}

fn hz_to_bin(hz: f32, bin_count: usize, nyquist: f32) -> usize {
    let raw = (hz as f64 * bin_count as f64 / nyquist as f64).floor();
    let last = (bin_count - 1) as f64;
    raw.clamp(0.0, last) as usize
}

/// Inclusive bin range covered by `band`, or `None` when the band is
/// degenerate for this analysis configuration (inverted, entirely above
/// Nyquist, or no bins at all).
pub fn band_bin_range(
    band: &BandDefinition,
    sample_rate: f32,
    bin_count: usize,
) -> Option<RangeInclusive<usize>> {
    let nyquist = sample_rate * 0.5;
    if bin_count == 0 || !(nyquist > 0.0) {
        return None;
    }
    if !(band.high_hz >= band.low_hz) || band.low_hz >= nyquist {
        return None;
    }
    let low = hz_to_bin(band.low_hz, bin_count, nyquist);
    let high = hz_to_bin(band.high_hz, bin_count, nyquist);
    if low > high {
        return None;
    }
    Some(low..=high)
}

/// Mean magnitude of `bins` over `range`, normalized to \[0, 1\].
fn mean_energy(bins: &[u8], range: RangeInclusive<usize>) -> f32 {
    let slice = &bins[range];
    if slice.is_empty() {
        return 0.0;
    }
    let sum: u32 = slice.iter().map(|&b| b as u32).sum();
    (sum as f32 / slice.len() as f32 / MAX_BIN_MAGNITUDE).clamp(0.0, 1.0)
}

/// Reduce each band of `bands` to its normalized mean energy in `frame`.
pub fn compute_bands(frame: &AudioFrame, bands: &BandTable) -> BandEnergy {
    let mut energy = BandEnergy::default();
    for def in bands {
        let value = band_bin_range(def, frame.sample_rate, frame.bin_count())
            .map(|range| mean_energy(&frame.frequency_bins, range))
            .unwrap_or(0.0);
        energy.set(def.name, value);
    }
    energy
}
