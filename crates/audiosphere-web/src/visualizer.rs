use crate::audio::{self, AnalyserSampler};
use audiosphere_core::{BandName, FrameDriver, Preset, VisualizerConfig};
use instant::Instant;
use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys as web;

const DEFAULT_FFT_SIZE: u32 = 2048;
const DEFAULT_SMOOTHING_TIME_CONSTANT: f64 = 0.8;

/// JS-facing handle: one `frame()` call per requestAnimationFrame.
#[wasm_bindgen]
pub struct Visualizer {
    driver: FrameDriver<AnalyserSampler>,
    last_instant: Instant,
}

#[wasm_bindgen]
impl Visualizer {
    /// Build an analyser on `audio_ctx` and a particle field seeded by `seed`.
    /// `fft_size` of 0 selects the default window.
    #[wasm_bindgen(constructor)]
    pub fn new(audio_ctx: web::AudioContext, fft_size: u32, seed: u32) -> Result<Visualizer, JsValue> {
        let fft_size = if fft_size == 0 {
            DEFAULT_FFT_SIZE
        } else {
            fft_size
        };
        let analyser = audio::create_analyser(&audio_ctx, fft_size, DEFAULT_SMOOTHING_TIME_CONSTANT)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let sampler = AnalyserSampler::new(audio_ctx, analyser);
        let driver = FrameDriver::new(sampler, VisualizerConfig::default(), seed as u64);
        Ok(Visualizer {
            driver,
            last_instant: Instant::now(),
        })
    }

    /// Route an upstream node (media element, stream source, ...) into the analyser.
    pub fn connect_source(&self, source: &web::AudioNode) -> Result<(), JsValue> {
        source
            .connect_with_audio_node(self.driver.sampler().analyser())
            .map(|_| ())
    }

    /// The analyser node, for callers that want to chain it onward.
    pub fn analyser(&self) -> web::AnalyserNode {
        self.driver.sampler().analyser().clone()
    }

    /// Resolves once the audio context is running; rejects with a readable
    /// message when the device cannot be resumed.
    pub fn resume(&self) -> Promise {
        let ctx = self.driver.sampler().audio_ctx().clone();
        future_to_promise(async move {
            audio::resume(&ctx)
                .await
                .map(|_| JsValue::UNDEFINED)
                .map_err(|e| {
                    log::error!("{e}");
                    JsValue::from_str(&e.to_string())
                })
        })
    }

    pub fn suspend(&self) -> Promise {
        let ctx = self.driver.sampler().audio_ctx().clone();
        future_to_promise(async move {
            audio::suspend(&ctx)
                .await
                .map(|_| JsValue::UNDEFINED)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    /// Advance one display frame using wall-clock time since the last call.
    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt = now - self.last_instant;
        self.last_instant = now;
        self.driver.tick(dt.as_secs_f32());
    }

    /// Advance by an explicit step in seconds.
    pub fn tick(&mut self, dt: f32) {
        self.last_instant = Instant::now();
        self.driver.tick(dt);
    }

    /// `[bass, low_mid, mid, high_mid, treble, volume]`
    pub fn controls(&self) -> Vec<f32> {
        let frame = self.driver.frame();
        let mut out: Vec<f32> = BandName::ALL.iter().map(|&b| frame.band(b)).collect();
        out.push(frame.volume());
        out
    }

    /// Interleaved `[x, y, z, size, r, g, b, alpha]` per particle.
    pub fn particles(&self) -> Vec<f32> {
        bytemuck::cast_slice::<_, f32>(self.driver.frame().particles.as_slice()).to_vec()
    }

    pub fn particle_count(&self) -> usize {
        self.driver.frame().particles.len()
    }

    pub fn particles_changed(&self) -> bool {
        self.driver.frame().particles_changed
    }

    pub fn bloom_strength(&self) -> f32 {
        self.driver.frame().bloom_strength
    }

    pub fn signal_present(&self) -> bool {
        self.driver.frame().signal_present
    }

    /// Overwrite settings from a flat `{ key: number }` object. Missing keys
    /// keep their current values; the change lands on the next frame.
    pub fn apply_preset(&mut self, preset: &JsValue) -> Result<(), JsValue> {
        let obj = preset
            .dyn_ref::<Object>()
            .ok_or_else(|| JsValue::from_str("preset must be an object"))?;
        let mut map = Preset::default();
        for entry in Object::entries(obj).iter() {
            let pair: Array = entry.unchecked_into();
            let (Some(key), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_f64()) else {
                continue;
            };
            map.insert(key, value as f32);
        }
        let next = self.driver.next_config().with_preset(&map);
        self.driver.set_config(next);
        Ok(())
    }

    /// Current settings as a flat `{ key: number }` object.
    pub fn preset(&self) -> Result<Object, JsValue> {
        let out = Object::new();
        for (key, value) in self.driver.next_config().to_preset() {
            Reflect::set(&out, &JsValue::from_str(&key), &JsValue::from_f64(value as f64))?;
        }
        Ok(out)
    }
}
