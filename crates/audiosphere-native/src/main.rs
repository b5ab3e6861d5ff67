use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use audiosphere_core::{
    BandName, BufferedSampler, FrameDriver, Preset, SignalSampler, VisualizerConfig,
};
use clap::Parser;

mod analyser;
mod capture;

use capture::CaptureSampler;

#[derive(Parser, Debug)]
#[command(name = "audiosphere", about = "Audio-reactive particle field driven by the default input device")]
struct Cli {
    /// Analysis window in samples (power of two).
    #[arg(long, default_value_t = 2048)]
    fft_size: usize,

    /// Temporal smoothing of the spectrum, 0..1.
    #[arg(long, default_value_t = 0.8)]
    smoothing_time_constant: f32,

    /// Override the particle count.
    #[arg(long)]
    particles: Option<usize>,

    /// Frames per second of the control loop.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Stop after this many seconds; runs until interrupted when omitted.
    #[arg(long)]
    seconds: Option<f32>,

    /// Seed for particle placement.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Preset override, `key=value`. May be repeated.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Print the effective preset and exit.
    #[arg(long)]
    print_preset: bool,
}

fn parse_preset(pairs: &[String]) -> anyhow::Result<Preset> {
    let mut preset = Preset::default();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {pair:?}"))?;
        let value: f32 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid number for {key}"))?;
        preset.insert(key.trim().to_string(), value);
    }
    Ok(preset)
}

fn open_sampler(cli: &Cli) -> Box<dyn SignalSampler> {
    let opened = CaptureSampler::open_default(cli.fft_size, cli.smoothing_time_constant)
        .and_then(|mut sampler| {
            sampler.resume()?;
            Ok(sampler)
        });
    match opened {
        Ok(sampler) => Box::new(sampler),
        Err(e) => {
            // keep animating without audio; the field decays to rest
            log::error!("audio input unavailable: {e}");
            Box::new(BufferedSampler::new(44_100.0, cli.fft_size / 2))
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let mut preset = parse_preset(&cli.set)?;
    if let Some(count) = cli.particles {
        preset.insert("particle_count".to_string(), count as f32);
    }
    let config = VisualizerConfig::default().with_preset(&preset);

    if cli.print_preset {
        let mut entries: Vec<_> = config.to_preset().into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in entries {
            println!("{key}={value}");
        }
        return Ok(());
    }

    let sampler = open_sampler(&cli);
    let mut driver = FrameDriver::new(sampler, config, cli.seed);

    let frame_period = Duration::from_secs_f64(1.0 / cli.fps.max(1) as f64);
    let started = Instant::now();
    let mut last = started;
    let mut last_report = started;
    let mut frames: u32 = 0;

    loop {
        let now = Instant::now();
        if let Some(limit) = cli.seconds {
            if (now - started).as_secs_f32() >= limit {
                break;
            }
        }
        let dt = (now - last).as_secs_f32();
        last = now;

        let frame = driver.tick(dt);
        frames += 1;

        if now - last_report >= Duration::from_secs(1) {
            let bands: Vec<String> = BandName::ALL
                .iter()
                .map(|&b| format!("{}={:.2}", b.as_str(), frame.band(b)))
                .collect();
            log::info!(
                "{frames} fps | vol={:.2} bloom={:.2} signal={} | {}",
                frame.volume(),
                frame.bloom_strength,
                frame.signal_present,
                bands.join(" ")
            );
            frames = 0;
            last_report = now;
        }

        let elapsed = now.elapsed();
        if elapsed < frame_period {
            thread::sleep(frame_period - elapsed);
        }
    }

    log::info!("stopped after {:.1}s", started.elapsed().as_secs_f32());
    Ok(())
}
