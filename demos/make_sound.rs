//! Synthesizes a one second /ai/ glide and writes it to `out.wav`.
//!
//! Run with `RUST_LOG=klatt80=debug` to see the graph being built.

use hound::{SampleFormat, WavSpec, WavWriter};
use klatt80::{Control, ControlTracks, Settings, Track, synthesize};
use rand::{SeedableRng, rngs::SmallRng};

fn track(points: &[f64]) -> Control {
    Track::new(points.to_vec()).map_or(Control::Scalar(points[0]), Control::from)
}

fn glide() -> ControlTracks {
    ControlTracks {
        f0: track(&[110.0, 125.0, 120.0, 100.0]),
        ff: vec![
            track(&[750.0, 750.0, 400.0, 300.0]),
            track(&[1200.0, 1300.0, 2000.0, 2300.0]),
            track(&[2500.0, 2550.0, 2700.0, 3000.0]),
            Control::Scalar(3500.0),
            Control::Scalar(4500.0),
        ],
        bw: vec![
            Control::Scalar(90.0),
            Control::Scalar(110.0),
            Control::Scalar(150.0),
            Control::Scalar(200.0),
            Control::Scalar(250.0),
        ],
        av: track(&[-30.0, 0.0, 0.0, 0.0, -6.0, -40.0]),
        ah: track(&[-20.0, -40.0, -40.0, -30.0]),
        fl: Control::Scalar(0.25),
        tl: Control::Scalar(4.0),
        ..ControlTracks::silent()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = Settings {
        sample_rate: 16_000,
        chunk_len: Some(512),
        ..Settings::default()
    };
    let sound = synthesize(&glide(), &settings, SmallRng::seed_from_u64(1980))?;
    println!("Sound: {:#?}", &sound[0..20]);

    let spec = WavSpec {
        channels: 1,
        sample_rate: u32::try_from(settings.sample_rate)?,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create("out.wav", spec)?;
    for sample in &sound {
        writer.write_sample(*sample as f32)?;
    }
    writer.finalize()?;
    Ok(())
}
