use klatt80::{
    AMPLITUDE_FLOOR_DB, Control, ControlTracks, GlottalSourceType, Settings, Track, Variant,
    synthesize,
};
use rand::{SeedableRng, rngs::SmallRng};

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(0x6b6c_6174)
}

fn track(points: &[f64]) -> Control {
    Track::new(points.to_vec()).unwrap().into()
}

/// Flat F0 of 100 Hz through the cascade branch, everything but `AV` silent.
fn cascade_vowel() -> ControlTracks {
    ControlTracks {
        av: Control::Scalar(0.0),
        sw: Control::Scalar(0.0),
        ..ControlTracks::silent()
    }
}

fn peak(wave: &[f64]) -> f64 {
    wave.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}

fn autocorrelation(wave: &[f64], lag: usize) -> f64 {
    (2000..8000).map(|n| wave[n] * wave[n + lag]).sum()
}

#[test]
fn cascade_vowel_is_periodic_at_f0() {
    let wave = synthesize(&cascade_vowel(), &Settings::default(), rng()).unwrap();
    assert_eq!(wave.len(), 10_000);
    assert!((peak(&wave) - 1.0).abs() < 1e-12);

    let best = (50..150)
        .max_by(|a, b| autocorrelation(&wave, *a).total_cmp(&autocorrelation(&wave, *b)))
        .unwrap();
    assert!((98..=102).contains(&best), "autocorrelation peaks at lag {best}");
}

/// A sound that exercises every section: moving F0 and formants, aspiration, frication,
/// the switch flipping between branches and all parallel amplitudes.
fn busy_tracks() -> ControlTracks {
    ControlTracks {
        f0: track(&[90.0, 140.0, 120.0, 100.0]),
        ff: vec![
            track(&[300.0, 700.0, 450.0]),
            track(&[2200.0, 1100.0, 1600.0]),
            Control::Scalar(2500.0),
            Control::Scalar(3500.0),
            Control::Scalar(4500.0),
        ],
        av: track(&[0.0, -6.0, 0.0]),
        avs: Control::Scalar(-20.0),
        ah: Control::Scalar(-10.0),
        af: track(&[AMPLITUDE_FLOOR_DB, 0.0, -20.0]),
        sw: track(&[0.0, 0.0, 1.0, 1.0, 0.0]),
        a1: Control::Scalar(-5.0),
        a2: Control::Scalar(-10.0),
        a3: Control::Scalar(-15.0),
        a4: Control::Scalar(-20.0),
        a5: Control::Scalar(-25.0),
        an: Control::Scalar(-30.0),
        fl: Control::Scalar(0.25),
        tl: Control::Scalar(6.0),
        ..ControlTracks::default()
    }
}

#[test]
fn chunked_rendering_matches_whole_buffer() {
    let tracks = busy_tracks();
    let settings = Settings {
        sample_rate: 16_000,
        duration: 0.4,
        ..Settings::default()
    };
    let whole = synthesize(&tracks, &settings, rng()).unwrap();
    assert_eq!(whole.len(), 6400);

    for chunk in [1, 37, 512, 6400, 100_000] {
        let chunked = synthesize(
            &tracks,
            &Settings {
                chunk_len: Some(chunk),
                ..settings.clone()
            },
            rng(),
        )
        .unwrap();
        assert_eq!(chunked, whole, "chunk length {chunk}");
    }
}

#[test]
fn same_seed_same_sound() {
    let tracks = busy_tracks();
    let a = synthesize(&tracks, &Settings::default(), rng()).unwrap();
    let b = synthesize(&tracks, &Settings::default(), rng()).unwrap();
    let c = synthesize(&tracks, &Settings::default(), SmallRng::seed_from_u64(1)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn natural_glottal_source() {
    let tracks = ControlTracks {
        oq: Control::Scalar(0.5),
        tl: Control::Scalar(10.0),
        ..cascade_vowel()
    };
    let settings = Settings {
        glottal_source: GlottalSourceType::Natural,
        ..Settings::default()
    };
    let wave = synthesize(&tracks, &settings, rng()).unwrap();
    assert!(wave.iter().all(|v| v.is_finite()));
    assert!((peak(&wave) - 1.0).abs() < 1e-12);
}

#[test]
fn six_formants() {
    let tracks = ControlTracks {
        sw: Control::Scalar(1.0),
        af: Control::Scalar(0.0),
        a6: Control::Scalar(0.0),
        ..ControlTracks::with_formants(
            &[500.0, 1500.0, 2500.0, 3500.0, 4000.0, 4500.0],
            &[50.0, 100.0, 100.0, 200.0, 250.0, 300.0],
        )
    };
    let settings = Settings {
        formant_count: 6,
        duration: 0.2,
        ..Settings::default()
    };
    let wave = synthesize(&tracks, &settings, rng()).unwrap();
    assert_eq!(wave.len(), 2000);
}

#[test]
fn sine_wave_variant() {
    let tracks = ControlTracks::with_formants(&[500.0, 1500.0], &[0.0, 0.0]);
    let settings = Settings {
        variant: Variant::SineWave,
        formant_count: 2,
        ..Settings::default()
    };
    let wave = synthesize(&tracks, &settings, rng()).unwrap();
    assert_eq!(wave.len(), 10_000);
    assert!((peak(&wave) - 1.0).abs() < 1e-12);
    // both components are in phase every 20 samples at 10 kHz
    for n in [2000, 4020, 7000] {
        assert!((wave[n] - wave[n + 20]).abs() < 1e-6);
    }
}

#[test]
fn sine_wave_follows_envelope() {
    let tracks = ControlTracks {
        env: track(&[0.0, 1.0]),
        ..ControlTracks::with_formants(&[440.0], &[0.0])
    };
    let settings = Settings {
        variant: Variant::SineWave,
        formant_count: 1,
        ..Settings::default()
    };
    let wave = synthesize(&tracks, &settings, rng()).unwrap();
    assert_eq!(wave[0], 0.0);
    assert!(peak(&wave[..1000]) < peak(&wave[9000..]));
}
