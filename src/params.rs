//! Synthesis settings, control tracks, and their expansion into per-sample parameters.

use alloc::{format, string::String, vec, vec::Vec};

use crate::components::MAX_FLUTTER_LEVEL;
use crate::error::{SynthesisError, SynthesisResult};
use crate::filters::TILT_REFERENCE_FREQ;
use crate::math::round;
use crate::track::{Control, expand};
use crate::{AMPLITUDE_FLOOR_DB, MAX_FORMANTS};

/// Synthesis algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Variant {
    /// Klatt (1980) cascade/parallel formant synthesizer.
    #[default]
    Klsyn80,
    /// One cosine per formant track, scaled by the envelope.
    SineWave,
}

/// Excitation at the head of the voice source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlottalSourceType {
    #[default]
    Impulsive,
    /// KLGLOTT88 flow derivative, shaped by the open quotient `OQ`.
    Natural,
}

/// Parameters for the whole sound, none of them time-varying.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// sample rate in Hz
    pub sample_rate: usize,
    /// duration in seconds
    pub duration: f64,
    /// number of formants in the vocal tract model, 1 ..= 6
    pub formant_count: usize,
    pub variant: Variant,
    pub glottal_source: GlottalSourceType,
    /// render in blocks of this many samples instead of one block for the whole sound
    pub chunk_len: Option<usize>,
    /// return a silent waveform instead of failing when nothing was synthesized
    pub allow_silence: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sample_rate: 10_000,
            duration: 1.0,
            formant_count: 5,
            variant: Variant::Klsyn80,
            glottal_source: GlottalSourceType::Impulsive,
            chunk_len: None,
            allow_silence: false,
        }
    }
}

impl Settings {
    /// `round(FS * duration)`.
    // duration is validated to be positive before this is used for allocation
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub fn sample_count(&self) -> usize {
        round(self.sample_rate as f64 * self.duration) as usize
    }
}

/// The time-varying controls of one synthesis request.
///
/// Amplitudes are in dB, frequencies and bandwidths in Hz.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlTracks {
    /// fundamental frequency
    pub f0: Control,
    /// formant frequencies, one per formant
    pub ff: Vec<Control>,
    /// formant bandwidths, one per formant
    pub bw: Vec<Control>,
    /// amplitude of voicing
    pub av: Control,
    /// amplitude of quasi-sinusoidal voicing
    pub avs: Control,
    /// amplitude of aspiration (cascade branch)
    pub ah: Control,
    /// amplitude of frication (parallel branch)
    pub af: Control,
    /// voice routing: 0 = cascade branch, 1 = parallel branch
    pub sw: Control,
    /// glottal resonator 1 frequency
    pub fgp: Control,
    /// glottal resonator 1 bandwidth
    pub bgp: Control,
    /// glottal zero frequency
    pub fgz: Control,
    /// glottal zero bandwidth
    pub bgz: Control,
    /// glottal resonator 2 bandwidth
    pub bgs: Control,
    /// nasal pole frequency
    pub fnp: Control,
    /// nasal pole bandwidth
    pub bnp: Control,
    /// nasal zero frequency
    pub fnz: Control,
    /// nasal zero bandwidth
    pub bnz: Control,
    /// parallel formant amplitudes
    pub a1: Control,
    pub a2: Control,
    pub a3: Control,
    pub a4: Control,
    pub a5: Control,
    /// only used with six formants
    pub a6: Control,
    /// parallel nasal formant amplitude
    pub an: Control,
    /// F0 flutter level, 0 .. 1, typically 0.25
    pub fl: Control,
    /// spectral tilt of the voicing source, attenuation at 3 kHz in dB, 0 = no tilt
    pub tl: Control,
    /// open quotient of the natural glottal source, 0 .. 1
    pub oq: Control,
    /// amplitude envelope of the sine-wave variant, linear
    pub env: Control,
}

impl Default for ControlTracks {
    fn default() -> Self {
        ControlTracks::with_formants(
            &[500.0, 1500.0, 2500.0, 3500.0, 4500.0],
            &[50.0, 100.0, 100.0, 200.0, 250.0],
        )
    }
}

impl ControlTracks {
    /// Default controls with constant formants.
    #[must_use]
    pub fn with_formants(ff: &[f64], bw: &[f64]) -> Self {
        ControlTracks {
            f0: Control::Scalar(100.0),
            ff: ff.iter().map(|f| Control::Scalar(*f)).collect(),
            bw: bw.iter().map(|b| Control::Scalar(*b)).collect(),
            av: Control::Scalar(0.0),
            avs: Control::Scalar(0.0),
            ah: Control::Scalar(0.0),
            af: Control::Scalar(0.0),
            sw: Control::Scalar(0.0),
            fgp: Control::Scalar(0.0),
            bgp: Control::Scalar(100.0),
            fgz: Control::Scalar(1500.0),
            bgz: Control::Scalar(6000.0),
            bgs: Control::Scalar(200.0),
            fnp: Control::Scalar(250.0),
            bnp: Control::Scalar(100.0),
            fnz: Control::Scalar(250.0),
            bnz: Control::Scalar(100.0),
            a1: Control::Scalar(0.0),
            a2: Control::Scalar(0.0),
            a3: Control::Scalar(0.0),
            a4: Control::Scalar(0.0),
            a5: Control::Scalar(0.0),
            a6: Control::Scalar(0.0),
            an: Control::Scalar(0.0),
            fl: Control::Scalar(0.0),
            tl: Control::Scalar(0.0),
            oq: Control::Scalar(0.7),
            env: Control::Scalar(1.0),
        }
    }

    /// Default formants with every amplitude at the floor.
    #[must_use]
    pub fn silent() -> Self {
        let floor = Control::Scalar(AMPLITUDE_FLOOR_DB);
        ControlTracks {
            av: floor.clone(),
            avs: floor.clone(),
            ah: floor.clone(),
            af: floor.clone(),
            a1: floor.clone(),
            a2: floor.clone(),
            a3: floor.clone(),
            a4: floor.clone(),
            a5: floor.clone(),
            a6: floor.clone(),
            an: floor,
            ..ControlTracks::default()
        }
    }
}

/// Fully expanded, validated parameters of one synthesis run.
///
/// Every vector holds exactly `n_samp` samples. Created fresh per run and only read
/// afterwards, so the fields are reachable through accessors only.
#[derive(Debug, Clone)]
pub struct SynthesisParameters {
    pub(crate) sample_rate: usize,
    pub(crate) n_samp: usize,
    pub(crate) formant_count: usize,
    pub(crate) variant: Variant,
    pub(crate) glottal_source: GlottalSourceType,
    pub(crate) allow_silence: bool,
    pub(crate) f0: Vec<f64>,
    pub(crate) ff: Vec<Vec<f64>>,
    pub(crate) bw: Vec<Vec<f64>>,
    pub(crate) av: Vec<f64>,
    pub(crate) avs: Vec<f64>,
    pub(crate) ah: Vec<f64>,
    pub(crate) af: Vec<f64>,
    pub(crate) sw: Vec<f64>,
    pub(crate) fgp: Vec<f64>,
    pub(crate) bgp: Vec<f64>,
    pub(crate) fgz: Vec<f64>,
    pub(crate) bgz: Vec<f64>,
    pub(crate) bgs: Vec<f64>,
    pub(crate) fnp: Vec<f64>,
    pub(crate) bnp: Vec<f64>,
    pub(crate) fnz: Vec<f64>,
    pub(crate) bnz: Vec<f64>,
    /// `A1` ..= `A6`
    pub(crate) a: [Vec<f64>; MAX_FORMANTS],
    pub(crate) an: Vec<f64>,
    pub(crate) fl: Vec<f64>,
    pub(crate) tl: Vec<f64>,
    pub(crate) oq: Vec<f64>,
    pub(crate) env: Vec<f64>,
}

impl SynthesisParameters {
    /// Validates the settings and expands every control to `round(FS * duration)` samples.
    ///
    /// # Errors
    ///
    /// Any [`SynthesisError`] of kind configuration or interpolation domain, and
    /// [`SynthesisError::NonPositiveF0`].
    pub fn new(tracks: &ControlTracks, settings: &Settings) -> SynthesisResult<Self> {
        if settings.sample_rate == 0 {
            return Err(SynthesisError::InvalidSampleRate(settings.sample_rate));
        }
        if !settings.duration.is_finite() || settings.duration <= 0.0 {
            return Err(SynthesisError::InvalidDuration(settings.duration));
        }
        let n_samp = settings.sample_count();
        if n_samp == 0 {
            return Err(SynthesisError::InvalidDuration(settings.duration));
        }
        if settings.formant_count == 0 || settings.formant_count > MAX_FORMANTS {
            return Err(SynthesisError::InvalidFormantCount(settings.formant_count));
        }
        if settings.chunk_len == Some(0) {
            return Err(SynthesisError::InvalidChunkLength);
        }
        for (name, controls) in [("FF", &tracks.ff), ("BW", &tracks.bw)] {
            if controls.len() != settings.formant_count {
                return Err(SynthesisError::FormantCountMismatch {
                    name,
                    expected: settings.formant_count,
                    found: controls.len(),
                });
            }
        }

        let ex = |name: &str, control: &Control| expand_named(name, control, n_samp);
        let formants = |name: &str, controls: &[Control]| {
            controls
                .iter()
                .enumerate()
                .map(|(i, c)| ex(&format!("{name}{}", i + 1), c))
                .collect::<SynthesisResult<Vec<_>>>()
        };

        let params = SynthesisParameters {
            sample_rate: settings.sample_rate,
            n_samp,
            formant_count: settings.formant_count,
            variant: settings.variant,
            glottal_source: settings.glottal_source,
            allow_silence: settings.allow_silence,
            f0: ex("F0", &tracks.f0)?,
            ff: formants("FF", &tracks.ff[..])?,
            bw: formants("BW", &tracks.bw[..])?,
            av: ex("AV", &tracks.av)?,
            avs: ex("AVS", &tracks.avs)?,
            ah: ex("AH", &tracks.ah)?,
            af: ex("AF", &tracks.af)?,
            sw: ex("SW", &tracks.sw)?,
            fgp: ex("FGP", &tracks.fgp)?,
            bgp: ex("BGP", &tracks.bgp)?,
            fgz: ex("FGZ", &tracks.fgz)?,
            bgz: ex("BGZ", &tracks.bgz)?,
            bgs: ex("BGS", &tracks.bgs)?,
            fnp: ex("FNP", &tracks.fnp)?,
            bnp: ex("BNP", &tracks.bnp)?,
            fnz: ex("FNZ", &tracks.fnz)?,
            bnz: ex("BNZ", &tracks.bnz)?,
            a: [
                ex("A1", &tracks.a1)?,
                ex("A2", &tracks.a2)?,
                ex("A3", &tracks.a3)?,
                ex("A4", &tracks.a4)?,
                ex("A5", &tracks.a5)?,
                ex("A6", &tracks.a6)?,
            ],
            an: ex("AN", &tracks.an)?,
            fl: ex("FL", &tracks.fl)?,
            tl: ex("TL", &tracks.tl)?,
            oq: ex("OQ", &tracks.oq)?,
            env: ex("ENV", &tracks.env)?,
        };
        params.validate()?;

        tracing::debug!(
            n_samp,
            sample_rate = params.sample_rate,
            formant_count = params.formant_count,
            variant = ?params.variant,
            "expanded synthesis parameters"
        );
        Ok(params)
    }

    /// Sample period in seconds.
    #[must_use]
    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }

    #[must_use]
    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    /// Number of samples every control was expanded to.
    #[must_use]
    pub fn n_samp(&self) -> usize {
        self.n_samp
    }

    #[must_use]
    pub fn formant_count(&self) -> usize {
        self.formant_count
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub fn glottal_source(&self) -> GlottalSourceType {
        self.glottal_source
    }

    #[must_use]
    pub fn allow_silence(&self) -> bool {
        self.allow_silence
    }

    /// The expanded control called `name`, e.g. `"F0"`, `"FF2"`, `"A6"` or `"ENV"`.
    ///
    /// Formant frequencies and bandwidths beyond the formant count are `None`.
    #[must_use]
    pub fn control(&self, name: &str) -> Option<&[f64]> {
        let indexed = |prefix: &str| {
            name.strip_prefix(prefix)
                .and_then(|i| i.parse::<usize>().ok())
                .and_then(|i| i.checked_sub(1))
        };
        let values = match name {
            "F0" => &self.f0,
            "AV" => &self.av,
            "AVS" => &self.avs,
            "AH" => &self.ah,
            "AF" => &self.af,
            "SW" => &self.sw,
            "FGP" => &self.fgp,
            "BGP" => &self.bgp,
            "FGZ" => &self.fgz,
            "BGZ" => &self.bgz,
            "BGS" => &self.bgs,
            "FNP" => &self.fnp,
            "BNP" => &self.bnp,
            "FNZ" => &self.fnz,
            "BNZ" => &self.bnz,
            "AN" => &self.an,
            "FL" => &self.fl,
            "TL" => &self.tl,
            "OQ" => &self.oq,
            "ENV" => &self.env,
            _ => {
                if let Some(i) = indexed("FF") {
                    self.ff.get(i)?
                } else if let Some(i) = indexed("BW") {
                    self.bw.get(i)?
                } else {
                    self.a.get(indexed("A")?)?
                }
            }
        };
        Some(values.as_slice())
    }

    /// The glottal, nasal and formant frequency/bandwidth vectors with their names.
    fn frequency_vectors(&self) -> Vec<(String, &[f64])> {
        let mut v: Vec<(String, &[f64])> = vec![
            ("FGP".into(), self.fgp.as_slice()),
            ("BGP".into(), self.bgp.as_slice()),
            ("FGZ".into(), self.fgz.as_slice()),
            ("BGZ".into(), self.bgz.as_slice()),
            ("BGS".into(), self.bgs.as_slice()),
            ("FNP".into(), self.fnp.as_slice()),
            ("BNP".into(), self.bnp.as_slice()),
            ("FNZ".into(), self.fnz.as_slice()),
            ("BNZ".into(), self.bnz.as_slice()),
        ];
        for (i, (f, b)) in self.ff.iter().zip(&self.bw).enumerate() {
            v.push((format!("FF{}", i + 1), f.as_slice()));
            v.push((format!("BW{}", i + 1), b.as_slice()));
        }
        v
    }

    fn validate(&self) -> SynthesisResult<()> {
        if let Some((index, &value)) = self.f0.iter().enumerate().find(|(_, v)| **v <= 0.0) {
            return Err(SynthesisError::NonPositiveF0 { index, value });
        }

        let nyquist = self.sample_rate as f64 / 2.0;
        for (name, values) in self.frequency_vectors() {
            if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| **v < 0.0) {
                return Err(SynthesisError::invalid_param(
                    name,
                    format!("negative value {v} at sample {i}"),
                ));
            }
            if name.starts_with('F') && values.iter().any(|v| *v >= nyquist) {
                tracing::warn!(%name, nyquist, "frequency reaches the Nyquist frequency");
            }
        }

        if let Some((i, v)) = self.tl.iter().enumerate().find(|(_, v)| **v < 0.0) {
            return Err(SynthesisError::invalid_param(
                "TL",
                format!("negative tilt {v} dB at sample {i}"),
            ));
        }
        if let Some((i, v)) = self.tl.iter().enumerate().find(|(_, v)| **v >= -AMPLITUDE_FLOOR_DB) {
            return Err(SynthesisError::invalid_param(
                "TL",
                format!("tilt {v} dB at sample {i} mutes the voicing source, it must stay below {}", -AMPLITUDE_FLOOR_DB),
            ));
        }
        if self.tl.iter().any(|v| *v > 0.0) && TILT_REFERENCE_FREQ >= nyquist {
            return Err(SynthesisError::invalid_param(
                "TL",
                format!("spectral tilt needs a sample rate above {}", 2.0 * TILT_REFERENCE_FREQ),
            ));
        }
        // |sin + sin + sin| <= 3, so F0 * (1 - 3 * FL / 50) stays positive below this level
        if let Some((i, v)) = self.fl.iter().enumerate().find(|(_, v)| **v >= MAX_FLUTTER_LEVEL) {
            return Err(SynthesisError::invalid_param(
                "FL",
                format!("flutter level {v} at sample {i} can make F0 non-positive, it must stay below {MAX_FLUTTER_LEVEL}"),
            ));
        }
        if self.glottal_source == GlottalSourceType::Natural {
            if let Some((i, v)) = self.oq.iter().enumerate().find(|(_, v)| **v <= 0.0 || **v > 1.0) {
                return Err(SynthesisError::invalid_param(
                    "OQ",
                    format!("open quotient {v} at sample {i} is outside (0, 1]"),
                ));
            }
        }
        Ok(())
    }
}

/// Expands one control, tagging errors with the control's name and rejecting NaN/infinity.
fn expand_named(name: &str, control: &Control, n_samp: usize) -> SynthesisResult<Vec<f64>> {
    let values = expand(control, n_samp).map_err(|e| match e {
        SynthesisError::EmptyTrack(_) => SynthesisError::EmptyTrack(name.into()),
        other => other,
    })?;
    // the amplitude floor is the only infinite value with a meaning
    if let Some(index) = values.iter().position(|v| v.is_nan() || *v == f64::INFINITY) {
        return Err(SynthesisError::NonFiniteParameter {
            name: name.into(),
            index,
        });
    }
    Ok(values)
}
