//! The stages of the synthesizer and the standard ways of wiring them.
//!
//! Each section owns its filters and their delay lines, so a section can be run on
//! consecutive blocks of any length and produce the same samples as a single run over
//! the whole sound.

use alloc::vec::Vec;

use rand::Rng;

use crate::error::SynthesisResult;
use crate::graph::{GraphBuilder, SynthesisGraph};
use crate::params::{SynthesisParameters, Variant};

mod cascade;
mod noise;
mod output;
mod parallel;
mod radiation;
mod sine;
mod voice;

pub use cascade::Cascade;
pub use noise::{NOISE_LEVEL_DB, NoiseSource};
pub use output::Output;
pub use parallel::Parallel;
pub use radiation::Radiation;
pub use sine::SineBank;
pub use voice::VoiceSource;

/// The slice of the sound a section is asked to render.
#[derive(Debug, Clone, Copy)]
pub struct Block<'p> {
    pub params: &'p SynthesisParameters,
    /// absolute index of the first sample
    pub start: usize,
    /// number of samples, never more than the graph's block length
    pub len: usize,
}

impl<'p> Block<'p> {
    /// The part of a per-sample parameter vector covered by this block.
    #[must_use]
    pub fn slice(&self, values: &'p [f64]) -> &'p [f64] {
        &values[self.start..self.start + self.len]
    }
}

/// A processing stage with named input and output sockets.
///
/// Input and output buffers are indexed in the order the socket names are listed and
/// hold at least `block.len` samples; only the first `block.len` are meaningful.
pub trait Section {
    fn name(&self) -> &'static str;
    fn inputs(&self) -> &'static [&'static str];
    fn outputs(&self) -> &'static [&'static str];

    /// Returns to the state before the first block: delay lines cleared, clocks and
    /// phases rewound, noise replayed from its initial generator state.
    fn reset(&mut self);

    /// Renders one block.
    ///
    /// # Errors
    ///
    /// Any numeric problem detected while rendering.
    fn run(
        &mut self,
        block: &Block<'_>,
        inputs: &[Vec<f64>],
        outputs: &mut [Vec<f64>],
    ) -> SynthesisResult<()>;

    /// Called once after the last block. A section that produces the final waveform
    /// returns it here.
    ///
    /// # Errors
    ///
    /// Any problem with the accumulated result.
    fn finish(&mut self) -> SynthesisResult<Option<Vec<f64>>> {
        Ok(None)
    }
}

impl<'a> SynthesisGraph<'a> {
    /// The graph for `params.variant`.
    ///
    /// The standard graphs remember the sample rate and formant count of `params` and
    /// refuse to render parameters of a different shape.
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::build`].
    pub fn for_parameters<R: Rng + Clone + 'a>(
        params: &SynthesisParameters,
        block_len: usize,
        rng: R,
    ) -> SynthesisResult<Self> {
        match params.variant {
            Variant::Klsyn80 => SynthesisGraph::klsyn80(params, block_len, rng),
            Variant::SineWave => SynthesisGraph::sine_wave(params, block_len),
        }
    }

    /// Klatt's cascade/parallel synthesizer:
    ///
    /// ```text
    /// voice ──cascade──> cascade ──┐
    ///   │                  ^       ├──> radiation ──> output
    ///   └──parallel──> parallel ───┘
    ///                     ^  ^
    /// noise ──────────────┴──┘ (both branches)
    /// ```
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::build`].
    pub fn klsyn80<R: Rng + Clone + 'a>(
        params: &SynthesisParameters,
        block_len: usize,
        rng: R,
    ) -> SynthesisResult<Self> {
        let mut g = GraphBuilder::new();
        let voice = g.add(VoiceSource::new(params, block_len));
        let noise = g.add(NoiseSource::new(rng, block_len));
        let cascade = g.add(Cascade::new(params, block_len));
        let parallel = g.add(Parallel::new(params, block_len));
        let radiation = g.add(Radiation::new(block_len));
        let output = g.add(Output::new(&["radiation"], params, block_len));

        g.connect(voice, "cascade", cascade, "voice")?;
        g.connect(noise, "noise", cascade, "noise")?;
        g.connect(voice, "parallel", parallel, "voice")?;
        g.connect(noise, "noise", parallel, "noise")?;
        g.connect(cascade, "cascade", radiation, "cascade")?;
        g.connect(parallel, "parallel", radiation, "parallel")?;
        g.connect(radiation, "radiation", output, "radiation")?;
        Ok(g.build(block_len)?.built_for(params))
    }

    /// A bank of cosines following the formant tracks, scaled by `ENV`.
    ///
    /// # Errors
    ///
    /// See [`GraphBuilder::build`].
    pub fn sine_wave(params: &SynthesisParameters, block_len: usize) -> SynthesisResult<Self> {
        let mut g = GraphBuilder::new();
        let sine = g.add(SineBank::new(params));
        let output = g.add(Output::new(&["sine"], params, block_len));
        g.connect(sine, "sine", output, "sine")?;
        Ok(g.build(block_len)?.built_for(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthesisError;
    use crate::params::{ControlTracks, GlottalSourceType, Settings};
    use crate::track::{Control, Track};
    use alloc::vec;
    use rand::{SeedableRng, rngs::SmallRng};

    #[test]
    fn klsyn80_evaluation_order() {
        let params =
            SynthesisParameters::new(&ControlTracks::default(), &Settings::default()).unwrap();
        let graph = SynthesisGraph::klsyn80(&params, 256, SmallRng::seed_from_u64(1)).unwrap();
        assert_eq!(
            graph.order(),
            vec!["voice", "noise", "cascade", "parallel", "radiation", "output"]
        );
        assert_eq!(graph.block_len(), 256);
    }

    #[test]
    fn sine_wave_evaluation_order() {
        let params =
            SynthesisParameters::new(&ControlTracks::default(), &Settings::default()).unwrap();
        let graph = SynthesisGraph::sine_wave(&params, 64).unwrap();
        assert_eq!(graph.order(), vec!["sine", "output"]);
    }

    fn noisy_vowel(settings: &Settings) -> SynthesisParameters {
        let tracks = ControlTracks {
            ah: Control::Scalar(-10.0),
            af: Control::Scalar(-10.0),
            fl: Control::Scalar(3.0),
            tl: Control::Scalar(6.0),
            sw: Track::new(vec![0.0, 1.0]).unwrap().into(),
            ..ControlTracks::default()
        };
        SynthesisParameters::new(&tracks, settings).unwrap()
    }

    #[test]
    fn rendering_twice_gives_the_same_sound() {
        let settings = Settings {
            duration: 0.1,
            glottal_source: GlottalSourceType::Natural,
            ..Settings::default()
        };
        let params = noisy_vowel(&settings);
        let mut graph = SynthesisGraph::klsyn80(&params, 128, SmallRng::seed_from_u64(5)).unwrap();
        let first = graph.render(&params).unwrap();
        let second = graph.render(&params).unwrap();
        assert_eq!(first.len(), 1000);
        assert_eq!(first, second);

        let params = SynthesisParameters::new(
            &ControlTracks::default(),
            &Settings {
                variant: Variant::SineWave,
                ..settings
            },
        )
        .unwrap();
        let mut graph = SynthesisGraph::sine_wave(&params, 300).unwrap();
        assert_eq!(graph.render(&params).unwrap(), graph.render(&params).unwrap());
    }

    #[test]
    fn refuses_parameters_of_another_shape() {
        let built = noisy_vowel(&Settings::default());
        let mut graph = SynthesisGraph::klsyn80(&built, 256, SmallRng::seed_from_u64(5)).unwrap();

        let fewer = SynthesisParameters::new(
            &ControlTracks::with_formants(&[500.0, 1500.0], &[50.0, 100.0]),
            &Settings {
                formant_count: 2,
                ..Settings::default()
            },
        )
        .unwrap();
        assert!(matches!(graph.render(&fewer), Err(SynthesisError::InvalidGraph(_))));

        let faster = noisy_vowel(&Settings {
            sample_rate: 16_000,
            ..Settings::default()
        });
        assert!(matches!(graph.render(&faster), Err(SynthesisError::InvalidGraph(_))));

        // a different length with the same shape is fine
        let shorter = noisy_vowel(&Settings {
            duration: 0.05,
            ..Settings::default()
        });
        assert_eq!(graph.render(&shorter).unwrap().len(), 500);
    }

    #[test]
    fn block_slices_parameters() {
        let params =
            SynthesisParameters::new(&ControlTracks::default(), &Settings::default()).unwrap();
        let block = Block {
            params: &params,
            start: 10,
            len: 5,
        };
        assert_eq!(block.slice(&params.f0).len(), 5);
    }
}
