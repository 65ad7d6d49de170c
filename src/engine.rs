//! One-call synthesis from control tracks to a normalized waveform.

use alloc::vec::Vec;

use rand::Rng;

use crate::error::SynthesisResult;
use crate::graph::SynthesisGraph;
use crate::params::{ControlTracks, Settings, SynthesisParameters};

/// Renders sounds with fixed settings.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    settings: Settings,
}

impl Engine {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Engine { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Expands `tracks`, builds the graph for the configured variant and renders it.
    ///
    /// Without a chunk length the whole sound is rendered as one block. The result holds
    /// `round(FS * duration)` samples with a peak magnitude of 1, or all zeros when silence
    /// is allowed and nothing was synthesized.
    ///
    /// # Errors
    ///
    /// Any [`crate::SynthesisError`]; no partial waveform is returned.
    pub fn synthesize<R: Rng + Clone>(&self, tracks: &ControlTracks, rng: R) -> SynthesisResult<Vec<f64>> {
        let params = SynthesisParameters::new(tracks, &self.settings)?;
        let block_len = self
            .settings
            .chunk_len
            .map_or(params.n_samp, |c| c.min(params.n_samp));
        let mut graph = SynthesisGraph::for_parameters(&params, block_len, rng)?;
        graph.render(&params)
    }
}

/// Synthesizes one sound. See [`Engine::synthesize`].
///
/// # Errors
///
/// Any [`crate::SynthesisError`].
pub fn synthesize<R: Rng + Clone>(
    tracks: &ControlTracks,
    settings: &Settings,
    rng: R,
) -> SynthesisResult<Vec<f64>> {
    Engine::new(settings.clone()).synthesize(tracks, rng)
}
