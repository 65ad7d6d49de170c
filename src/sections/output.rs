use alloc::{vec, vec::Vec};

use super::{Block, Section};
use crate::components::{Mixer, Normalizer};
use crate::error::{SynthesisError, SynthesisResult};
use crate::params::SynthesisParameters;

/// Collects the final signal and normalizes it to a peak magnitude of 1 once all
/// blocks have been rendered.
///
/// All inputs are summed. A silent result is an error unless silence was allowed.
#[derive(Debug, Clone)]
pub struct Output {
    inputs: &'static [&'static str],
    allow_silence: bool,
    waveform: Vec<f64>,
    mixed: Vec<f64>,
}

impl Output {
    #[must_use]
    pub fn new(inputs: &'static [&'static str], params: &SynthesisParameters, block_len: usize) -> Self {
        Output {
            inputs,
            allow_silence: params.allow_silence,
            waveform: Vec::with_capacity(params.n_samp),
            mixed: vec![0.0; block_len],
        }
    }
}

impl Section for Output {
    fn name(&self) -> &'static str {
        "output"
    }

    fn inputs(&self) -> &'static [&'static str] {
        self.inputs
    }

    fn outputs(&self) -> &'static [&'static str] {
        &[]
    }

    fn reset(&mut self) {
        self.waveform.clear();
    }

    fn run(&mut self, block: &Block<'_>, inputs: &[Vec<f64>], _: &mut [Vec<f64>]) -> SynthesisResult<()> {
        let n = block.len;
        let sources: Vec<&[f64]> = inputs.iter().map(|v| &v[..n]).collect();
        Mixer::mix(&sources, &mut self.mixed[..n]);
        self.waveform.extend_from_slice(&self.mixed[..n]);
        Ok(())
    }

    fn finish(&mut self) -> SynthesisResult<Option<Vec<f64>>> {
        let mut waveform = core::mem::take(&mut self.waveform);
        if let Some(index) = waveform.iter().position(|v| !v.is_finite()) {
            return Err(SynthesisError::NonFiniteOutput { index });
        }
        match Normalizer::normalize(&mut waveform) {
            Some(peak) => tracing::debug!(peak, samples = waveform.len(), "normalized waveform"),
            None if self.allow_silence => tracing::debug!("waveform is silent"),
            None => return Err(SynthesisError::SilentOutput),
        }
        Ok(Some(waveform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ControlTracks, Settings};

    fn params(allow_silence: bool) -> SynthesisParameters {
        let settings = Settings {
            duration: 0.0008,
            allow_silence,
            ..Settings::default()
        };
        SynthesisParameters::new(&ControlTracks::default(), &settings).unwrap()
    }

    fn render(output: &mut Output, params: &SynthesisParameters, signal: &[f64]) {
        for start in (0..signal.len()).step_by(4) {
            let block = Block { params, start, len: 4 };
            let inputs = vec![signal[start..start + 4].to_vec()];
            output.run(&block, &inputs, &mut []).unwrap();
        }
    }

    #[test]
    fn normalizes_across_blocks() {
        let p = params(false);
        let mut output = Output::new(&["in"], &p, 4);
        render(&mut output, &p, &[0.0, 1.0, 2.0, -4.0, 0.5, 0.0, 0.0, 2.0]);
        let wave = output.finish().unwrap().unwrap();
        assert_eq!(wave, vec![0.0, 0.25, 0.5, -1.0, 0.125, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn rejects_non_finite_samples() {
        let p = params(true);
        let mut output = Output::new(&["in"], &p, 4);
        render(&mut output, &p, &[0.0, 1.0, 2.0, 3.0, 4.0, f64::INFINITY, 0.0, f64::NAN]);
        assert_eq!(output.finish(), Err(SynthesisError::NonFiniteOutput { index: 5 }));
    }

    #[test]
    fn silence_policy() {
        let p = params(false);
        let mut output = Output::new(&["in"], &p, 4);
        render(&mut output, &p, &[0.0; 8]);
        assert_eq!(output.finish(), Err(SynthesisError::SilentOutput));

        let p = params(true);
        let mut output = Output::new(&["in"], &p, 4);
        render(&mut output, &p, &[0.0; 8]);
        assert_eq!(output.finish(), Ok(Some(vec![0.0; 8])));
    }
}
