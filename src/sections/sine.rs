use alloc::{vec, vec::Vec};
use core::f64::consts::TAU;

use super::{Block, Section};
use crate::error::SynthesisResult;
use crate::math::cos;
use crate::params::SynthesisParameters;

/// Sine-wave speech: one cosine per formant, following the formant frequency tracks,
/// summed and scaled by the linear envelope `ENV`.
///
/// Phases accumulate across blocks and are kept in `[0, 2π)`.
#[derive(Debug, Clone)]
pub struct SineBank {
    sample_rate: usize,
    phases: Vec<f64>,
}

impl SineBank {
    #[must_use]
    pub fn new(params: &SynthesisParameters) -> Self {
        SineBank {
            sample_rate: params.sample_rate,
            phases: vec![0.0; params.formant_count],
        }
    }
}

impl Section for SineBank {
    fn name(&self) -> &'static str {
        "sine"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[]
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["sine"]
    }

    fn reset(&mut self) {
        self.phases.fill(0.0);
    }

    fn run(&mut self, block: &Block<'_>, _: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
        let p = block.params;
        let fs = self.sample_rate as f64;
        let env = block.slice(&p.env);
        let ff: Vec<&[f64]> = p.ff.iter().map(|f| block.slice(f)).collect();
        for (i, y) in outputs[0][..block.len].iter_mut().enumerate() {
            let mut sum = 0.0;
            for (phase, f) in self.phases.iter_mut().zip(&ff) {
                *phase = (*phase + TAU * f[i] / fs) % TAU;
                sum += cos(*phase);
            }
            *y = sum * env[i];
        }
        Ok(())
    }
}
