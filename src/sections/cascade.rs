use alloc::{vec, vec::Vec};

use super::{Block, Section};
use crate::components::{Amplifier, Mixer};
use crate::error::SynthesisResult;
use crate::filters::{AntiResonator, Resonator};
use crate::params::SynthesisParameters;
use crate::traits::Filter;

/// The cascade vocal tract: aspiration is added to the voice, then the sum runs through
/// the nasal pole, the nasal zero and one resonator per formant in series.
#[derive(Debug, Clone)]
pub struct Cascade {
    rnp: Resonator,
    rnz: AntiResonator,
    formants: Vec<Resonator>,
    aspiration: Vec<f64>,
    front: Vec<f64>,
    back: Vec<f64>,
}

impl Cascade {
    #[must_use]
    pub fn new(params: &SynthesisParameters, block_len: usize) -> Self {
        let sr = params.sample_rate;
        Cascade {
            rnp: Resonator::new(sr),
            rnz: AntiResonator::new(sr),
            formants: (0..params.formant_count).map(|_| Resonator::new(sr)).collect(),
            aspiration: vec![0.0; block_len],
            front: vec![0.0; block_len],
            back: vec![0.0; block_len],
        }
    }
}

impl Section for Cascade {
    fn name(&self) -> &'static str {
        "cascade"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["voice", "noise"]
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["cascade"]
    }

    fn reset(&mut self) {
        self.rnp.reset();
        self.rnz.reset();
        self.formants.iter_mut().for_each(Filter::reset);
    }

    fn run(&mut self, block: &Block<'_>, inputs: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
        let p = block.params;
        let n = block.len;

        Amplifier::amplify(&inputs[1][..n], block.slice(&p.ah), &mut self.aspiration[..n]);
        Mixer::mix(&[&inputs[0][..n], &self.aspiration[..n]], &mut self.front[..n]);
        self.rnp.resonate(
            &self.front[..n],
            block.slice(&p.fnp),
            block.slice(&p.bnp),
            &mut self.back[..n],
        );
        self.rnz.antiresonate(
            &self.back[..n],
            block.slice(&p.fnz),
            block.slice(&p.bnz),
            &mut self.front[..n],
        );

        // the signal is always in `front` between stages
        for (i, formant) in self.formants.iter_mut().enumerate() {
            formant.resonate(
                &self.front[..n],
                block.slice(&p.ff[i]),
                block.slice(&p.bw[i]),
                &mut self.back[..n],
            );
            core::mem::swap(&mut self.front, &mut self.back);
        }

        outputs[0][..n].copy_from_slice(&self.front[..n]);
        Ok(())
    }
}
