use alloc::{vec, vec::Vec};

use super::{Block, Section};
use crate::components::Mixer;
use crate::error::SynthesisResult;
use crate::filters::FirstDifference;
use crate::traits::Filter;

/// Sums both branches and models lip radiation with a first difference.
#[derive(Debug, Clone)]
pub struct Radiation {
    first_diff: FirstDifference,
    mixed: Vec<f64>,
}

impl Radiation {
    #[must_use]
    pub fn new(block_len: usize) -> Self {
        Radiation {
            first_diff: FirstDifference::new(),
            mixed: vec![0.0; block_len],
        }
    }
}

impl Section for Radiation {
    fn name(&self) -> &'static str {
        "radiation"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["cascade", "parallel"]
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["radiation"]
    }

    fn reset(&mut self) {
        self.first_diff.reset();
    }

    fn run(&mut self, block: &Block<'_>, inputs: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
        let n = block.len;
        Mixer::mix(&[&inputs[0][..n], &inputs[1][..n]], &mut self.mixed[..n]);
        self.first_diff.differentiate(&self.mixed[..n], &mut outputs[0][..n]);
        Ok(())
    }
}
