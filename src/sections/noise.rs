use alloc::{vec, vec::Vec};

use rand::Rng;

use super::{Block, Section};
use crate::components::{Amplifier, NoiseGenerator};
use crate::error::SynthesisResult;
use crate::filters::Lowpass;
use crate::traits::Filter;

/// Fixed level of the noise source relative to the voicing source, in dB.
///
/// The branch amplitudes `AH` and `AF` are applied on top of this.
pub const NOISE_LEVEL_DB: f64 = -60.0;

/// Gaussian noise, lowpass filtered and set to a fixed level.
#[derive(Debug, Clone)]
pub struct NoiseSource<R> {
    noise: NoiseGenerator<R>,
    lowpass: Lowpass,
    level: Vec<f64>,
    raw: Vec<f64>,
    filtered: Vec<f64>,
}

impl<R: Rng + Clone> NoiseSource<R> {
    pub fn new(rng: R, block_len: usize) -> Self {
        NoiseSource {
            noise: NoiseGenerator::new(rng),
            lowpass: Lowpass::new(),
            level: vec![NOISE_LEVEL_DB; block_len],
            raw: vec![0.0; block_len],
            filtered: vec![0.0; block_len],
        }
    }
}

impl<R: Rng + Clone> Section for NoiseSource<R> {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[]
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["noise"]
    }

    fn reset(&mut self) {
        self.noise.reset();
        self.lowpass.reset();
    }

    fn run(&mut self, block: &Block<'_>, _: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
        let n = block.len;
        self.noise.generate(&mut self.raw[..n]);
        self.lowpass.filter(&self.raw[..n], &mut self.filtered[..n]);
        Amplifier::amplify(&self.filtered[..n], &self.level[..n], &mut outputs[0][..n]);
        Ok(())
    }
}
