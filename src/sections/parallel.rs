use alloc::{vec, vec::Vec};

use super::{Block, Section};
use crate::components::{Amplifier, Mixer};
use crate::error::SynthesisResult;
use crate::filters::{FirstDifference, Resonator};
use crate::params::SynthesisParameters;
use crate::traits::Filter;

/// The parallel vocal tract.
///
/// Frication is scaled by `AF`. Each formant resonator is driven through its own
/// amplifier and the resonator outputs are summed:
///
/// - F1 (`A1`) gets the raw voice,
/// - the nasal formant (`AN`) and F2 to F4 (`A2` to `A4`) get the first-differenced
///   voice plus frication,
/// - F5 and F6 (`A5`, `A6`) get frication only.
#[derive(Debug, Clone)]
pub struct Parallel {
    first_diff: FirstDifference,
    rnp: Resonator,
    formants: Vec<Resonator>,
    frication: Vec<f64>,
    differenced: Vec<f64>,
    mixed: Vec<f64>,
    gained: Vec<f64>,
    resonated: Vec<f64>,
}

impl Parallel {
    #[must_use]
    pub fn new(params: &SynthesisParameters, block_len: usize) -> Self {
        let sr = params.sample_rate;
        Parallel {
            first_diff: FirstDifference::new(),
            rnp: Resonator::new(sr),
            formants: (0..params.formant_count).map(|_| Resonator::new(sr)).collect(),
            frication: vec![0.0; block_len],
            differenced: vec![0.0; block_len],
            mixed: vec![0.0; block_len],
            gained: vec![0.0; block_len],
            resonated: vec![0.0; block_len],
        }
    }
}

impl Section for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["voice", "noise"]
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["parallel"]
    }

    fn reset(&mut self) {
        self.first_diff.reset();
        self.rnp.reset();
        self.formants.iter_mut().for_each(Filter::reset);
    }

    fn run(&mut self, block: &Block<'_>, inputs: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
        let p = block.params;
        let n = block.len;
        let voice = &inputs[0][..n];
        let out = &mut outputs[0][..n];

        Amplifier::amplify(&inputs[1][..n], block.slice(&p.af), &mut self.frication[..n]);
        self.first_diff.differentiate(voice, &mut self.differenced[..n]);
        Mixer::mix(&[&self.differenced[..n], &self.frication[..n]], &mut self.mixed[..n]);

        out.fill(0.0);
        for (i, formant) in self.formants.iter_mut().enumerate() {
            let drive: &[f64] = match i {
                0 => voice,
                1..=3 => &self.mixed[..n],
                _ => &self.frication[..n],
            };
            Amplifier::amplify(drive, block.slice(&p.a[i]), &mut self.gained[..n]);
            formant.resonate(
                &self.gained[..n],
                block.slice(&p.ff[i]),
                block.slice(&p.bw[i]),
                &mut self.resonated[..n],
            );
            Mixer::accumulate(&self.resonated[..n], out);
        }

        Amplifier::amplify(&self.mixed[..n], block.slice(&p.an), &mut self.gained[..n]);
        self.rnp.resonate(
            &self.gained[..n],
            block.slice(&p.fnp),
            block.slice(&p.bnp),
            &mut self.resonated[..n],
        );
        Mixer::accumulate(&self.resonated[..n], out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AMPLITUDE_FLOOR_DB;
    use crate::params::{ControlTracks, Settings};
    use crate::track::Control;

    /// Renders one block of frication through a parallel branch where only `A6` is open.
    fn sixth_formant_energy(formant_count: usize) -> f64 {
        let freqs = [500.0, 1500.0, 2500.0, 3500.0, 4000.0, 4500.0];
        let bws = [50.0, 100.0, 100.0, 200.0, 250.0, 300.0];
        let tracks = ControlTracks {
            ff: freqs[..formant_count].iter().map(|f| Control::Scalar(*f)).collect(),
            bw: bws[..formant_count].iter().map(|b| Control::Scalar(*b)).collect(),
            af: Control::Scalar(0.0),
            a6: Control::Scalar(0.0),
            ..ControlTracks::silent()
        };
        let settings = Settings {
            formant_count,
            duration: 0.01,
            ..Settings::default()
        };
        let p = SynthesisParameters::new(&tracks, &settings).unwrap();
        assert_eq!(p.an[0], AMPLITUDE_FLOOR_DB);

        let mut parallel = Parallel::new(&p, 100);
        let block = Block {
            params: &p,
            start: 0,
            len: 100,
        };
        let mut noise = vec![0.0; 100];
        noise[0] = 1.0;
        let inputs = vec![vec![0.0; 100], noise];
        let mut outputs = vec![vec![0.0; 100]];
        parallel.run(&block, &inputs, &mut outputs).unwrap();
        outputs[0].iter().map(|v| v * v).sum()
    }

    #[test]
    fn sixth_formant_only_with_six_formants() {
        assert_eq!(sixth_formant_energy(5), 0.0);
        assert!(sixth_formant_energy(6) > 0.0);
    }
}
