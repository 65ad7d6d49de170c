use alloc::{vec, vec::Vec};

use super::{Block, Section};
use crate::components::{
    Amplifier, Impulse, Mixer, NaturalGlottalSource, Switch, perform_frequency_modulation,
};
use crate::error::SynthesisResult;
use crate::filters::{AntiResonator, Resonator, TiltFilter};
use crate::params::{GlottalSourceType, SynthesisParameters};
use crate::traits::Filter;

#[derive(Debug, Clone)]
enum Excitation {
    Impulse(Impulse),
    Natural(NaturalGlottalSource),
}

/// The voicing source.
///
/// The excitation is shaped by the glottal resonator RGP (`FGP`, `BGP`), then split: the
/// glottal zero RGZ (`FGZ`, `BGZ`) scaled by `AV` gives normal voicing, a second glottal
/// resonator RGS (`FGP`, `BGS`) scaled by `AVS` gives quasi-sinusoidal voicing. Their sum
/// is tilted by `TL` and switched by `SW` onto the `cascade` or the `parallel` output.
#[derive(Debug, Clone)]
pub struct VoiceSource {
    sample_rate: usize,
    excitation: Excitation,
    rgp: Resonator,
    rgz: AntiResonator,
    rgs: Resonator,
    tilt: TiltFilter,
    f0: Vec<f64>,
    pulses: Vec<f64>,
    glottal: Vec<f64>,
    zeroed: Vec<f64>,
    voicing: Vec<f64>,
    quasi: Vec<f64>,
    mixed: Vec<f64>,
}

impl VoiceSource {
    #[must_use]
    pub fn new(params: &SynthesisParameters, block_len: usize) -> Self {
        let sr = params.sample_rate;
        let excitation = match params.glottal_source {
            GlottalSourceType::Impulsive => Excitation::Impulse(Impulse::new(sr)),
            GlottalSourceType::Natural => Excitation::Natural(NaturalGlottalSource::new(sr)),
        };
        VoiceSource {
            sample_rate: sr,
            excitation,
            rgp: Resonator::new(sr),
            rgz: AntiResonator::new(sr),
            rgs: Resonator::new(sr),
            tilt: TiltFilter::new(sr),
            f0: vec![0.0; block_len],
            pulses: vec![0.0; block_len],
            glottal: vec![0.0; block_len],
            zeroed: vec![0.0; block_len],
            voicing: vec![0.0; block_len],
            quasi: vec![0.0; block_len],
            mixed: vec![0.0; block_len],
        }
    }
}

impl Section for VoiceSource {
    fn name(&self) -> &'static str {
        "voice"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[]
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["cascade", "parallel"]
    }

    fn reset(&mut self) {
        match &mut self.excitation {
            Excitation::Impulse(imp) => imp.reset(),
            Excitation::Natural(nat) => nat.reset(),
        }
        self.rgp.reset();
        self.rgz.reset();
        self.rgs.reset();
        self.tilt.reset();
    }

    fn run(&mut self, block: &Block<'_>, _: &[Vec<f64>], outputs: &mut [Vec<f64>]) -> SynthesisResult<()> {
        let p = block.params;
        let n = block.len;
        let fs = self.sample_rate as f64;

        let f0 = &mut self.f0[..n];
        for (i, ((y, &f), &fl)) in f0
            .iter_mut()
            .zip(block.slice(&p.f0))
            .zip(block.slice(&p.fl))
            .enumerate()
        {
            *y = perform_frequency_modulation(f, fl, (block.start + i) as f64 / fs);
        }

        match &mut self.excitation {
            Excitation::Impulse(imp) => imp.generate(&self.f0[..n], &mut self.pulses[..n]),
            Excitation::Natural(nat) => {
                nat.generate(&self.f0[..n], block.slice(&p.oq), &mut self.pulses[..n]);
            }
        }

        self.rgp.resonate(
            &self.pulses[..n],
            block.slice(&p.fgp),
            block.slice(&p.bgp),
            &mut self.glottal[..n],
        );
        self.rgz.antiresonate(
            &self.glottal[..n],
            block.slice(&p.fgz),
            block.slice(&p.bgz),
            &mut self.zeroed[..n],
        );
        Amplifier::amplify(&self.zeroed[..n], block.slice(&p.av), &mut self.voicing[..n]);

        self.rgs.resonate(
            &self.glottal[..n],
            block.slice(&p.fgp),
            block.slice(&p.bgs),
            &mut self.zeroed[..n],
        );
        Amplifier::amplify(&self.zeroed[..n], block.slice(&p.avs), &mut self.quasi[..n]);

        Mixer::mix(&[&self.voicing[..n], &self.quasi[..n]], &mut self.mixed[..n]);
        self.tilt
            .tilt(&self.mixed[..n], block.slice(&p.tl), &mut self.zeroed[..n])?;

        let (cascade, parallel) = outputs.split_at_mut(1);
        Switch::route(
            &self.zeroed[..n],
            block.slice(&p.sw),
            &mut cascade[0][..n],
            &mut parallel[0][..n],
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ControlTracks, Settings};
    use crate::track::{Control, Track};

    fn render(sw: Control) -> Vec<Vec<f64>> {
        let tracks = ControlTracks {
            sw,
            ..ControlTracks::default()
        };
        let settings = Settings {
            duration: 0.02,
            ..Settings::default()
        };
        let p = SynthesisParameters::new(&tracks, &settings).unwrap();
        let mut voice = VoiceSource::new(&p, 200);
        let mut outputs = vec![vec![0.0; 200]; 2];
        let block = Block {
            params: &p,
            start: 0,
            len: 200,
        };
        voice.run(&block, &[], &mut outputs).unwrap();
        outputs
    }

    #[test]
    fn switch_selects_one_branch() {
        let out = render(Control::Scalar(0.0));
        assert!(out[0].iter().any(|v| *v != 0.0));
        assert!(out[1].iter().all(|v| *v == 0.0));

        let out = render(Control::Scalar(1.0));
        assert!(out[0].iter().all(|v| *v == 0.0));
        assert!(out[1].iter().any(|v| *v != 0.0));
    }

    #[test]
    fn switch_can_change_mid_sound() {
        let out = render(Track::new(vec![0.0, 1.0]).unwrap().into());
        assert!(out[0][..100].iter().any(|v| *v != 0.0));
        assert!(out[1][100..].iter().any(|v| *v != 0.0));
        for (c, p) in out[0].iter().zip(&out[1]) {
            assert!(*c == 0.0 || *p == 0.0);
        }
    }
}
