//! Primitive signal-processing components: sources, gain, mixing and routing.
//!
//! The recursive filters live in the `filters` module.

use core::f64::consts::PI;

use rand::Rng;

use crate::math::{abs, cos, ln, pow, round, sin, sqrt};

/// dB values at or below this level are treated as silence.
pub const AMPLITUDE_FLOOR_DB: f64 = -99.0;

/// `SW` values at or above this level route the voice to the parallel branch.
pub const SWITCH_THRESHOLD: f64 = 0.5;

/// Convert a dB value into a linear value.
/// dB values of -99 and below or NaN are converted to 0.
#[must_use]
pub fn db_to_lin(db: f64) -> f64 {
    if db <= AMPLITUDE_FLOOR_DB || db.is_nan() {
        0.0
    } else {
        pow(10.0, db / 20.0)
    }
}

/// Flutter levels at or above this can drive the modulated F0 to zero or below.
pub const MAX_FLUTTER_LEVEL: f64 = 50.0 / 3.0;

/// Modulates the fundamental frequency (F0).
///
/// Sine-wave frequencies of 12.7, 7.1 and 4.7 Hz were chosen so as to ensure
/// a long period before repetition of the perturbation that is introduced.
/// A value of flutterLevel = 0.25 results in synthetic vowels with a quite
/// realistic deviation from constant pitch.
///
/// ### params
/// ```text
///    f0 = Fundamental frequency.
///    flutter_level = Flutter level between 0 and 1.
///    time = Relative signal position in seconds.
/// ```
/// ### returns
///    Modulated fundamental frequency.
#[must_use]
pub fn perform_frequency_modulation(f0: f64, flutter_level: f64, time: f64) -> f64 {
    if flutter_level <= 0.0 {
        return f0;
    }
    let w = 2.0 * PI * time;
    let a = sin(12.7 * w) + sin(7.1 * w) + sin(4.7 * w);

    f0 * (1.0 + a * flutter_level / 50.0)
}

//--- Glottal sources ----------------------------------------------------------

/// Counts samples between glottal pulses.
///
/// A pulse is due at absolute sample `n` when no pulse has happened yet, or when
/// `n - last_pulse_index >= round(FS / F0[n])`.
#[derive(Debug, Clone)]
struct PeriodClock {
    sample_rate: usize,
    /// absolute index of the next sample
    position: usize,
    /// absolute index of the most recent pulse
    last_pulse_index: Option<usize>,
}
impl PeriodClock {
    fn new(sample_rate: usize) -> Self {
        PeriodClock {
            sample_rate,
            position: 0,
            last_pulse_index: None,
        }
    }

    fn reset(&mut self) {
        self.position = 0;
        self.last_pulse_index = None;
    }

    /// Advances one sample. Returns the period length in samples if a pulse starts here.
    // F0 is validated to be positive, so the period is never negative.
    #[allow(clippy::cast_sign_loss)]
    fn tick(&mut self, f0: f64) -> Option<usize> {
        let n = self.position;
        self.position += 1;
        let period = round(self.sample_rate as f64 / f0) as usize;
        let due = match self.last_pulse_index {
            None => true,
            Some(last) => n - last >= period,
        };
        if due {
            self.last_pulse_index = Some(n);
            Some(period)
        } else {
            None
        }
    }
}

/// Time-varying impulse train, the classic Klatt voicing excitation.
#[derive(Debug, Clone)]
pub struct Impulse {
    clock: PeriodClock,
}
impl Impulse {
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        Impulse {
            clock: PeriodClock::new(sample_rate),
        }
    }

    /// Rewinds to sample 0, so the next sample starts a period.
    pub fn reset(&mut self) {
        self.clock.reset();
    }

    /// Writes `1.0` where a glottal period starts and `0.0` elsewhere.
    pub fn generate(&mut self, f0: &[f64], output: &mut [f64]) {
        for (y, &f) in output.iter_mut().zip(f0) {
            *y = if self.clock.tick(f).is_some() { 1.0 } else { 0.0 };
        }
    }
}

/// Generates a "natural" glottal source signal according to the KLGLOTT88 model.
/// Formula of the glottal flow: `t^2 - t^3`
/// Formula of the derivative: `2 * t - 3 * t^2`
/// The derivative is used as the glottal source.
///
/// At the end of the open glottal phase there is an abrupt jump from the minimum value to zero.
/// This jump is not smoothed in the classic Klatt model.
#[derive(Debug, Clone)]
pub struct NaturalGlottalSource {
    clock: PeriodClock,
    /// current signal value
    x: f64,
    /// current first derivative
    a: f64,
    /// current second derivative
    b: f64,
    /// open glottis phase length in samples
    open_phase_length: usize,
    /// current sample position within F0 period
    position_in_period: usize,
}
impl NaturalGlottalSource {
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        NaturalGlottalSource {
            clock: PeriodClock::new(sample_rate),
            x: 0.0,
            a: 0.0,
            b: 0.0,
            open_phase_length: 0,
            position_in_period: 0,
        }
    }

    pub fn reset(&mut self) {
        self.clock.reset();
        self.x = 0.0;
        self.a = 0.0;
        self.b = 0.0;
        self.open_phase_length = 0;
        self.position_in_period = 0;
    }

    /// ### params
    /// ```text
    ///    open_phase_length = Duration of the open glottis phase of the F0 period, in samples.
    /// ```
    fn start_period(&mut self, open_phase_length: usize) {
        self.open_phase_length = open_phase_length;
        self.x = 0.0;
        self.position_in_period = 0;
        if open_phase_length == 0 {
            self.a = 0.0;
            self.b = 0.0;
            return;
        }
        let amplification = 5.0;
        self.b = -amplification / pow(open_phase_length as f64, 2.0);
        self.a = -self.b * open_phase_length as f64 / 3.0;
    }

    fn get_next(&mut self) -> f64 {
        self.position_in_period += 1;
        if self.position_in_period >= self.open_phase_length {
            self.x = 0.0;
            return 0.0;
        }
        self.a += self.b;
        self.x += self.a;
        self.x
    }

    /// Generates the glottal flow derivative; `oq` is the open quotient of each period.
    // oq is validated to lie in (0, 1]
    #[allow(clippy::cast_sign_loss)]
    pub fn generate(&mut self, f0: &[f64], oq: &[f64], output: &mut [f64]) {
        for ((y, &f), &q) in output.iter_mut().zip(f0).zip(oq) {
            if let Some(period) = self.clock.tick(f) {
                let open = if period > 1 {
                    round(period as f64 * q) as usize
                } else {
                    0
                };
                self.start_period(open);
            }
            *y = self.get_next();
        }
    }
}

//--- Noise --------------------------------------------------------------------

/// Zero-mean, unit-variance Gaussian noise (Box-Muller).
///
/// Keeps a copy of the generator it was created with, so [`NoiseGenerator::reset`]
/// replays the same sequence.
#[derive(Debug, Clone)]
pub struct NoiseGenerator<R> {
    initial: R,
    rng: R,
    /// second value of the last Box-Muller pair
    spare: Option<f64>,
}
impl<R: Rng + Clone> NoiseGenerator<R> {
    pub fn new(rng: R) -> Self {
        NoiseGenerator {
            initial: rng.clone(),
            rng,
            spare: None,
        }
    }

    pub fn reset(&mut self) {
        self.rng = self.initial.clone();
        self.spare = None;
    }

    pub fn next_sample(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        let mut u1: f64 = self.rng.random();
        while u1 <= 0.0 {
            u1 = self.rng.random();
        }
        let u2: f64 = self.rng.random();
        let r = sqrt(-2.0 * ln(u1));
        let theta = 2.0 * PI * u2;
        self.spare = Some(r * sin(theta));
        r * cos(theta)
    }

    pub fn generate(&mut self, output: &mut [f64]) {
        for y in output.iter_mut() {
            *y = self.next_sample();
        }
    }
}

//--- Gain, mixing, routing ----------------------------------------------------

/// Scales a signal by a per-sample gain in dB.
#[derive(Debug, Clone, Copy, Default)]
pub struct Amplifier;
impl Amplifier {
    /// `y[n] = x[n] * 10^(dB[n] / 20)`, with the amplitude floor applied.
    pub fn amplify(input: &[f64], db: &[f64], output: &mut [f64]) {
        for ((y, &x), &g) in output.iter_mut().zip(input).zip(db) {
            *y = x * db_to_lin(g);
        }
    }
}

/// Sums any number of signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mixer;
impl Mixer {
    pub fn mix(inputs: &[&[f64]], output: &mut [f64]) {
        output.fill(0.0);
        for input in inputs {
            Mixer::accumulate(input, output);
        }
    }

    /// Adds `input` onto `output` in place.
    pub fn accumulate(input: &[f64], output: &mut [f64]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y += x;
        }
    }
}

/// Scales a buffer so that its peak magnitude is 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;
impl Normalizer {
    /// Returns the peak the buffer was divided by, or `None` for an all-zero buffer,
    /// which is left untouched.
    pub fn normalize(buf: &mut [f64]) -> Option<f64> {
        let peak = buf
            .iter()
            .map(|v| abs(*v))
            .fold(0.0, |m, v| if v > m { v } else { m });
        if peak <= 0.0 {
            return None;
        }
        for v in buf.iter_mut() {
            *v /= peak;
        }
        Some(peak)
    }
}

/// Routes a signal to exactly one of two outputs per sample; the other receives silence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Switch;
impl Switch {
    /// `sw[n] < 0.5` selects `first`, otherwise `second`.
    pub fn route(input: &[f64], sw: &[f64], first: &mut [f64], second: &mut [f64]) {
        for (((&x, &s), a), b) in input.iter().zip(sw).zip(first.iter_mut()).zip(second.iter_mut()) {
            if s >= SWITCH_THRESHOLD {
                *a = 0.0;
                *b = x;
            } else {
                *a = x;
                *b = 0.0;
            }
        }
    }
}
