//! Filters with per-sample coefficients.
//!
//! Every filter keeps its own delay memory between calls, so a signal may be processed
//! in one piece or in consecutive blocks with identical results.

use alloc::{vec, vec::Vec};
use core::f64::consts::PI;

use crate::components::db_to_lin;
use crate::error::{SynthesisError, SynthesisResult};
use crate::math::{cos, exp, pow, sqrt};
use crate::traits::{BasicFilter, Filter};

/// Klatt resonator coefficients `(a, b, c)` for a centre frequency `f` and bandwidth `bw`
/// in Hz, with sample period `dt` in seconds.
#[must_use]
pub fn resonator_coefficients(f: f64, bw: f64, dt: f64) -> (f64, f64, f64) {
    let c = -exp(-2.0 * PI * bw * dt);
    let b = 2.0 * exp(-PI * bw * dt) * cos(2.0 * PI * f * dt);
    let a = 1.0 - b - c;
    (a, b, c)
}

/// A Klatt resonator.
/// This is a second order IIR filter.
/// With f=0 it can also be used as a low-pass filter.
///
/// # Formulas:
/// ## Variables:
/// ```text
///    x = input samples
///    y = output samples
///    a/b/c = filter coefficients
///    f = resonator frequency in Hz
///    bw = bandwidth in Hz
///    dt = 1 / sampleRate
/// ```
/// ## Coefficients:
/// ```text
///    c = -exp(-2 * PI * bw * dt)
///    b = 2 * exp(-PI * bw * dt) * cos(2 * PI * f * dt)
///    a = 1 - b - c
/// ```
/// ## Filter function:
/// ```text
///    y[n] = a * x[n] + b * y[n-1] + c * y[n-2]
/// ```
/// ## Poles:
/// ```text
///    r = exp(-PI * bw * dt),  angle = 2 * PI * f * dt
/// ```
/// The DC gain is `a / (1 - b - c) = 1`.
#[derive(Debug, Clone)]
pub struct Resonator {
    /// sample period in seconds
    dt: f64,
    /// filter coefficient a
    a: f64,
    /// filter coefficient b
    b: f64,
    /// filter coefficient c
    c: f64,
    /// y[n-1], last output value
    y1: f64,
    /// y[n-2], second-last output value
    y2: f64,
}
impl Resonator {
    /// ### params
    /// ```text
    /// sample_rate = Sample rate in Hz.
    /// ```
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        Resonator {
            dt: 1.0 / sample_rate as f64,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Adjusts the filter coefficients without resetting the inner state.
    /// ### params
    /// ```text
    /// f = Frequency of resonator in Hz. May be 0 for LP filtering.
    /// bw = Bandwidth of resonator in Hz.
    /// ```
    pub fn set(&mut self, f: f64, bw: f64) {
        (self.a, self.b, self.c) = resonator_coefficients(f, bw, self.dt);
    }

    /// Filters a block, recomputing the coefficients at every sample from `ff` and `bw`.
    pub fn resonate(&mut self, input: &[f64], ff: &[f64], bw: &[f64], output: &mut [f64]) {
        for (((y, &x), &f), &b) in output.iter_mut().zip(input).zip(ff).zip(bw) {
            self.set(f, b);
            *y = self.step(x);
        }
    }
}
impl Filter for Resonator {
    fn reset(&mut self) {
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
impl BasicFilter for Resonator {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        vec![vec![self.a], vec![1.0, -self.b, -self.c]]
    }

    fn step(&mut self, x: f64) -> f64 {
        let y = self.a * x + self.b * self.y1 + self.c * self.y2;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

/// A Klatt anti-resonator.
/// This is a second order FIR filter, the inverse of a [`Resonator`] with the same
/// frequency and bandwidth.
///
/// # Formulas:
/// ```text
///    a' = 1 / a,  b' = -b / a,  c' = -c / a      (a, b, c as for the resonator)
///    y[n] = a' * x[n] + b' * x[n-1] + c' * x[n-2]
/// ```
/// The recursion runs on delayed *input*, which is what turns the pole pair into a zero pair.
#[derive(Debug, Clone)]
pub struct AntiResonator {
    dt: f64,
    /// filter coefficient a'
    a: f64,
    /// filter coefficient b'
    b: f64,
    /// filter coefficient c'
    c: f64,
    /// x[n-1], last input value
    x1: f64,
    /// x[n-2], second-last input value
    x2: f64,
}
impl AntiResonator {
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        AntiResonator {
            dt: 1.0 / sample_rate as f64,
            a: 1.0,
            b: 0.0,
            c: 0.0,
            x1: 0.0,
            x2: 0.0,
        }
    }

    /// Adjusts the filter coefficients without resetting the inner state.
    /// A zero pair at DC (`f = 0`, `bw = 0`) has no finite inverse and mutes the filter.
    // exact zero is the only value without an inverse
    #[allow(clippy::float_cmp)]
    pub fn set(&mut self, f: f64, bw: f64) {
        let (a0, b0, c0) = resonator_coefficients(f, bw, self.dt);
        if a0 == 0.0 {
            self.a = 0.0;
            self.b = 0.0;
            self.c = 0.0;
            return;
        }
        self.a = 1.0 / a0;
        self.b = -b0 / a0;
        self.c = -c0 / a0;
    }

    /// Filters a block, recomputing the coefficients at every sample from `ff` and `bw`.
    pub fn antiresonate(&mut self, input: &[f64], ff: &[f64], bw: &[f64], output: &mut [f64]) {
        for (((y, &x), &f), &b) in output.iter_mut().zip(input).zip(ff).zip(bw) {
            self.set(f, b);
            *y = self.step(x);
        }
    }
}
impl Filter for AntiResonator {
    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
    }
}
impl BasicFilter for AntiResonator {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        vec![vec![self.a, self.b, self.c], vec![1.0]]
    }

    fn step(&mut self, x: f64) -> f64 {
        let y = self.a * x + self.b * self.x1 + self.c * self.x2;
        self.x2 = self.x1;
        self.x1 = x;
        y
    }
}

/// A differencing filter, used for the radiation characteristic and for the
/// spectral tilt correction of the parallel branch.
/// This is a first-order FIR HP filter.
///
/// # Formulas:
/// ```text
///    y[n] = x[n] - x[n-1]
///    H(w) = 1 - e^(-jw)
///    |H(w)| = sqrt(2 - 2 * cos(w))
/// ```
#[derive(Debug, Clone, Default)]
pub struct FirstDifference {
    /// x[n-1], last input value
    x1: f64,
}
impl FirstDifference {
    #[must_use]
    pub fn new() -> Self {
        FirstDifference { x1: 0.0 }
    }

    pub fn differentiate(&mut self, input: &[f64], output: &mut [f64]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y = self.step(x);
        }
    }
}
impl Filter for FirstDifference {
    fn reset(&mut self) {
        self.x1 = 0.0;
    }
}
impl BasicFilter for FirstDifference {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        vec![vec![1.0, -1.0], vec![1.0]]
    }

    fn step(&mut self, x: f64) -> f64 {
        let y = x - self.x1;
        self.x1 = x;
        y
    }
}

/// A one-pole accumulating low-pass, 6 dB/octave.
///
/// ```text
///    y[n] = x[n] + y[n-1]
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lowpass {
    /// y[n-1], last output value
    y1: f64,
}
impl Lowpass {
    #[must_use]
    pub fn new() -> Self {
        Lowpass { y1: 0.0 }
    }

    pub fn filter(&mut self, input: &[f64], output: &mut [f64]) {
        for (y, &x) in output.iter_mut().zip(input) {
            *y = self.step(x);
        }
    }
}
impl Filter for Lowpass {
    fn reset(&mut self) {
        self.y1 = 0.0;
    }
}
impl BasicFilter for Lowpass {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        vec![vec![1.0], vec![1.0, -1.0]]
    }

    fn step(&mut self, x: f64) -> f64 {
        let y = x + self.y1;
        self.y1 = y;
        y
    }
}

/// Frequency at which the spectral tilt attenuation is specified.
pub const TILT_REFERENCE_FREQ: f64 = 3000.0;

/// A first-order IIR LP filter, used to tilt the glottal spectrum.
///
/// # Formulas:
/// ## Variables:
/// ```text
///    x = input samples
///    y = output samples
///    a = first filter coefficient
///    b = second filter coefficient, >0 for LP filter
///    f = frequency in Hz
///    w = 2 * PI * f / sampleRate
///    g = gain at frequency f
/// ```
/// ## Filter function:
/// ```text
///    y[n] = a * x[n] + b * y[n-1]
/// ```
/// ## Determine b for a given gain g at frequency f and |H(0)| = 1:
/// ```text
///    a = 1 - b
///    q = (1 - g^2 * cos(w)) / (1 - g^2)
///    b = q - sqrt(q^2 - 1)
/// ```
#[derive(Debug, Clone)]
pub struct TiltFilter {
    sample_rate: usize,
    /// filter coefficient a
    a: f64,
    /// filter coefficient b
    b: f64,
    /// y[n-1], last output value
    y1: f64,
    /// tilt the current coefficients were derived from
    tilt_db: f64,
}
impl TiltFilter {
    #[must_use]
    pub fn new(sample_rate: usize) -> Self {
        TiltFilter {
            sample_rate,
            a: 1.0,
            b: 0.0,
            y1: 0.0,
            tilt_db: 0.0,
        }
    }

    /// Adjusts the filter parameters without resetting the inner state.
    /// ### params
    /// ```text
    ///    f = Frequency at which the gain is specified.
    ///    g = Gain at frequency f. Between 0 and 1 for LP filter.
    /// ```
    ///
    /// # Errors
    ///
    /// [`SynthesisError::InvalidParameter`] if `f` is not below the Nyquist frequency or
    /// `g` is outside `(0, 1)`.
    pub fn set(&mut self, f: f64, g: f64) -> SynthesisResult<()> {
        if f <= 0.0
            || f >= self.sample_rate as f64 / 2.0
            || g <= 0.0
            || g >= 1.0
            || f.is_infinite()
        {
            return Err(SynthesisError::invalid_param(
                "TL",
                "tilt filter needs 0 < g < 1 and a reference frequency below Nyquist",
            ));
        }
        let w = 2.0 * PI * f / (self.sample_rate as f64);
        let q = (1.0 - pow(g, 2.0) * cos(w)) / (1.0 - pow(g, 2.0));
        self.b = q - sqrt(pow(q, 2.0) - 1.0);
        self.a = 1.0 - self.b;
        Ok(())
    }

    /// Sets the attenuation at 3 kHz in dB. Zero makes the filter an identity.
    ///
    /// # Errors
    ///
    /// See [`TiltFilter::set`].
    // the cached value is compared exactly, it is only a shortcut
    #[allow(clippy::float_cmp)]
    pub fn set_tilt(&mut self, tilt_db: f64) -> SynthesisResult<()> {
        if tilt_db == self.tilt_db {
            return Ok(());
        }
        if tilt_db == 0.0 {
            self.a = 1.0;
            self.b = 0.0;
        } else {
            self.set(TILT_REFERENCE_FREQ, db_to_lin(-tilt_db))?;
        }
        self.tilt_db = tilt_db;
        Ok(())
    }

    /// Filters a block with a per-sample tilt in dB.
    ///
    /// # Errors
    ///
    /// See [`TiltFilter::set`].
    pub fn tilt(&mut self, input: &[f64], tilt_db: &[f64], output: &mut [f64]) -> SynthesisResult<()> {
        for ((y, &x), &t) in output.iter_mut().zip(input).zip(tilt_db) {
            self.set_tilt(t)?;
            *y = self.step(x);
        }
        Ok(())
    }
}
impl Filter for TiltFilter {
    fn reset(&mut self) {
        self.y1 = 0.0;
    }
}
impl BasicFilter for TiltFilter {
    fn get_transfer_function_coefficients(&self) -> Vec<Vec<f64>> {
        vec![vec![self.a], vec![1.0, -self.b]]
    }

    fn step(&mut self, x: f64) -> f64 {
        let y = self.a * x + self.b * self.y1;
        self.y1 = y;
        y
    }
}
