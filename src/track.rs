//! Control tracks and their expansion to per-sample parameter vectors.

use alloc::{string::String, vec, vec::Vec};

use crate::error::{SynthesisError, SynthesisResult};

/// An ordered, non-empty sequence of control points spanning the whole synthesis duration.
///
/// The point count is the editor's control resolution (typically 40 to 80 points) and is
/// independent of the audio sample rate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<f64>", into = "Vec<f64>")
)]
pub struct Track {
    points: Vec<f64>,
}

impl Track {
    /// Creates a track from its control points.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::EmptyTrack`] if `points` is empty.
    pub fn new(points: Vec<f64>) -> SynthesisResult<Self> {
        if points.is_empty() {
            return Err(SynthesisError::EmptyTrack(String::from("track")));
        }
        Ok(Track { points })
    }

    /// A flat track holding `value` at `n_points` control points (at least one).
    #[must_use]
    pub fn constant(value: f64, n_points: usize) -> Self {
        Track {
            points: vec![value; n_points.max(1)],
        }
    }

    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Changes the number of control points without interpolating.
    ///
    /// Shrinking truncates, growing repeats the final value.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::EmptyTrack`] if `n_points` is zero.
    pub fn resize(&mut self, n_points: usize) -> SynthesisResult<()> {
        if n_points == 0 {
            return Err(SynthesisError::EmptyTrack(String::from("track")));
        }
        let last = self.points[self.points.len() - 1];
        self.points.resize(n_points, last);
        Ok(())
    }

    /// Linearly interpolates the track onto `n_samp` evenly spaced samples of `[0, 1]`.
    ///
    /// The first and last samples are exactly the first and last control points, and no
    /// sample leaves the range of the two control points it lies between.
    #[must_use]
    pub fn interpolate(&self, n_samp: usize) -> Vec<f64> {
        let points = &self.points;
        let last = points.len() - 1;
        if last == 0 || n_samp <= 1 {
            return vec![points[0]; n_samp];
        }
        let span = (n_samp - 1) as f64;
        (0..n_samp)
            .map(|i| {
                let pos = (i * last) as f64 / span;
                // truncation is floor here, pos is never negative
                #[allow(clippy::cast_sign_loss)]
                let k = (pos as usize).min(last - 1);
                let frac = pos - k as f64;
                let (p, q) = (points[k], points[k + 1]);
                let v = p * (1.0 - frac) + q * frac;
                let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
                if v < lo {
                    lo
                } else if v > hi {
                    hi
                } else {
                    v
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<f64>> for Track {
    type Error = SynthesisError;

    fn try_from(points: Vec<f64>) -> SynthesisResult<Self> {
        Track::new(points)
    }
}

impl From<Track> for Vec<f64> {
    fn from(track: Track) -> Self {
        track.points
    }
}

/// A time-varying control: either a track or a constant broadcast over the whole duration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Control {
    Scalar(f64),
    Track(Track),
}

impl Control {
    /// Largest value the control takes.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        match self {
            Control::Scalar(v) => *v,
            Control::Track(t) => t
                .points()
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, |m, v| if v > m { v } else { m }),
        }
    }
}

impl From<f64> for Control {
    fn from(value: f64) -> Self {
        Control::Scalar(value)
    }
}

impl From<Track> for Control {
    fn from(track: Track) -> Self {
        Control::Track(track)
    }
}

/// Expands a control into a parameter vector of `n_samp` samples.
///
/// Tracks are linearly interpolated, scalars are broadcast.
///
/// # Errors
///
/// [`SynthesisError::EmptyTrack`] for a track without points (only reachable through
/// deserialized or otherwise unchecked data).
pub fn expand(control: &Control, n_samp: usize) -> SynthesisResult<Vec<f64>> {
    match control {
        Control::Scalar(v) => Ok(vec![*v; n_samp]),
        Control::Track(track) if track.is_empty() => {
            Err(SynthesisError::EmptyTrack(String::from("track")))
        }
        Control::Track(track) => Ok(track.interpolate(n_samp)),
    }
}
