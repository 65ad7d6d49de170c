//! Error type shared by every stage of the synthesizer.

use alloc::string::String;
use thiserror::Error;

use crate::MAX_FORMANTS;

/// Result type for synthesis operations.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Broad classes of failure.
///
/// Nothing is retried internally. A failed synthesis yields no waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid settings, detected before any computation.
    Configuration,
    /// A parameter or signal that makes the arithmetic meaningless (zero F0, silent or
    /// non-finite output).
    NumericDegeneracy,
    /// A control track that cannot be interpolated.
    InterpolationDomain,
}

/// Errors that can occur while preparing or running a synthesis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthesisError {
    /// Sample rate of zero.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(usize),

    /// Duration that is not finite, not positive, or rounds to zero samples.
    #[error("invalid duration: {0} seconds")]
    InvalidDuration(f64),

    /// Formant count outside `1..=MAX_FORMANTS`.
    #[error("formant count {0} is outside 1..={max}", max = MAX_FORMANTS)]
    InvalidFormantCount(usize),

    /// A per-formant control array whose length differs from the formant count.
    #[error("{name} has {found} formant tracks, expected {expected}")]
    FormantCountMismatch {
        /// Control name (`FF` or `BW`).
        name: &'static str,
        /// Configured formant count.
        expected: usize,
        /// Number of tracks supplied.
        found: usize,
    },

    /// Chunked rendering requested with a chunk of zero samples.
    #[error("chunk length must be at least one sample")]
    InvalidChunkLength,

    /// A control value outside its permitted range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Control name.
        name: String,
        /// What is wrong with it.
        message: String,
    },

    /// Miswired section graph.
    #[error("invalid synthesis graph: {0}")]
    InvalidGraph(String),

    /// A track without control points.
    #[error("track {0} has no control points")]
    EmptyTrack(String),

    /// NaN or infinity inside an expanded parameter vector.
    #[error("{name} is not finite at sample {index}")]
    NonFiniteParameter {
        /// Control name.
        name: String,
        /// Sample index.
        index: usize,
    },

    /// F0 of zero or below, which leaves the glottal period undefined.
    #[error("F0 must be positive, found {value} Hz at sample {index}")]
    NonPositiveF0 {
        /// Sample index.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// The waveform reaching the normalizer is identically zero.
    #[error("synthesized waveform is silent and cannot be normalized")]
    SilentOutput,

    /// The rendered waveform contains NaN or infinity.
    #[error("synthesized waveform is not finite at sample {index}")]
    NonFiniteOutput {
        /// Sample index.
        index: usize,
    },
}

impl SynthesisError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSampleRate(_)
            | Self::InvalidDuration(_)
            | Self::InvalidFormantCount(_)
            | Self::FormantCountMismatch { .. }
            | Self::InvalidChunkLength
            | Self::InvalidParameter { .. }
            | Self::InvalidGraph(_)
            | Self::NonFiniteParameter { .. } => ErrorKind::Configuration,
            Self::EmptyTrack(_) => ErrorKind::InterpolationDomain,
            Self::NonPositiveF0 { .. } | Self::SilentOutput | Self::NonFiniteOutput { .. } => {
                ErrorKind::NumericDegeneracy
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn invalid_param_helper() {
        let err = SynthesisError::invalid_param("TL", "must not be negative");
        assert!(err.to_string().contains("TL"));
        assert!(err.to_string().contains("must not be negative"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn formant_count_message_names_the_bound() {
        let err = SynthesisError::InvalidFormantCount(9);
        assert_eq!(err.to_string(), "formant count 9 is outside 1..=6");
    }

    #[test]
    fn taxonomy() {
        assert_eq!(
            SynthesisError::EmptyTrack("F0".into()).kind(),
            ErrorKind::InterpolationDomain
        );
        assert_eq!(SynthesisError::SilentOutput.kind(), ErrorKind::NumericDegeneracy);
        assert_eq!(
            SynthesisError::NonPositiveF0 { index: 3, value: 0.0 }.kind(),
            ErrorKind::NumericDegeneracy
        );
        assert_eq!(SynthesisError::InvalidSampleRate(0).kind(), ErrorKind::Configuration);
    }
}
