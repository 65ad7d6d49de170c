//! Klatt (1980) cascade/parallel formant synthesis in Rust.
//!
//! *NOTE*: This is _not_ a text-to-speech engine.
//! Sounds are synthesized from time-varying control tracks (F0, formants, amplitudes)
//! as drawn in a track editor. See `demos/make_sound.rs` on how to use this.
//!
//! The synthesizer is a graph of sections (voice, noise, cascade, parallel, radiation,
//! output) that is built once and rendered block by block. Rendering in blocks gives
//! exactly the same samples as rendering the whole sound at once.
//!
//! ## `no_std`
//!
//! This library is `no_std` compatible with the `libm` feature.
//! `alloc` is required.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(
    clippy::all,
    clippy::cargo,
    clippy::pedantic,
    unsafe_code,
    rustdoc::all
)]
// fine for us since loss of precision/sign is not that important, as long as it's the same every time.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

#[cfg(all(feature = "std", feature = "libm"))]
compile_error!("Features \"std\" and \"libm\" are mutually exclusive.");

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Must specify a math feature: either \"std\" or \"libm\".");

extern crate alloc;

/// Largest supported number of formants.
pub const MAX_FORMANTS: usize = 6;

mod components;
mod engine;
mod error;
mod filters;
mod graph;
mod math;
mod params;
pub mod sections;
mod track;
mod traits;

pub use components::{
    AMPLITUDE_FLOOR_DB, Amplifier, Impulse, MAX_FLUTTER_LEVEL, Mixer, NaturalGlottalSource,
    NoiseGenerator, Normalizer, SWITCH_THRESHOLD, Switch, db_to_lin, perform_frequency_modulation,
};
pub use engine::{Engine, synthesize};
pub use error::{ErrorKind, SynthesisError, SynthesisResult};
pub use filters::{
    AntiResonator, FirstDifference, Lowpass, Resonator, TILT_REFERENCE_FREQ, TiltFilter,
    resonator_coefficients,
};
pub use graph::{GraphBuilder, NodeId, SynthesisGraph};
pub use params::{ControlTracks, GlottalSourceType, Settings, SynthesisParameters, Variant};
pub use track::{Control, Track, expand};
pub use traits::{BasicFilter, Filter};

#[cfg(test)]
mod lib_tests;
