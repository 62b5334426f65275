//! Live audio-level visualization
//!
//! Produces an unbounded, real-time sequence of stereo level samples for a
//! single client connection, sourced from a capture subprocess when one can
//! be launched and degrading to a deterministic synthetic signal otherwise.

pub mod capture;
pub mod sample;
pub mod stream;

pub use capture::{Capture, CaptureConfig};
pub use sample::VizSample;
pub use stream::sample_stream;
