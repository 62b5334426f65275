//! Level sample type and the maths behind it
//!
//! A capture frame is 512 interleaved stereo pairs of little-endian i16
//! samples. Per channel: RMS over the frame, normalized against the maximum
//! 16-bit magnitude, amplified, mapped to 0-100 and floored at 5 so the bars
//! never visually collapse to zero.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::{SystemTime, UNIX_EPOCH};

/// Interleaved stereo sample pairs per frame
pub const FRAME_PAIRS: usize = 512;

/// Frame size in bytes (pairs x 2 channels x 2 bytes)
pub const FRAME_BYTES: usize = FRAME_PAIRS * 2 * 2;

/// Fixed amplification applied to normalized RMS levels
const AMPLIFICATION: f64 = 2.0;

/// Display floor; bars never drop below this
const LEVEL_FLOOR: f64 = 5.0;

/// Display ceiling
const LEVEL_CEILING: f64 = 100.0;

/// One stereo level sample pushed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizSample {
    /// Left channel level in [5, 100]
    pub left: f64,
    /// Right channel level in [5, 100]
    pub right: f64,
    /// Wall-clock seconds
    pub timestamp: f64,
    /// True when the sample came from the synthetic generator
    pub fallback: bool,
    /// Mean of the two normalized RMS values (live samples only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_level: Option<f64>,
}

impl VizSample {
    /// Sample from a decoded capture frame
    pub fn live(levels: ChannelLevels, timestamp: f64) -> Self {
        Self {
            left: levels.left,
            right: levels.right,
            timestamp,
            fallback: false,
            base_level: Some(levels.base_level),
        }
    }

    /// Sample from the synthetic generator
    pub fn synthetic(timestamp: f64) -> Self {
        let (left, right) = fallback_levels(timestamp);
        Self {
            left,
            right,
            timestamp,
            fallback: true,
            base_level: None,
        }
    }
}

/// Per-channel display levels decoded from one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelLevels {
    pub left: f64,
    pub right: f64,
    /// Mean of the two normalized RMS values, before amplification
    pub base_level: f64,
}

/// Decode one raw capture frame into display levels
///
/// Even-indexed samples are the left channel, odd-indexed the right.
pub fn decode_frame(frame: &[u8]) -> Result<ChannelLevels> {
    if frame.len() != FRAME_BYTES {
        return Err(Error::MalformedFrame(format!(
            "expected {} bytes, got {}",
            FRAME_BYTES,
            frame.len()
        )));
    }

    let mut sum_left = 0.0f64;
    let mut sum_right = 0.0f64;

    for pair in frame.chunks_exact(4) {
        let left = i16::from_le_bytes([pair[0], pair[1]]) as f64;
        let right = i16::from_le_bytes([pair[2], pair[3]]) as f64;
        sum_left += left * left;
        sum_right += right * right;
    }

    let norm_left = (sum_left / FRAME_PAIRS as f64).sqrt() / i16::MAX as f64;
    let norm_right = (sum_right / FRAME_PAIRS as f64).sqrt() / i16::MAX as f64;

    Ok(ChannelLevels {
        left: scale_level(norm_left),
        right: scale_level(norm_right),
        base_level: (norm_left + norm_right) / 2.0,
    })
}

/// Map a normalized RMS value onto the 5-100 display range
fn scale_level(normalized: f64) -> f64 {
    (normalized * AMPLIFICATION * 100.0)
        .clamp(0.0, LEVEL_CEILING)
        .max(LEVEL_FLOOR)
}

/// Synthetic stereo levels: two superposed sine waves per channel, a pure
/// function of wall-clock time
pub fn fallback_levels(timestamp: f64) -> (f64, f64) {
    let left = 52.0
        + 30.0 * (2.0 * PI * 0.8 * timestamp).sin()
        + 12.0 * (2.0 * PI * 2.9 * timestamp + 0.7).sin();
    let right = 52.0
        + 30.0 * (2.0 * PI * 1.1 * timestamp + PI / 3.0).sin()
        + 12.0 * (2.0 * PI * 3.7 * timestamp + 1.9).sin();

    (
        left.clamp(LEVEL_FLOOR, LEVEL_CEILING),
        right.clamp(LEVEL_FLOOR, LEVEL_CEILING),
    )
}

/// Wall-clock seconds since the UNIX epoch
pub fn wall_clock() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
