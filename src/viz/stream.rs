//! Per-connection sample producer
//!
//! Explicit LIVE / TERMINATING / FALLBACK state machine driving an unbounded
//! stream of level samples. The stream is owned by exactly one connection;
//! dropping it cancels the loop and releases the capture subprocess. The
//! stream never ends on its own: once live capture is gone the synthetic
//! generator takes over so the client keeps receiving samples.

use crate::viz::capture::{Capture, CaptureConfig};
use crate::viz::sample::{wall_clock, VizSample, FRAME_BYTES};
use futures::stream::Stream;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Synthetic sample cadence (~60/sec)
const FALLBACK_INTERVAL: Duration = Duration::from_millis(16);

/// Producer state, one handler per state
enum StreamState {
    /// Reading frames from the capture subprocess
    Live(Capture),
    /// Capture ended or failed; kill and reap it, then fall back
    Terminating(Capture),
    /// Emitting synthetic samples indefinitely
    Fallback,
}

/// Build the sample stream for one client connection
///
/// Suspension points are the blocking frame read (LIVE) and the fixed tick
/// (FALLBACK); the loop never busy-spins.
pub fn sample_stream(config: CaptureConfig) -> impl Stream<Item = VizSample> {
    async_stream::stream! {
        let mut state = match Capture::spawn(&config).await {
            Ok(capture) => {
                info!(command = %config.command, "visualization capture started");
                StreamState::Live(capture)
            }
            Err(e) => {
                warn!(error = %e, "capture unavailable, using synthetic signal");
                StreamState::Fallback
            }
        };

        let mut frame = [0u8; FRAME_BYTES];
        let mut ticker = tokio::time::interval(FALLBACK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            state = match state {
                StreamState::Live(mut capture) => match capture.read_frame(&mut frame).await {
                    Ok(Some(levels)) => {
                        yield VizSample::live(levels, wall_clock());
                        StreamState::Live(capture)
                    }
                    Ok(None) => {
                        debug!("capture output closed");
                        StreamState::Terminating(capture)
                    }
                    Err(e) => {
                        warn!(error = %e, "capture frame failed");
                        StreamState::Terminating(capture)
                    }
                },
                StreamState::Terminating(capture) => {
                    capture.shutdown().await;
                    info!("capture gone, switching to synthetic signal");
                    StreamState::Fallback
                }
                StreamState::Fallback => {
                    ticker.tick().await;
                    yield VizSample::synthetic(wall_clock());
                    StreamState::Fallback
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn test_config(command: &str) -> CaptureConfig {
        CaptureConfig {
            command: command.to_string(),
            frame_rate: 60,
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_falls_back_immediately() {
        let stream = sample_stream(test_config("/nonexistent/capture-binary"));
        futures::pin_mut!(stream);

        let sample = stream.next().await.expect("stream is unbounded");
        assert!(sample.fallback);
        assert!(sample.base_level.is_none());
    }

    #[tokio::test]
    async fn test_zero_output_exit_transitions_to_fallback() {
        // `true` launches fine, writes nothing, exits: LIVE -> TERMINATING
        // -> FALLBACK, and the stream keeps producing
        let stream = sample_stream(test_config("true"));
        futures::pin_mut!(stream);

        for _ in 0..3 {
            let sample = stream.next().await.expect("stream is unbounded");
            assert!(sample.fallback);
            assert!((5.0..=100.0).contains(&sample.left));
            assert!((5.0..=100.0).contains(&sample.right));
        }
    }

    #[tokio::test]
    async fn test_samples_are_timestamped_in_order() {
        let stream = sample_stream(test_config("/nonexistent/capture-binary"));
        futures::pin_mut!(stream);

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert!(second.timestamp >= first.timestamp);
    }
}
