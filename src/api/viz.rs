//! Visualization SSE handler
//!
//! Each connection owns its own producer loop; there is no shared broadcast
//! channel. Samples are pushed as soon as produced, in production order,
//! with no buffering beyond what the transport requires. Client disconnect
//! drops the stream, which kills and reaps the capture subprocess.

use crate::viz::sample_stream;
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tracing::info;

/// GET /visualization - one-way event stream of level samples
pub async fn visualization_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("visualization client connected");

    let samples = sample_stream(state.config.capture.clone());

    let stream = samples.filter_map(|sample| async move {
        Event::default()
            .event("sample")
            .json_data(&sample)
            .ok()
            .map(Ok)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
