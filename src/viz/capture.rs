//! Audio capture subprocess lifecycle
//!
//! Launches the external real-time analysis executable (cava-style) with a
//! generated configuration and reads fixed-size raw stereo frames from its
//! stdout. The child is exclusively owned by one connection's producer loop
//! and is killed on every exit path, including stream drop.

use crate::error::{Error, Result};
use crate::viz::sample::{decode_frame, ChannelLevels, FRAME_BYTES};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use uuid::Uuid;
use tracing::{debug, warn};

/// Bounded wait for the child to exit after a kill
const SHUTDOWN_WAIT: Duration = Duration::from_secs(2);

/// Capture subprocess configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Executable to launch
    pub command: String,
    /// Target sample cadence per second
    pub frame_rate: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            command: "cava".to_string(),
            frame_rate: 60,
        }
    }
}

/// Render the generated configuration file contents
///
/// Fixed frame rate, auto input source, raw binary 16-bit stereo output.
fn render_config(frame_rate: u32) -> String {
    format!(
        "[general]\n\
         framerate = {}\n\
         \n\
         [input]\n\
         method = auto\n\
         \n\
         [output]\n\
         method = raw\n\
         raw_target = /dev/stdout\n\
         data_format = binary\n\
         bits = 16\n\
         channels = stereo\n",
        frame_rate
    )
}

/// A running capture subprocess
pub struct Capture {
    child: Child,
    stdout: ChildStdout,
    config_path: PathBuf,
}

impl Capture {
    /// Write a generated config to a unique temp path and spawn the capture
    /// command against it
    pub async fn spawn(config: &CaptureConfig) -> Result<Self> {
        let config_path =
            std::env::temp_dir().join(format!("chaser-capture-{}.conf", Uuid::new_v4()));
        tokio::fs::write(&config_path, render_config(config.frame_rate)).await?;

        let mut child = Command::new(&config.command)
            .arg("-p")
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let _ = std::fs::remove_file(&config_path);
                Error::Subprocess(format!("failed to launch {}: {}", config.command, e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Subprocess("capture stdout not piped".to_string()))?;

        debug!(command = %config.command, config = %config_path.display(), "capture subprocess spawned");

        Ok(Self {
            child,
            stdout,
            config_path,
        })
    }

    /// Read and decode one frame
    ///
    /// `Ok(None)` means the child closed its output (short or empty read);
    /// an `Err` is a decode or I/O failure beyond plain EOF.
    pub async fn read_frame(&mut self, buf: &mut [u8; FRAME_BYTES]) -> Result<Option<ChannelLevels>> {
        match self.stdout.read_exact(buf).await {
            Ok(_) => decode_frame(buf).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Kill the child and await its exit with a bounded wait
    pub async fn shutdown(mut self) {
        let _ = self.child.start_kill();
        match tokio::time::timeout(SHUTDOWN_WAIT, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "capture subprocess reaped"),
            Ok(Err(e)) => warn!(error = %e, "capture subprocess wait failed"),
            Err(_) => warn!("capture subprocess did not exit within bounded wait"),
        }
        let _ = std::fs::remove_file(&self.config_path);
    }
}

impl Drop for Capture {
    // kill_on_drop handles the child; the generated config still needs
    // removing when the owning stream is dropped mid-LIVE
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.config_path);
    }
}
