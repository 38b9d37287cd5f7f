// SPDX-License-Identifier: MIT OR Apache-2.0
//! Encoding collected frames with ffmpeg.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{Result, ServiceError};

/// Name of the encoded video inside a session directory
pub const OUTPUT_FILE: &str = "output.mp4";

/// Arguments turning `frame_<n>.png` files into an H.264 MP4
pub fn encode_args(framerate: u32) -> Vec<String> {
    [
        "-y",
        "-loglevel",
        "error",
        "-framerate",
        &framerate.to_string(),
        "-i",
        "frame_%d.png",
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        OUTPUT_FILE,
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

/// Encode the frames in `dir`, returning the path of the video
pub async fn encode(program: &str, framerate: u32, dir: &Path) -> Result<PathBuf> {
    tracing::info!("Encoding {dir:?} at {framerate} fps");

    let output = Command::new(program)
        .args(encode_args(framerate))
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ServiceError::Encoder(format!("failed to run {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ServiceError::Encoder(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(dir.join(OUTPUT_FILE))
}
