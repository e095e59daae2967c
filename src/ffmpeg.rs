use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::media::{AspectClass, MediaError, MediaToolkit};

/// Shells out to ffprobe/ffmpeg. The only implementation used outside tests.
pub struct FfmpegToolkit;

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<i64>,
    height: Option<i64>,
}

/// First stream carrying video dimensions. Audio and data streams have no
/// width/height and are skipped.
fn parse_probe_dimensions(stdout: &[u8]) -> Result<(i64, i64), MediaError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::Probe(format!("unreadable ffprobe output: {}", e)))?;

    probe
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        })
        .ok_or(MediaError::NoVideoStream)
}

fn processing_output_path(input: &Path) -> PathBuf {
    let mut output = input.as_os_str().to_owned();
    output.push(".processing");
    PathBuf::from(output)
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_aspect(&self, path: &Path) -> Result<AspectClass, MediaError> {
        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg(path)
            .output()
            .await
            .map_err(|e| MediaError::Probe(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Probe(format!("ffprobe failed: {}", stderr)));
        }

        let (width, height) = parse_probe_dimensions(&output.stdout)?;
        let class = AspectClass::classify(width, height);
        debug!(
            "[ffprobe] {:?}: {}x{} -> {}",
            path,
            width,
            height,
            class.ratio_label()
        );
        Ok(class)
    }

    async fn remux_faststart(&self, input: &Path) -> Result<PathBuf, MediaError> {
        let output_path = processing_output_path(input);

        let output = Command::new("ffmpeg")
            .arg("-i")
            .arg(input)
            .arg("-c")
            .arg("copy")
            .arg("-movflags")
            .arg("faststart")
            .arg("-f")
            .arg("mp4")
            .arg("-y")
            .arg(&output_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| MediaError::Remux(format!("failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&output_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Remux(format!("ffmpeg failed: {}", stderr)));
        }

        Ok(output_path)
    }
}
