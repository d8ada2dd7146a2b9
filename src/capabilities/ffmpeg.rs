//! ffmpeg-backed transcoder.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::capability::Transcoder;
use crate::error::EngineError;
use crate::Result;

/// Transcoder that shells out to `ffmpeg`.
///
/// Captured WebM clips are converted to MP3 for the speech model. The
/// subprocess runs fully detached from the session loop apart from the
/// single awaited call; stdout/stderr are captured so a failure can carry
/// the tool's own diagnostics.
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self { binary: "ffmpeg".to_string() }
    }

    /// Use an explicit ffmpeg binary path.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        debug!(input = %input.display(), output = %output.display(), "Transcoding audio clip");

        let result = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-acodec")
            .arg("libmp3lame")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                EngineError::conversion_with_source(
                    format!("failed to launch {}", self.binary),
                    Box::new(e),
                )
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = stderr.lines().rev().take(3).collect::<Vec<_>>().join(" | ");
            warn!(status = ?result.status.code(), "ffmpeg failed: {}", tail);
            return Err(EngineError::conversion(format!(
                "ffmpeg exited with status {}: {}",
                result.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                tail,
            )));
        }

        // ffmpeg can exit zero without producing output for empty inputs
        if !output.exists() {
            return Err(EngineError::conversion(format!(
                "ffmpeg produced no output at {}",
                output.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_a_conversion_error() {
        let transcoder = FfmpegTranscoder::with_binary("/nonexistent/ffmpeg-binary");
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.webm");
        let output = dir.path().join("clip.mp3");
        tokio::fs::write(&input, b"not really webm").await.unwrap();

        let err = transcoder.transcode(&input, &output).await.unwrap_err();
        assert!(matches!(err, EngineError::Conversion { .. }));
        assert_eq!(err.wire_kind(), "conversion_error");
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_conversion_error() {
        // `false` ignores its arguments and exits 1, standing in for a
        // failing transcoder without requiring ffmpeg on the test host.
        let transcoder = FfmpegTranscoder::with_binary("false");
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.webm");
        let output = dir.path().join("clip.mp3");
        tokio::fs::write(&input, b"\x1a\x45\xdf\xa3garbage").await.unwrap();

        let err = transcoder.transcode(&input, &output).await.unwrap_err();
        assert!(matches!(err, EngineError::Conversion { .. }));
    }

    #[tokio::test]
    async fn zero_exit_without_output_is_a_conversion_error() {
        // `true` exits 0 but writes nothing.
        let transcoder = FfmpegTranscoder::with_binary("true");
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.webm");
        let output = dir.path().join("clip.mp3");
        tokio::fs::write(&input, b"\x1a\x45\xdf\xa3garbage").await.unwrap();

        let err = transcoder.transcode(&input, &output).await.unwrap_err();
        assert!(matches!(err, EngineError::Conversion { .. }));
    }
}
