use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use listing_core::{MediaError, MediaUtility, Resolution};
use log::{debug, error, trace};
use tempfile::TempDir;
use tokio::process::Command;

use crate::commands::HideWindow;

/// [`MediaUtility`] backed by the `ffprobe` and `ffmpeg` executables.
///
/// Extracted frames live in a scratch directory that is removed when the
/// value is dropped.
#[derive(Debug)]
pub struct FfmpegMedia {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    scratch: TempDir,
    frames: AtomicUsize,
}

impl FfmpegMedia {
    /// # Errors
    /// Returns an error if the scratch directory cannot be created in
    /// `scratch_parent`.
    pub fn new(
        ffmpeg: impl Into<PathBuf>,
        ffprobe: impl Into<PathBuf>,
        scratch_parent: &Path,
    ) -> Result<Self, MediaError> {
        let scratch = tempfile::Builder::new()
            .prefix("previews-")
            .tempdir_in(scratch_parent)?;
        debug!("Preview scratch directory: {}", scratch.path().display());

        Ok(Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            scratch,
            frames: AtomicUsize::new(0),
        })
    }

    fn frame_path(&self, video: &Path) -> PathBuf {
        let index = self.frames.fetch_add(1, Ordering::Relaxed);
        let stem = video
            .file_stem()
            .map_or_else(|| "trailer".into(), |stem| stem.to_string_lossy());
        self.scratch
            .path()
            .join(format!("{stem}-preview-{index}.png"))
    }

    async fn run(&self, tool: &'static str, program: &Path, args: &[&str]) -> Result<String, MediaError> {
        debug!("Running {tool}: {} {}", program.display(), args.join(" "));

        let output = Command::new(program)
            .args(args)
            .hide_window()
            .output()
            .await?;

        trace!("{tool} stdout: {}", String::from_utf8_lossy(&output.stdout));

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("{tool} failed: args={args:?}, stderr='{stderr}'");
            Err(MediaError::ToolFailed {
                tool,
                details: if stderr.is_empty() {
                    format!("exit status {}", output.status)
                } else {
                    stderr
                },
            })
        }
    }
}

#[async_trait]
impl MediaUtility for FfmpegMedia {
    async fn extract_preview_frame(
        &self,
        video: &Path,
        timestamp: &str,
        resolution: Resolution,
    ) -> Result<PathBuf, MediaError> {
        let output = self.frame_path(video);
        let seek = seek_position(timestamp);
        let scale = format!("scale={}:{}", resolution.width, resolution.height);
        let input = video.to_string_lossy();
        let target = output.to_string_lossy();

        self.run(
            "ffmpeg",
            &self.ffmpeg,
            &[
                "-y",
                "-loglevel",
                "error",
                "-ss",
                seek.as_str(),
                "-i",
                &*input,
                "-frames:v",
                "1",
                "-vf",
                scale.as_str(),
                &*target,
            ],
        )
        .await?;

        debug!("Extracted {resolution} preview of {} at {seek}", video.display());
        Ok(output)
    }

    async fn resolution(&self, path: &Path) -> Result<Resolution, MediaError> {
        let input = path.to_string_lossy();
        let stdout = self
            .run(
                "ffprobe",
                &self.ffprobe,
                &[
                    "-v",
                    "error",
                    "-select_streams",
                    "v:0",
                    "-show_entries",
                    "stream=width,height",
                    "-of",
                    "csv=s=x:p=0",
                    &*input,
                ],
            )
            .await?;

        parse_resolution(&stdout).ok_or_else(|| MediaError::UnreadableResolution {
            path: path.display().to_string(),
            details: format!("unexpected ffprobe output '{}'", stdout.trim()),
        })
    }
}

/// `MM.SS` (or `MM:SS`) as an ffmpeg seek position.
fn seek_position(timestamp: &str) -> String {
    format!("00:{}", timestamp.replace('.', ":"))
}

/// Parse ffprobe's `WIDTHxHEIGHT` output, ignoring trailing lines.
fn parse_resolution(output: &str) -> Option<Resolution> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let (width, height) = line.split_once('x')?;
    let width = width.trim().parse().ok()?;
    let height = height.trim().trim_end_matches('x').parse().ok()?;
    Some(Resolution::new(width, height))
}
