use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::encode::ffmpeg::is_tool_on_path;
use crate::foundation::error::{VidreelError, VidreelResult};
use crate::foundation::human::format_size;

/// Lowest bitrate (bits per second) handed to a transcoder.
pub const MIN_TARGET_BITRATE: u64 = 1000;

const BITS_PER_KB: f64 = 8.0 * 1024.0;

/// External re-encoding capability used by compression.
pub trait Transcoder: Send {
    /// Re-encode `input` into `output` at `bitrate_bps`.
    fn transcode(&self, input: &Path, output: &Path, bitrate_bps: u64) -> VidreelResult<()>;
    /// Playback duration of `input` in seconds.
    fn probe_duration_secs(&self, input: &Path) -> VidreelResult<f64>;
    fn name(&self) -> &str;
}

/// [`Transcoder`] backed by the system `ffmpeg` and `ffprobe` binaries.
#[derive(Clone, Copy, Debug)]
pub struct FfmpegTranscoder {
    _private: (),
}

impl FfmpegTranscoder {
    /// Return a transcoder when both `ffmpeg` and `ffprobe` are on `PATH`.
    pub fn detect() -> Option<Self> {
        (is_tool_on_path("ffmpeg") && is_tool_on_path("ffprobe")).then_some(Self { _private: () })
    }
}

#[derive(serde::Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, input: &Path, output: &Path, bitrate_bps: u64) -> VidreelResult<()> {
        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            bitrate_bps,
            "transcoding with ffmpeg"
        );
        let out = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args([
                "-c:v",
                "libx264",
                "-b:v",
                &bitrate_bps.to_string(),
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| VidreelError::io(format!("failed to spawn ffmpeg: {e}")))?;
        if !out.status.success() {
            return Err(VidreelError::io(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }

    fn probe_duration_secs(&self, input: &Path) -> VidreelResult<f64> {
        let out = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
            ])
            .arg(input)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| VidreelError::io(format!("failed to spawn ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(VidreelError::io(format!(
                "ffprobe exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_probe_duration(&out.stdout)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

pub(crate) fn parse_probe_duration(json: &[u8]) -> VidreelResult<f64> {
    let probe: ProbeOutput = serde_json::from_slice(json)
        .map_err(|e| VidreelError::io(format!("failed to parse ffprobe output: {e}")))?;
    let raw = probe
        .format
        .duration
        .ok_or_else(|| VidreelError::io("ffprobe reported no duration"))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|e| VidreelError::io(format!("invalid ffprobe duration '{raw}': {e}")))
}

/// Options for [`compress_file`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompressOpts {
    /// Target size as a fraction of the original, in `(0, 1]`.
    pub target_size_ratio: f64,
    /// Replace the original file with the compressed result.
    pub overwrite_original: bool,
}

impl Default for CompressOpts {
    fn default() -> Self {
        Self {
            target_size_ratio: 0.5,
            overwrite_original: false,
        }
    }
}

impl CompressOpts {
    /// `target_size_ratio` must be in `(0, 1]`.
    pub fn validate(&self) -> VidreelResult<()> {
        if !(self.target_size_ratio > 0.0 && self.target_size_ratio <= 1.0) {
            return Err(VidreelError::configuration(format!(
                "target_size_ratio must be in (0, 1], got {}",
                self.target_size_ratio
            )));
        }
        Ok(())
    }
}

/// Outcome of a compression run.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressReport {
    pub input: PathBuf,
    /// Where the compressed video ended up (equals `input` when overwriting).
    pub output: PathBuf,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    /// Bitrate requested from the transcoder, bits per second.
    pub bitrate_bps: u64,
}

impl std::fmt::Display for CompressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "compressed:  {}", self.input.display())?;
        writeln!(f, "output:      {}", self.output.display())?;
        writeln!(f, "bitrate:     {} b/s", self.bitrate_bps)?;
        write!(
            f,
            "size:        {} -> {}",
            format_size(self.original_bytes),
            format_size(self.compressed_bytes)
        )
    }
}

/// Bits per second that make a re-encode of `duration_secs` land near `ratio` of the original.
///
/// The size target `ratio * size_kb / duration_secs` is a KB/s figure; ffmpeg's `-b:v` counts
/// bits, so it is scaled by `8 * 1024` before the [`MIN_TARGET_BITRATE`] floor applies.
pub fn target_bitrate(
    target_size_ratio: f64,
    original_bytes: u64,
    duration_secs: f64,
) -> VidreelResult<u64> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(VidreelError::validation(format!(
            "cannot compute bitrate for duration {duration_secs}s"
        )));
    }
    let size_kb = original_bytes as f64 / 1024.0;
    let kb_per_sec = target_size_ratio * size_kb / duration_secs;
    let bitrate = (kb_per_sec * BITS_PER_KB).round();
    Ok((bitrate as u64).max(MIN_TARGET_BITRATE))
}

/// `dir/stem_compressed.ext` next to `input`.
pub fn compressed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{stem}_compressed.{}", ext.to_string_lossy()),
        None => format!("{stem}_compressed"),
    };
    input.with_file_name(name)
}

/// Re-encode `input` at a bitrate derived from its size and duration.
///
/// `duration_secs` is probed with the transcoder when not supplied.
#[tracing::instrument(skip(transcoder), fields(transcoder = transcoder.name()))]
pub fn compress_file(
    transcoder: &dyn Transcoder,
    input: &Path,
    opts: &CompressOpts,
    duration_secs: Option<f64>,
) -> VidreelResult<CompressReport> {
    opts.validate()?;
    let original_bytes = file_size(input)?;
    let duration_secs = match duration_secs {
        Some(d) => d,
        None => transcoder.probe_duration_secs(input)?,
    };
    let bitrate_bps = target_bitrate(opts.target_size_ratio, original_bytes, duration_secs)?;

    let staged = compressed_path(input);
    transcoder.transcode(input, &staged, bitrate_bps)?;

    let output = if opts.overwrite_original {
        std::fs::rename(&staged, input).map_err(|e| {
            VidreelError::io(format!(
                "failed to replace '{}' with '{}': {e}",
                input.display(),
                staged.display()
            ))
        })?;
        input.to_path_buf()
    } else {
        staged
    };
    let compressed_bytes = file_size(&output)?;

    tracing::debug!(
        output = %output.display(),
        bitrate_bps,
        original = %format_size(original_bytes),
        compressed = %format_size(compressed_bytes),
        "compressed video"
    );

    Ok(CompressReport {
        input: input.to_path_buf(),
        output,
        original_bytes,
        compressed_bytes,
        bitrate_bps,
    })
}

fn file_size(path: &Path) -> VidreelResult<u64> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| VidreelError::io(format!("failed to stat '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/transcode.rs"]
mod tests;
