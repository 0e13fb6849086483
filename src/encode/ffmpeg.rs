use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{VidreelError, VidreelResult};

/// Where and how [`FfmpegSink`] writes its MP4.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`. Defaults to `true`.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    /// Write to `out_path`, replacing any existing file.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }

    /// Set `overwrite`; with `false`, `begin` fails on an existing file.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// [`FrameSink`] that pipes packed RGB24 frames into a system `ffmpeg` producing H.264 MP4.
///
/// The encoder process is spawned by [`FrameSink::begin`] and reaped by [`FrameSink::end`].
/// Odd frame dimensions are padded to even ones inside ffmpeg, since yuv420p cannot
/// represent them.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    running: Option<Running>,
}

struct Running {
    cfg: SinkConfig,
    process: EncoderProcess,
    next_min: u64,
}

impl FfmpegSink {
    /// Nothing is spawned until `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            running: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> VidreelResult<()> {
        if self.running.is_some() {
            return Err(VidreelError::state("encoder is already running"));
        }
        if cfg.resolution().is_empty() {
            return Err(VidreelError::validation(format!(
                "cannot encode a {} video",
                cfg.resolution()
            )));
        }

        let out = &self.opts.out_path;
        ensure_parent_dir(out)?;
        if out.exists() && !self.opts.overwrite {
            return Err(VidreelError::io(format!(
                "refusing to overwrite '{}'",
                out.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(VidreelError::dependency_missing(
                "writing MP4 needs the `ffmpeg` binary on PATH",
            ));
        }

        tracing::debug!(out = %out.display(), size = %cfg.resolution(), fps = %cfg.fps, "starting encoder");
        let process = EncoderProcess::spawn(encoder_args(&cfg, out, self.opts.overwrite))?;
        self.running = Some(Running {
            cfg,
            process,
            next_min: 0,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> VidreelResult<()> {
        let running = self
            .running
            .as_mut()
            .ok_or_else(|| VidreelError::state("encoder has not been started"))?;
        if idx.0 < running.next_min {
            return Err(VidreelError::state(format!(
                "frame {} arrived after frame {}",
                idx.0,
                running.next_min - 1
            )));
        }
        let expected = (running.cfg.width, running.cfg.height);
        if frame.dimensions() != expected {
            return Err(VidreelError::validation(format!(
                "frame is {}x{} but the encoder expects {}x{}",
                frame.width(),
                frame.height(),
                expected.0,
                expected.1
            )));
        }

        running.process.write(frame.as_raw())?;
        running.next_min = idx.0 + 1;
        Ok(())
    }

    fn end(&mut self) -> VidreelResult<()> {
        let running = self
            .running
            .take()
            .ok_or_else(|| VidreelError::state("encoder has not been started"))?;
        let (status, stderr) = running.process.finish()?;
        if status.success() {
            return Ok(());
        }
        Err(VidreelError::io(format!(
            "ffmpeg failed ({status}): {}",
            stderr.trim()
        )))
    }

    fn format_name(&self) -> &str {
        "mp4 (h264/yuv420p)"
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.opts.out_path)
    }
}

/// Command line for encoding raw RGB24 from stdin into `out`.
pub(crate) fn encoder_args(cfg: &SinkConfig, out: &Path, overwrite: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |items: &[&str]| args.extend(items.iter().map(OsString::from));

    push(&[if overwrite { "-y" } else { "-n" }, "-loglevel", "error"]);
    // Input options: `-r` before `-i` sets the raw stream's rate.
    push(&["-f", "rawvideo", "-pix_fmt", "rgb24"]);
    push(&["-s", &cfg.resolution().to_string()]);
    push(&["-r", &format!("{}/{}", cfg.fps.num, cfg.fps.den)]);
    push(&["-i", "pipe:0", "-an"]);
    if cfg.width % 2 == 1 || cfg.height % 2 == 1 {
        push(&["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"]);
    }
    push(&["-c:v", "libx264", "-pix_fmt", "yuv420p"]);
    push(&["-movflags", "+faststart"]);
    args.push(out.as_os_str().to_owned());
    args
}

/// A running `ffmpeg` with a writable stdin and a thread collecting its stderr.
struct EncoderProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl EncoderProcess {
    fn spawn(args: Vec<OsString>) -> VidreelResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VidreelError::io(format!("could not start ffmpeg: {e}")))?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });
        if stdin.is_none() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VidreelError::io("ffmpeg started without a stdin pipe"));
        }
        Ok(Self {
            child,
            stdin,
            stderr,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> VidreelResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| VidreelError::state("encoder input is already closed"))?;
        stdin
            .write_all(bytes)
            .map_err(|e| VidreelError::io(format!("ffmpeg stopped accepting frames: {e}")))
    }

    /// Close stdin, wait for exit, and return the exit status with everything ffmpeg printed.
    fn finish(mut self) -> VidreelResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| VidreelError::io(format!("waiting on ffmpeg: {e}")))?;
        let stderr = match self.stderr.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VidreelError::io("ffmpeg stderr reader panicked"))?
                .map_err(|e| VidreelError::io(format!("reading ffmpeg stderr: {e}")))?,
            None => Vec::new(),
        };
        Ok((status, String::from_utf8_lossy(&stderr).into_owned()))
    }
}

impl Drop for EncoderProcess {
    fn drop(&mut self) {
        // An abandoned encoder sees EOF and exits on its own.
        drop(self.stdin.take());
        let _ = self.child.wait();
    }
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> VidreelResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| VidreelError::io(format!("cannot create '{}': {e}", parent.display()))),
        _ => Ok(()),
    }
}

/// `true` when `<tool> -version` runs successfully.
pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

pub fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path("ffmpeg")
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
