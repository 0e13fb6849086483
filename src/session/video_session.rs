use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::encode::transcode::{
    CompressOpts, CompressReport, FfmpegTranscoder, Transcoder, compress_file,
};
use crate::foundation::clock::{Clock, SystemClock};
use crate::foundation::core::{Fps, FrameIndex, Resolution};
use crate::foundation::error::{VidreelError, VidreelResult};
use crate::foundation::human::{format_duration, format_size};
use crate::frame::buffer::{ChannelOrder, Frame, fit_to_canvas};
use crate::frame::staging::StagingArea;
use crate::session::opts::{ExportMode, FrameRate, ResolutionSetting, SessionOpts};
use crate::session::report::{ExportProgress, ExportReport, ProgressCallback};

const SECS_PER_HOUR: f64 = 3600.0;

enum SessionState {
    Recording,
    Exported(ExportReport),
    Failed,
}

/// Collects frames from a render loop and turns them into one video file.
///
/// Call [`update`](Self::update) once per rendered frame and [`export`](Self::export) once at the
/// end. In [`ExportMode::Deferred`] frames are staged as images in a private temporary directory
/// and assembled at export, which is what allows automatic frame rate and resolution. In
/// [`ExportMode::Immediate`] frames go straight into the already-open output stream.
pub struct VideoSession<S: FrameSink = FfmpegSink> {
    opts: SessionOpts,
    sink: S,
    clock: Box<dyn Clock>,
    staging: Option<StagingArea>,
    transcoder: Option<Box<dyn Transcoder>>,
    progress: Option<ProgressCallback>,

    frame_count: u64,
    // Largest width and largest height seen, possibly from different frames.
    max_seen: Resolution,
    started_at: Option<Duration>,
    last_frame_at: Option<Duration>,
    state: SessionState,
}

impl VideoSession<FfmpegSink> {
    /// Create a session writing an MP4 to `opts.output_path` through the system `ffmpeg`.
    ///
    /// Compression is enabled when `ffmpeg` and `ffprobe` are found on `PATH`.
    pub fn new(opts: SessionOpts) -> VidreelResult<Self> {
        opts.validate()?;
        let sink = FfmpegSink::new(FfmpegSinkOpts::new(&opts.output_path));
        let mut session = Self::with_sink(opts, sink)?;
        if let Some(t) = FfmpegTranscoder::detect() {
            session.transcoder = Some(Box::new(t));
        }
        Ok(session)
    }
}

impl<S: FrameSink> VideoSession<S> {
    /// Create a session that writes into `sink`.
    ///
    /// Options are validated before anything touches the filesystem. In immediate mode the sink
    /// is opened here.
    #[tracing::instrument(
        level = "debug",
        skip(opts, sink),
        fields(out = %opts.output_path.display(), mode = ?opts.export_mode)
    )]
    pub fn with_sink(opts: SessionOpts, mut sink: S) -> VidreelResult<Self> {
        opts.validate()?;
        let staging = StagingArea::new(&opts.staged_image_format)?;

        if opts.export_mode == ExportMode::Immediate {
            let (ResolutionSetting::Fixed(resolution), FrameRate::Fixed(rate)) =
                (opts.resolution, opts.frame_rate)
            else {
                return Err(VidreelError::configuration(
                    "immediate export needs fixed frame rate and resolution",
                ));
            };
            sink.begin(SinkConfig::new(resolution, Fps::from_rate(rate)?))?;
        }

        tracing::debug!(staging = %staging.path().display(), "session created");

        Ok(Self {
            opts,
            sink,
            clock: Box::new(SystemClock::new()),
            staging: Some(staging),
            transcoder: None,
            progress: None,
            frame_count: 0,
            max_seen: Resolution::default(),
            started_at: None,
            last_frame_at: None,
            state: SessionState::Recording,
        })
    }

    /// Replace the time source used to timestamp frames.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Install the transcoder used by [`compress`](Self::compress).
    pub fn with_transcoder(mut self, transcoder: impl Transcoder + 'static) -> Self {
        self.transcoder = Some(Box::new(transcoder));
        self
    }

    /// Receive a callback per frame written during deferred assembly.
    pub fn with_progress(mut self, cb: impl FnMut(ExportProgress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(cb));
        self
    }

    /// Options the session was created with.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// The output sink, e.g. to inspect an [`InMemorySink`](crate::InMemorySink) after export.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of successful `update` calls.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Paths of staged frames in arrival order (empty in immediate mode or after export).
    pub fn staged_frame_paths(&self) -> &[PathBuf] {
        self.staging.as_ref().map(StagingArea::paths).unwrap_or(&[])
    }

    /// The staging directory, until export removes it.
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(StagingArea::path)
    }

    /// Resolution the output would get right now.
    pub fn current_resolution(&self) -> Resolution {
        match self.opts.resolution {
            ResolutionSetting::Fixed(res) => res,
            ResolutionSetting::Auto => self.max_seen,
        }
    }

    /// Time between the first and the latest frame.
    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.last_frame_at) {
            (Some(start), Some(last)) => last.saturating_sub(start),
            _ => Duration::ZERO,
        }
    }

    /// The export summary, once exported.
    pub fn report(&self) -> Option<&ExportReport> {
        match &self.state {
            SessionState::Exported(report) => Some(report),
            _ => None,
        }
    }

    /// `true` once export has run, successfully or not.
    pub fn is_exported(&self) -> bool {
        !matches!(self.state, SessionState::Recording)
    }

    /// Add an RGB frame.
    pub fn update(&mut self, frame: &Frame) -> VidreelResult<()> {
        self.update_with_order(frame, ChannelOrder::Rgb)
    }

    /// Add a frame whose channels are in `order`.
    ///
    /// Returns [`VidreelError::CapacityExceeded`] after exporting the session when the duration
    /// cap is passed. The cap error is returned even if that export fails; the export error is
    /// logged and [`report`](Self::report) stays `None`.
    pub fn update_with_order(&mut self, frame: &Frame, order: ChannelOrder) -> VidreelResult<()> {
        if self.is_exported() {
            return Err(VidreelError::state("session was already exported"));
        }
        let shape = frame.resolution();
        if shape.is_empty() {
            return Err(VidreelError::validation("frame has a zero dimension"));
        }

        let idx = FrameIndex(self.frame_count);
        let rgb = frame.to_rgb_image(order);
        match self.opts.export_mode {
            ExportMode::Deferred => {
                let staging = self
                    .staging
                    .as_mut()
                    .ok_or_else(|| VidreelError::state("staging directory is gone"))?;
                staging.stage(idx, &rgb)?;
            }
            ExportMode::Immediate => {
                let canvas = self.current_resolution();
                self.sink.push_frame(idx, &fit_to_canvas(&rgb, canvas))?;
            }
        }

        if self.opts.resolution == ResolutionSetting::Auto {
            self.max_seen = self.max_seen.max(shape);
        }

        let now = self.clock.now();
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.last_frame_at = Some(now);
        self.frame_count += 1;

        if let Some(cap_hours) = self.opts.duration_cap() {
            let elapsed_hours = self.elapsed().as_secs_f64() / SECS_PER_HOUR;
            if elapsed_hours > cap_hours {
                tracing::warn!(elapsed_hours, cap_hours, "duration cap exceeded, forcing export");
                if let Err(e) = self.export_with(true) {
                    tracing::error!(error = %e, "forced export after duration cap failed");
                }
                return Err(VidreelError::CapacityExceeded {
                    elapsed_hours,
                    cap_hours,
                });
            }
        }
        Ok(())
    }

    /// Finalize the video.
    pub fn export(&mut self) -> VidreelResult<ExportReport> {
        self.export_with(false)
    }

    /// Finalize the video, logging the report at `info` when `verbose`.
    ///
    /// The staging directory is removed whether or not encoding succeeds. A session can be
    /// exported only once.
    #[tracing::instrument(level = "debug", skip(self), fields(frames = self.frame_count))]
    pub fn export_with(&mut self, verbose: bool) -> VidreelResult<ExportReport> {
        if self.is_exported() {
            return Err(VidreelError::state("export may only be called once"));
        }
        let needs_frames = self.opts.export_mode == ExportMode::Deferred
            && (self.opts.frame_rate == FrameRate::Auto
                || self.opts.resolution == ResolutionSetting::Auto);
        if needs_frames && self.frame_count == 0 {
            return Err(VidreelError::state(
                "automatic frame rate/resolution need at least one frame before export",
            ));
        }

        let result = self.finalize();
        let cleanup = match self.staging.take() {
            Some(staging) => staging.close(),
            None => Ok(()),
        };

        let report = match result.and_then(|report| cleanup.map(|()| report)) {
            Ok(report) => report,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        if verbose {
            tracing::info!(
                path = %report.output_path.display(),
                format = %report.format,
                resolution = %report.resolution,
                fps = %report.fps,
                frames = report.frame_count,
                duration = %format_duration(report.duration_secs),
                size = %format_size(report.file_size_bytes),
                "export complete"
            );
        } else {
            tracing::debug!(path = %report.output_path.display(), "export complete");
        }

        self.state = SessionState::Exported(report.clone());
        Ok(report)
    }

    fn finalize(&mut self) -> VidreelResult<ExportReport> {
        let resolution = self.current_resolution();
        let fps = match self.opts.frame_rate {
            FrameRate::Fixed(rate) => Fps::from_rate(rate)?,
            FrameRate::Auto => derive_frame_rate(self.frame_count, self.elapsed())?,
        };

        match self.opts.export_mode {
            ExportMode::Deferred => {
                let staging = self
                    .staging
                    .as_ref()
                    .ok_or_else(|| VidreelError::state("staging directory is gone"))?;
                assemble(
                    &mut self.sink,
                    staging,
                    SinkConfig::new(resolution, fps),
                    self.progress.as_mut(),
                )?;
            }
            ExportMode::Immediate => self.sink.end()?,
        }

        // Sinks without a file (in-memory) report zero bytes.
        let file_size_bytes = match self.sink.output_path() {
            Some(path) => std::fs::metadata(path)
                .map_err(|e| {
                    VidreelError::io(format!("cannot stat output '{}': {e}", path.display()))
                })?
                .len(),
            None => 0,
        };

        Ok(ExportReport {
            output_path: self.opts.output_path.clone(),
            format: self.sink.format_name().to_string(),
            resolution,
            fps,
            frame_count: self.frame_count,
            duration_secs: fps.frames_to_secs(self.frame_count),
            file_size_bytes,
        })
    }

    /// Re-encode the exported video at a bitrate targeting `opts.target_size_ratio` of its size.
    ///
    /// Needs an exported session and an installed transcoder.
    pub fn compress(&self, opts: CompressOpts, verbose: bool) -> VidreelResult<CompressReport> {
        opts.validate()?;
        let Some(report) = self.report() else {
            return Err(VidreelError::state("compress needs a successfully exported session"));
        };
        let Some(transcoder) = self.transcoder.as_deref() else {
            return Err(VidreelError::dependency_missing(
                "no transcoder available for compression (ffmpeg and ffprobe on PATH, or with_transcoder)",
            ));
        };

        let out = compress_file(
            transcoder,
            &report.output_path,
            &opts,
            Some(report.duration_secs),
        )?;
        if verbose {
            tracing::info!(
                output = %out.output.display(),
                bitrate_bps = out.bitrate_bps,
                original = %format_size(out.original_bytes),
                compressed = %format_size(out.compressed_bytes),
                "compression complete"
            );
        }
        Ok(out)
    }
}

/// Decode staged frames in staging order and stream them into `sink`.
///
/// Once `begin` succeeds the sink is always ended, even when a frame fails; the first error wins.
fn assemble<S: FrameSink>(
    sink: &mut S,
    staging: &StagingArea,
    cfg: SinkConfig,
    progress: Option<&mut ProgressCallback>,
) -> VidreelResult<()> {
    let canvas = cfg.resolution();
    sink.begin(cfg)?;
    let pushed = push_staged(sink, staging, canvas, progress);
    let ended = sink.end();
    pushed.and(ended)
}

fn push_staged<S: FrameSink>(
    sink: &mut S,
    staging: &StagingArea,
    canvas: Resolution,
    mut progress: Option<&mut ProgressCallback>,
) -> VidreelResult<()> {
    let total = staging.len() as u64;
    for (i, path) in staging.paths().iter().enumerate() {
        let img = StagingArea::load(path)?;
        sink.push_frame(FrameIndex(i as u64), &fit_to_canvas(&img, canvas))?;
        if let Some(cb) = progress.as_mut() {
            cb(ExportProgress {
                done: i as u64 + 1,
                total,
            });
        }
    }
    Ok(())
}

/// `frames / elapsed` rounded to two decimals; zero elapsed time counts as one second.
pub(crate) fn derive_frame_rate(frames: u64, elapsed: Duration) -> VidreelResult<Fps> {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        frames as f64 / secs
    } else {
        frames as f64
    };
    Fps::from_hundredths(rate)
}

#[cfg(test)]
#[path = "../../tests/unit/session/video_session.rs"]
mod tests;
