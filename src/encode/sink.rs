use std::path::Path;

use image::RgbImage;

use crate::foundation::core::{Fps, FrameIndex, Resolution};
use crate::foundation::error::{VidreelError, VidreelResult};

/// Output stream parameters, fixed when the stream is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Playback rate of the stream.
    pub fps: Fps,
}

impl SinkConfig {
    /// Config for frames of `resolution` played at `fps`.
    pub fn new(resolution: Resolution, fps: Fps) -> Self {
        Self {
            width: resolution.width,
            height: resolution.height,
            fps,
        }
    }

    /// Width and height as a [`Resolution`].
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Destination of an encoded frame stream.
///
/// A stream is `begin`, zero or more `push_frame` calls with strictly increasing indices and
/// frames already sized to the config, then `end`.
pub trait FrameSink: Send {
    /// Open the stream.
    fn begin(&mut self, cfg: SinkConfig) -> VidreelResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> VidreelResult<()>;
    /// Flush and close the stream.
    fn end(&mut self) -> VidreelResult<()>;
    /// Short container/codec description for reports.
    fn format_name(&self) -> &str;
    /// File the stream is written to, if any. Sessions stat it for the export report.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// Keeps every pushed frame in memory. Useful for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, RgbImage)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config passed to the last `begin`.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[(FrameIndex, RgbImage)] {
        &self.frames
    }

    /// Return `true` once `end` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> VidreelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> VidreelResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| VidreelError::state("frame pushed before begin"))?;
        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(VidreelError::validation(format!(
                "expected a {}x{} frame, got {}x{}",
                cfg.width,
                cfg.height,
                frame.width(),
                frame.height()
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> VidreelResult<()> {
        self.finished = true;
        Ok(())
    }

    fn format_name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
