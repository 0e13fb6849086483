use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tempfile::TempDir;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{VidreelError, VidreelResult};

/// Temporary directory holding one encoded image per frame, in arrival order.
///
/// The directory is removed by [`StagingArea::close`], or on drop if the session is abandoned.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
    format: ImageFormat,
    extension: String,
    paths: Vec<PathBuf>,
}

impl StagingArea {
    /// Allocate a fresh, uniquely named staging directory.
    pub fn new(extension: &str) -> VidreelResult<Self> {
        let format = staged_image_format(extension)?;
        let dir = tempfile::Builder::new()
            .prefix("vidreel-")
            .tempdir()
            .map_err(|e| VidreelError::io(format!("failed to create staging directory: {e}")))?;
        Ok(Self {
            dir,
            format,
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
            paths: Vec::new(),
        })
    }

    /// The staging directory itself.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Staged frame paths in staging order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of staged frames.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Deterministic file name for frame `idx`.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir
            .path()
            .join(format!("frame_{:08}.{}", idx.0, self.extension))
    }

    /// Encode `img` as frame `idx` and record its path.
    pub fn stage(&mut self, idx: FrameIndex, img: &RgbImage) -> VidreelResult<()> {
        let path = self.frame_path(idx);
        img.save_with_format(&path, self.format).map_err(|e| {
            VidreelError::io(format!(
                "failed to stage frame {} to '{}': {e}",
                idx.0,
                path.display()
            ))
        })?;
        tracing::debug!(frame = idx.0, path = %path.display(), "staged frame");
        self.paths.push(path);
        Ok(())
    }

    /// Decode a staged frame back into RGB.
    pub fn load(path: &Path) -> VidreelResult<RgbImage> {
        let img = image::open(path).map_err(|e| {
            VidreelError::io(format!(
                "failed to read staged frame '{}': {e}",
                path.display()
            ))
        })?;
        Ok(img.to_rgb8())
    }

    /// Delete the directory and everything in it.
    pub fn close(self) -> VidreelResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            VidreelError::io(format!(
                "failed to remove staging directory '{}': {e}",
                path.display()
            ))
        })
    }
}

/// Resolve a staged-image extension to a format the `image` crate can both write and read.
pub fn staged_image_format(extension: &str) -> VidreelResult<ImageFormat> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    let format = ImageFormat::from_extension(&ext).ok_or_else(|| {
        VidreelError::configuration(format!("unknown staged image format '{extension}'"))
    })?;
    if !format.reading_enabled() || !format.writing_enabled() {
        return Err(VidreelError::configuration(format!(
            "staged image format '{extension}' cannot be both written and read back"
        )));
    }
    Ok(format)
}

#[cfg(test)]
#[path = "../../tests/unit/frame/staging.rs"]
mod tests;
