use std::path::PathBuf;

use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{VidreelError, VidreelResult};
use crate::frame::staging::staged_image_format;

/// Output frame rate, fixed up front or derived at export.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameRate {
    /// `frame_count / elapsed_secs`, rounded to two decimals.
    #[default]
    Auto,
    /// Used exactly (`23.976` stays 2997/125); see [`Fps::from_rate`].
    Fixed(f64),
}

/// Output resolution, fixed up front or grown to fit every frame seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSetting {
    /// Largest width and largest height among all frames.
    #[default]
    Auto,
    /// Every frame is fitted onto this canvas.
    Fixed(Resolution),
}

/// When frames reach the output stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Stream every frame into an output opened at construction.
    Immediate,
    /// Stage every frame on disk and assemble at export.
    #[default]
    Deferred,
}

/// Construction parameters of a [`VideoSession`](crate::VideoSession).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionOpts {
    /// Video file written at export.
    pub output_path: PathBuf,
    pub frame_rate: FrameRate,
    pub resolution: ResolutionSetting,
    pub export_mode: ExportMode,
    /// Extension (and so image format) of staged frames.
    pub staged_image_format: String,
    /// Force an export once this many hours pass between first and latest frame. `0` disables.
    pub duration_cap_hours: f64,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("vidreel.mp4"),
            frame_rate: FrameRate::Auto,
            resolution: ResolutionSetting::Auto,
            export_mode: ExportMode::Deferred,
            staged_image_format: "jpg".to_string(),
            duration_cap_hours: 0.0,
        }
    }
}

impl SessionOpts {
    /// Defaults for everything except the output path.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Set [`frame_rate`](Self::frame_rate).
    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set [`resolution`](Self::resolution).
    pub fn with_resolution(mut self, resolution: ResolutionSetting) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set [`export_mode`](Self::export_mode).
    pub fn with_export_mode(mut self, export_mode: ExportMode) -> Self {
        self.export_mode = export_mode;
        self
    }

    /// Set the staged image extension, e.g. `"png"` for lossless staging.
    pub fn with_staged_image_format(mut self, ext: impl Into<String>) -> Self {
        self.staged_image_format = ext.into();
        self
    }

    /// Set [`duration_cap_hours`](Self::duration_cap_hours).
    pub fn with_duration_cap_hours(mut self, hours: f64) -> Self {
        self.duration_cap_hours = hours;
        self
    }

    /// The cap in hours, if enabled.
    pub fn duration_cap(&self) -> Option<f64> {
        (self.duration_cap_hours > 0.0).then_some(self.duration_cap_hours)
    }

    /// Reject option combinations a session cannot honor.
    pub fn validate(&self) -> VidreelResult<()> {
        if self.export_mode == ExportMode::Immediate {
            if self.frame_rate == FrameRate::Auto {
                return Err(VidreelError::configuration(
                    "immediate export needs a fixed frame rate; automatic frame rate requires deferred export",
                ));
            }
            if self.resolution == ResolutionSetting::Auto {
                return Err(VidreelError::configuration(
                    "immediate export needs a fixed resolution; automatic resolution requires deferred export",
                ));
            }
        }
        if let FrameRate::Fixed(rate) = self.frame_rate {
            Fps::from_rate(rate).map_err(|e| VidreelError::configuration(e.to_string()))?;
        }
        if let ResolutionSetting::Fixed(res) = self.resolution
            && res.is_empty()
        {
            return Err(VidreelError::configuration(format!(
                "fixed resolution must be non-zero, got {res}"
            )));
        }
        if !self.duration_cap_hours.is_finite() || self.duration_cap_hours < 0.0 {
            return Err(VidreelError::configuration(format!(
                "duration_cap_hours must be finite and >= 0, got {}",
                self.duration_cap_hours
            )));
        }
        staged_image_format(&self.staged_image_format)?;
        if self.output_path.as_os_str().is_empty() {
            return Err(VidreelError::configuration("output_path must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
