//! Frame buffers and on-disk staging.

/// In-memory frame buffer and channel handling.
pub mod buffer;
/// Temporary per-frame image staging for deferred export.
pub mod staging;
