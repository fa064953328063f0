//! Error taxonomy for the capture-to-prediction pipeline.
//!
//! Camera and classifier-load failures are surfaced to callers so they can
//! retry or degrade; everything that can go wrong inside a single loop
//! iteration is wrapped in [`PipelineError`] and caught at the tick boundary.

use thiserror::Error;

/// Failures while opening or reading a camera stream.
///
/// Fatal to `start()`; recoverable by calling `start()` again.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("unsupported camera scheme '{scheme}'; expected stub:// or http(s)://")]
    UnsupportedScheme { scheme: String },

    #[error("invalid camera url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to connect to camera stream {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("camera stream failed: {0}")]
    Stream(String),

    #[error("camera not connected; call connect() first")]
    NotConnected,
}

/// Failures while loading a classifier artifact.
///
/// Non-fatal to the pipeline: the loop keeps refreshing the tile preview
/// with an empty prediction set until a later load succeeds.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("classifier artifact not found at {path}")]
    Missing { path: String },

    #[error("failed to load classifier artifact {path}: {reason}")]
    Artifact { path: String, reason: String },

    #[error("classifier support for '{kind}' is not compiled in")]
    BackendUnavailable { kind: String },
}

/// Failures turning a frame into a 28x28 tile.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("degenerate frame dimensions {width}x{height}")]
    DegenerateFrame { width: u32, height: u32 },

    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} rgb")]
    BufferMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Failures during a single inference call.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference failed: {0}")]
    Backend(String),

    #[error("classifier output had {actual} values, expected {expected}")]
    OutputShape { expected: usize, actual: usize },
}

/// Failures submitting a labeled correction snapshot.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to encode correction snapshot: {0}")]
    Encode(String),

    #[error("failed to reach feedback endpoint {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("feedback endpoint rejected submission with status {status}")]
    Rejected { status: u16 },
}

/// Per-iteration fault, caught at the tick boundary.
///
/// A `PipelineError` never terminates the loop; the controller records it
/// and proceeds with the next scheduled iteration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("camera stream fault: {0}")]
    Camera(#[from] CameraError),
}
