//! letterlens
//!
//! This crate implements a live camera letter-classification pipeline:
//! frames are pulled from a capture source, reduced to a 28x28 grayscale
//! tile, fed to a pre-trained classifier, and the top-k letter predictions
//! are published with confidence scores. A secondary path submits labeled
//! correction snapshots to a retraining endpoint.
//!
//! # Architecture
//!
//! One cooperative loop drives the whole pipeline; at most one iteration is
//! in flight at a time. Classifier loading runs off-loop on worker threads
//! and lands in a swappable slot that the loop checks each iteration.
//!
//! - `capture`: pull-based frame sources (stub://, http(s):// MJPEG/JPEG)
//! - `tile`: frame-to-28x28 preprocessing
//! - `classify`: classifier backends and the swappable handle slot
//! - `rank`: top-k ranking over the probability vector
//! - `pipeline`: the loop controller state machine
//! - `feedback`: labeled-correction submission
//! - `config`: file + env configuration for the binaries

pub mod capture;
pub mod classify;
pub mod config;
pub mod error;
pub mod feedback;
pub mod frame;
pub mod pipeline;
pub mod rank;
pub mod tile;

pub use capture::{CameraConfig, CameraSource, CameraStats};
pub use classify::{ClassifierBackend, ClassifierSlot, SlotStatus, StubClassifier};
pub use config::LetterlensConfig;
pub use error::{
    CameraError, InferenceError, LoadError, PipelineError, PreprocessError, ReportError,
};
pub use feedback::{FeedbackConfig, FeedbackReporter};
pub use frame::Frame;
pub use pipeline::{
    LoopController, LoopState, PipelineSettings, PipelineSnapshot, StopHandle, TickOutcome,
};
pub use rank::{top_k, Alphabet, Prediction};
pub use tile::{preprocess, Tile, TILE_LEN, TILE_SIDE};

#[cfg(feature = "backend-tract")]
pub use classify::TractClassifier;
