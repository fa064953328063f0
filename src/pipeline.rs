//! Loop controller.
//!
//! Drives camera -> tile -> classifier -> ranking once per tick while the
//! controller is running. The whole pipeline is cooperative: at most one
//! iteration is ever in flight, and the next tick is only driven after the
//! previous one (including its inference call) has completed, so the
//! per-iteration buffers need no locking.
//!
//! `stop()` clears a liveness flag that every tick checks before doing any
//! work; an iteration that was already queued when `stop()` ran therefore
//! touches nothing. The camera is independent of the model: `start()`
//! succeeds and the tile preview keeps refreshing while the classifier slot
//! is absent or still loading.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::CameraSource;
use crate::classify::ClassifierSlot;
use crate::error::{CameraError, PipelineError};
use crate::rank::{top_k, Alphabet, Prediction};
use crate::tile::{preprocess, Tile};

/// Per-run pipeline settings.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Invert tile values (1 - v) before inference.
    pub invert: bool,
    /// How many predictions to publish per iteration.
    pub top_k: usize,
    /// Class-index-to-letter mapping.
    pub alphabet: Alphabet,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            invert: true,
            top_k: 3,
            alphabet: Alphabet::default(),
        }
    }
}

/// Loop controller states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Camera not running.
    Idle,
    /// Camera requested, loop not yet ticking.
    Starting,
    /// Camera active, ticks do work.
    Running,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Liveness flag was clear; nothing ran.
    Stopped,
    /// Camera has not produced a frame yet; rescheduled with no work done.
    NotReady,
    /// A per-iteration fault was recorded; the loop keeps running.
    Faulted,
    /// Tile preview refreshed; no classifier available.
    PreviewOnly,
    /// Tile preview refreshed and a new prediction set published.
    Classified,
}

/// State published by the loop, replaced (never merged) each iteration.
#[derive(Debug, Default)]
pub struct PipelineSnapshot {
    /// Most recent preprocessed tile, refreshed every productive tick.
    pub tile: Option<Tile>,
    /// Current prediction set, best first. Empty until the classifier has
    /// produced at least one ranking.
    pub predictions: Vec<Prediction>,
    /// Classifier generation that produced `predictions`.
    pub prediction_generation: u64,
    pub ticks: u64,
    pub idle_ticks: u64,
    pub frames_processed: u64,
    /// Last per-iteration fault, overwritten by the next one.
    pub last_error: Option<PipelineError>,
}

/// Clears the loop's liveness flag from another thread (signal handlers).
#[derive(Clone)]
pub struct StopHandle {
    live: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Drives the frame -> tile -> probabilities -> top-k pipeline.
pub struct LoopController {
    camera: CameraSource,
    classifier: ClassifierSlot,
    settings: PipelineSettings,
    state: LoopState,
    live: Arc<AtomicBool>,
    snapshot: PipelineSnapshot,
}

impl LoopController {
    pub fn new(camera: CameraSource, classifier: ClassifierSlot, settings: PipelineSettings) -> Self {
        Self {
            camera,
            classifier,
            settings,
            state: LoopState::Idle,
            live: Arc::new(AtomicBool::new(false)),
            snapshot: PipelineSnapshot::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn snapshot(&self) -> &PipelineSnapshot {
        &self.snapshot
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            live: Arc::clone(&self.live),
        }
    }

    pub fn camera_stats(&self) -> crate::capture::CameraStats {
        self.camera.stats()
    }

    pub fn camera_is_healthy(&self) -> bool {
        self.camera.is_healthy()
    }

    /// Request camera access and begin running.
    ///
    /// No-op when already running. On camera failure the controller returns
    /// to Idle and the error is surfaced; calling `start()` again retries.
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.state == LoopState::Running {
            return Ok(());
        }

        self.state = LoopState::Starting;
        match self.camera.connect() {
            Ok(()) => {
                self.live.store(true, Ordering::SeqCst);
                self.state = LoopState::Running;
                Ok(())
            }
            Err(e) => {
                self.state = LoopState::Idle;
                Err(e)
            }
        }
    }

    /// Stop the loop and release the camera. Idempotent.
    pub fn stop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if self.state != LoopState::Idle {
            self.camera.release();
            self.state = LoopState::Idle;
        }
    }

    /// Run one iteration.
    ///
    /// The liveness check comes first: a tick that fires after `stop()` (or
    /// after a stop handle was triggered) mutates no state. Faults inside
    /// the iteration are recorded in the snapshot and never escape.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.live.load(Ordering::SeqCst) {
            if self.state != LoopState::Idle {
                // Stop was requested from a handle; finish the transition.
                self.camera.release();
                self.state = LoopState::Idle;
            }
            return TickOutcome::Stopped;
        }
        if self.state != LoopState::Running {
            return TickOutcome::Stopped;
        }

        self.snapshot.ticks += 1;

        let frame = match self.camera.current_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.snapshot.idle_ticks += 1;
                return TickOutcome::NotReady;
            }
            Err(e) => {
                log::warn!("pipeline: camera fault: {}", e);
                self.snapshot.last_error = Some(PipelineError::Camera(e));
                return TickOutcome::Faulted;
            }
        };

        let tile = match preprocess(&frame, self.settings.invert) {
            Ok(tile) => tile,
            Err(e) => {
                log::warn!("pipeline: preprocess fault: {}", e);
                self.snapshot.last_error = Some(PipelineError::Preprocess(e));
                return TickOutcome::Faulted;
            }
        };

        // The preview refreshes whether or not a classifier is present.
        self.snapshot.frames_processed += 1;
        self.snapshot.tile = Some(tile.clone());

        match self.classifier.infer(&tile) {
            Ok(Some(probabilities)) => {
                self.snapshot.predictions =
                    top_k(&probabilities, self.settings.top_k, &self.settings.alphabet);
                self.snapshot.prediction_generation = self.classifier.generation();
                TickOutcome::Classified
            }
            Ok(None) => TickOutcome::PreviewOnly,
            Err(e) => {
                // Keep the previous prediction set on display.
                log::warn!("pipeline: inference fault: {}", e);
                self.snapshot.last_error = Some(PipelineError::Inference(e));
                TickOutcome::Faulted
            }
        }
    }

    /// Drive ticks at `interval` until the liveness flag clears.
    ///
    /// Returns once stopped, with the camera released.
    pub fn run(&mut self, interval: Duration) {
        loop {
            let started = Instant::now();
            if self.tick() == TickOutcome::Stopped {
                return;
            }
            let elapsed = started.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
    }
}
