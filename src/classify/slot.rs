//! Swappable classifier handle.
//!
//! The [`ClassifierSlot`] is the only state shared between the loop thread
//! and classifier load workers. The slot is always in one of three states:
//! Absent (no artifact, optionally the last load error), Loading (a worker
//! is producing a backend), or Ready. Loads replace the backend wholesale;
//! there is no partial update. While a load is in flight, `infer` reports
//! the slot as unavailable so the loop skips inference for that window.
//!
//! Every load is stamped with an epoch. A load that finishes after a newer
//! load or install has taken the slot is discarded, so a stale artifact can
//! never clobber a fresh one.

use std::sync::{Arc, Mutex};
use std::thread;

use crate::classify::backend::ClassifierBackend;
use crate::error::{InferenceError, LoadError};
use crate::tile::Tile;

#[derive(Clone)]
pub struct ClassifierSlot {
    inner: Arc<Mutex<Slot>>,
}

struct Slot {
    state: SlotState,
    generation: u64,
    load_epoch: u64,
}

enum SlotState {
    Absent { last_error: Option<String> },
    Loading,
    Ready(Box<dyn ClassifierBackend>),
}

/// Observable slot state, without the backend itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotStatus {
    Absent { last_error: Option<String> },
    Loading,
    Ready { name: &'static str, class_count: usize },
}

impl ClassifierSlot {
    /// A slot with no classifier. The pipeline runs preview-only against it.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Slot {
                state: SlotState::Absent { last_error: None },
                generation: 0,
                load_epoch: 0,
            })),
        }
    }

    /// Install a backend synchronously, replacing whatever the slot held.
    /// Any load still in flight is invalidated.
    pub fn install(&self, backend: Box<dyn ClassifierBackend>) {
        let mut slot = self.lock();
        slot.load_epoch += 1;
        slot.generation += 1;
        slot.state = SlotState::Ready(backend);
    }

    /// Drop the current backend, recording an optional error message.
    pub fn mark_absent(&self, last_error: Option<String>) {
        let mut slot = self.lock();
        slot.load_epoch += 1;
        slot.state = SlotState::Absent { last_error };
    }

    /// Start an asynchronous load (or reload) on a worker thread.
    ///
    /// The current backend is discarded immediately and the slot stays
    /// Loading until the loader resolves. A failed load leaves the slot
    /// Absent with the error recorded; the pipeline degrades to
    /// preview-only rather than stopping.
    pub fn begin_load<F>(&self, loader: F) -> thread::JoinHandle<()>
    where
        F: FnOnce() -> Result<Box<dyn ClassifierBackend>, LoadError> + Send + 'static,
    {
        let epoch = {
            let mut slot = self.lock();
            slot.load_epoch += 1;
            slot.state = SlotState::Loading;
            slot.load_epoch
        };

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let result = loader();
            let mut slot = match inner.lock() {
                Ok(slot) => slot,
                Err(poisoned) => poisoned.into_inner(),
            };
            if slot.load_epoch != epoch {
                // A newer load or install superseded this one.
                return;
            }
            match result {
                Ok(backend) => {
                    log::info!(
                        "classifier: loaded '{}' ({} classes)",
                        backend.name(),
                        backend.class_count()
                    );
                    slot.generation += 1;
                    slot.state = SlotState::Ready(backend);
                }
                Err(e) => {
                    log::warn!("classifier: load failed: {}", e);
                    slot.state = SlotState::Absent {
                        last_error: Some(e.to_string()),
                    };
                }
            }
        })
    }

    /// Run inference when a backend is present.
    ///
    /// `Ok(None)` means the slot is Absent or Loading; the caller skips
    /// this iteration's prediction and keeps going.
    pub fn infer(&self, tile: &Tile) -> Result<Option<Vec<f32>>, InferenceError> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|_| InferenceError::Backend("classifier slot lock poisoned".to_string()))?;
        match &mut slot.state {
            SlotState::Ready(backend) => backend.infer(tile).map(Some),
            SlotState::Absent { .. } | SlotState::Loading => Ok(None),
        }
    }

    pub fn status(&self) -> SlotStatus {
        let slot = self.lock();
        match &slot.state {
            SlotState::Absent { last_error } => SlotStatus::Absent {
                last_error: last_error.clone(),
            },
            SlotState::Loading => SlotStatus::Loading,
            SlotState::Ready(backend) => SlotStatus::Ready {
                name: backend.name(),
                class_count: backend.class_count(),
            },
        }
    }

    /// Bumped on every successful install; lets callers observe that a
    /// post-reload inference used the new backend.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        match self.inner.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::backends::StubClassifier;
    use crate::frame::Frame;
    use crate::tile::preprocess;
    use std::sync::mpsc;

    fn any_tile() -> Tile {
        let frame = Frame::from_rgb8(8, 8, vec![64u8; 8 * 8 * 3]);
        preprocess(&frame, false).unwrap()
    }

    #[test]
    fn empty_slot_skips_inference() {
        let slot = ClassifierSlot::empty();
        assert_eq!(slot.infer(&any_tile()).unwrap(), None);
        assert_eq!(
            slot.status(),
            SlotStatus::Absent { last_error: None }
        );
    }

    #[test]
    fn install_makes_slot_ready() {
        let slot = ClassifierSlot::empty();
        slot.install(Box::new(StubClassifier::new(26, 0)));

        assert_eq!(slot.generation(), 1);
        assert_eq!(
            slot.status(),
            SlotStatus::Ready {
                name: "stub",
                class_count: 26
            }
        );
        let probabilities = slot.infer(&any_tile()).unwrap().expect("ready");
        assert_eq!(probabilities.len(), 26);
    }

    #[test]
    fn failed_load_leaves_slot_absent_with_error() {
        let slot = ClassifierSlot::empty();
        let worker = slot.begin_load(|| {
            Err(LoadError::Missing {
                path: "missing.onnx".to_string(),
            })
        });
        worker.join().unwrap();

        match slot.status() {
            SlotStatus::Absent { last_error } => {
                assert!(last_error.unwrap().contains("missing.onnx"));
            }
            other => panic!("expected absent slot, got {:?}", other),
        }
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn successful_load_swaps_backend_in() {
        let slot = ClassifierSlot::empty();
        let worker = slot.begin_load(|| Ok(Box::new(StubClassifier::new(26, 1)) as Box<dyn ClassifierBackend>));
        worker.join().unwrap();

        assert_eq!(slot.generation(), 1);
        assert!(slot.infer(&any_tile()).unwrap().is_some());
    }

    #[test]
    fn inference_is_suspended_while_loading() {
        let slot = ClassifierSlot::empty();
        slot.install(Box::new(StubClassifier::new(26, 0)));

        let (release_tx, release_rx) = mpsc::channel::<()>();
        let worker = slot.begin_load(move || {
            release_rx.recv().ok();
            Ok(Box::new(StubClassifier::new(26, 2)) as Box<dyn ClassifierBackend>)
        });

        // Mid-reload: the previous backend is already gone and inference
        // reports unavailable instead of racing the load.
        assert_eq!(slot.status(), SlotStatus::Loading);
        assert_eq!(slot.infer(&any_tile()).unwrap(), None);

        release_tx.send(()).unwrap();
        worker.join().unwrap();

        assert_eq!(slot.generation(), 2);
        let probabilities = slot.infer(&any_tile()).unwrap().expect("reloaded");
        assert!((probabilities[2] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn stale_load_cannot_clobber_newer_install() {
        let slot = ClassifierSlot::empty();

        let (release_tx, release_rx) = mpsc::channel::<()>();
        let worker = slot.begin_load(move || {
            release_rx.recv().ok();
            Ok(Box::new(StubClassifier::new(26, 5)) as Box<dyn ClassifierBackend>)
        });

        // A newer install wins the slot before the load resolves.
        slot.install(Box::new(StubClassifier::new(26, 7)));
        let generation = slot.generation();

        release_tx.send(()).unwrap();
        worker.join().unwrap();

        assert_eq!(slot.generation(), generation);
        let probabilities = slot.infer(&any_tile()).unwrap().expect("ready");
        assert!((probabilities[7] - 0.9).abs() < 1e-6);
    }
}
