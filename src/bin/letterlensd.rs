//! letterlensd - letter classification daemon
//!
//! This daemon:
//! 1. Pulls frames from the configured camera source
//! 2. Reduces each frame to a 28x28 grayscale tile
//! 3. Runs the loaded classifier (when present) and ranks the top-k letters
//! 4. Logs predictions and source health
//!
//! The camera is independent of the model: when no classifier is configured
//! or the artifact fails to load, the loop keeps refreshing the tile preview
//! with an empty prediction set.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use letterlens::config::ClassifierSettings;
use letterlens::{CameraSource, ClassifierSlot, LetterlensConfig, LoopController, TickOutcome};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = LetterlensConfig::load()?;

    let camera = CameraSource::new(cfg.camera.clone())?;
    let classifier = ClassifierSlot::empty();
    start_model_load(&classifier, &cfg.classifier);

    let mut controller = LoopController::new(camera, classifier.clone(), cfg.pipeline_settings());
    let stop = controller.stop_handle();
    ctrlc::set_handler(move || stop.request_stop()).context("install ctrl-c handler")?;

    controller.start()?;
    log::info!(
        "letterlensd running: camera={} fps={} invert={} top_k={}",
        cfg.camera.url,
        cfg.camera.target_fps,
        cfg.classifier.invert,
        cfg.classifier.top_k
    );

    let interval = Duration::from_millis((1000 / cfg.camera.target_fps.max(1)).max(1) as u64);
    let mut last_health_log = Instant::now();

    loop {
        let started = Instant::now();
        if controller.tick() == TickOutcome::Stopped {
            break;
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            let stats = controller.camera_stats();
            let snapshot = controller.snapshot();
            log::info!(
                "camera health={} frames={} url={}",
                controller.camera_is_healthy(),
                stats.frames_captured,
                stats.url
            );
            log::info!(
                "pipeline ticks={} idle={} processed={} classifier={:?}",
                snapshot.ticks,
                snapshot.idle_ticks,
                snapshot.frames_processed,
                classifier.status()
            );
            if let Some(best) = snapshot.predictions.first() {
                log::info!("top prediction: {} ({:.2})", best.label, best.probability);
            }
            last_health_log = Instant::now();
        }

        let elapsed = started.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    controller.stop();
    log::info!("letterlensd stopped");
    Ok(())
}

/// Kick off the asynchronous model load when one is configured.
#[cfg(feature = "backend-tract")]
fn start_model_load(classifier: &ClassifierSlot, settings: &ClassifierSettings) {
    use letterlens::{ClassifierBackend, TractClassifier};

    let Some(path) = settings.model_path.clone() else {
        log::info!("no classifier model configured; running preview-only");
        return;
    };
    let classes = settings.classes;
    log::info!("loading classifier from {}", path.display());
    classifier.begin_load(move || {
        TractClassifier::load(&path, classes)
            .map(|backend| Box::new(backend) as Box<dyn ClassifierBackend>)
    });
}

#[cfg(not(feature = "backend-tract"))]
fn start_model_load(classifier: &ClassifierSlot, settings: &ClassifierSettings) {
    use letterlens::LoadError;

    match &settings.model_path {
        Some(path) => {
            let error = LoadError::BackendUnavailable {
                kind: "onnx".to_string(),
            };
            log::warn!(
                "model configured at {} but {}; running preview-only",
                path.display(),
                error
            );
            classifier.mark_absent(Some(error.to_string()));
        }
        None => log::info!("no classifier model configured; running preview-only"),
    }
}
