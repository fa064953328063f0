//! demo - end-to-end synthetic run of the letterlens pipeline
//!
//! Drives the loop controller against the stub camera and stub classifier,
//! printing the ranked predictions each iteration. No hardware or model
//! artifact required.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use letterlens::{
    CameraConfig, CameraSource, ClassifierSlot, LoopController, PipelineSettings, StubClassifier,
    TickOutcome,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of loop iterations to run.
    #[arg(long, default_value_t = 30)]
    ticks: u64,

    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Class index the stub classifier peaks at (11 -> 'L').
    #[arg(long, default_value_t = 11)]
    peak: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }

    let camera = CameraSource::new(CameraConfig {
        url: "stub://demo?warmup=3".to_string(),
        target_fps: args.fps,
        width: 320,
        height: 240,
    })?;
    let classifier = ClassifierSlot::empty();
    classifier.install(Box::new(StubClassifier::new(26, args.peak)));

    let mut controller = LoopController::new(camera, classifier, PipelineSettings::default());
    controller.start()?;

    let interval = Duration::from_millis((1000 / args.fps).max(1) as u64);
    let mut classified = 0u64;

    for _ in 0..args.ticks {
        match controller.tick() {
            TickOutcome::Stopped => break,
            TickOutcome::NotReady => println!("waiting for first frame..."),
            TickOutcome::Classified => {
                classified += 1;
                let snapshot = controller.snapshot();
                let ranked: Vec<String> = snapshot
                    .predictions
                    .iter()
                    .map(|p| format!("{} {:.2}", p.label, p.probability))
                    .collect();
                println!("tick {:>3}: {}", snapshot.ticks, ranked.join("  "));
            }
            _ => {}
        }
        std::thread::sleep(interval);
    }

    controller.stop();
    println!("done: {} classified iterations", classified);
    Ok(())
}
