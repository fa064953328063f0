//! submit_correction - send a labeled correction image to the feedback endpoint.
//!
//! Reads a PNG or JPEG from disk, wraps it as a data URI, and POSTs it with
//! its letter label so the model can be retrained on the correction later.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use letterlens::{FeedbackConfig, FeedbackReporter, Frame};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Submit a labeled correction image to the letterlens feedback endpoint"
)]
struct Args {
    /// Path to the correction image (png or jpeg).
    image: PathBuf,

    /// Letter label for the image (A-Z).
    #[arg(long)]
    label: String,

    /// Feedback endpoint URL.
    #[arg(
        long,
        env = "LETTERLENS_FEEDBACK_URL",
        default_value = "http://127.0.0.1:8799/corrections"
    )]
    url: String,

    /// Shared secret for the endpoint.
    #[arg(long, env = "LETTERLENS_FEEDBACK_SECRET")]
    secret: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let label = args.label.trim().to_uppercase();
    if label.len() != 1 || !label.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(anyhow!(
            "label must be a single letter A-Z, got '{}'",
            args.label
        ));
    }

    let image = image::open(&args.image)
        .with_context(|| format!("failed to open image {}", args.image.display()))?
        .into_rgb8();
    let (width, height) = image.dimensions();
    let frame = Frame::from_rgb8(width, height, image.into_raw());

    let reporter = FeedbackReporter::new(FeedbackConfig {
        url: args.url.clone(),
        shared_secret: args.secret,
    });
    reporter
        .submit(&frame, &label)
        .with_context(|| format!("submission to {} failed", args.url))?;

    println!(
        "submitted correction '{}' from {}",
        label,
        args.image.display()
    );
    Ok(())
}
