//! Correction feedback reporter.
//!
//! Submits a labeled snapshot to the retraining endpoint: the frame is
//! PNG-encoded, wrapped as a `data:image/png;base64,...` URI, and POSTed as
//! JSON together with the user-supplied letter label. A shared-secret
//! header gives the endpoint coarse authentication. Submission is
//! fire-and-forget: failures are surfaced to the caller, there is no retry.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::ReportError;
use crate::frame::Frame;

const SECRET_HEADER: &str = "x-correction-secret";

/// Configuration for the feedback endpoint.
#[derive(Clone, Debug)]
pub struct FeedbackConfig {
    /// HTTP POST target.
    pub url: String,
    /// Optional shared secret sent in the `x-correction-secret` header.
    pub shared_secret: Option<String>,
}

/// Client for the correction endpoint.
pub struct FeedbackReporter {
    config: FeedbackConfig,
}

impl FeedbackReporter {
    pub fn new(config: FeedbackConfig) -> Self {
        Self { config }
    }

    /// Submit one labeled snapshot. Success means the endpoint answered 2xx.
    pub fn submit(&self, snapshot: &Frame, label: &str) -> Result<(), ReportError> {
        let data_url = snapshot_data_url(snapshot)?;
        let body = request_body(&data_url, label);

        let mut request = ureq::post(&self.config.url).set("Content-Type", "application/json");
        if let Some(secret) = &self.config.shared_secret {
            request = request.set(SECRET_HEADER, secret);
        }

        match request.send_string(&body) {
            Ok(_) => {
                log::info!(
                    "feedback: submitted correction '{}' to {}",
                    label,
                    self.config.url
                );
                Ok(())
            }
            Err(ureq::Error::Status(status, _)) => Err(ReportError::Rejected { status }),
            Err(e) => Err(ReportError::Transport {
                url: self.config.url.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// PNG-encode a frame and wrap it as a data URI.
fn snapshot_data_url(frame: &Frame) -> Result<String, ReportError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(ReportError::Encode(format!(
            "degenerate snapshot dimensions {}x{}",
            frame.width(),
            frame.height()
        )));
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            frame.pixels(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ReportError::Encode(e.to_string()))?;

    Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}

fn request_body(data_url: &str, label: &str) -> String {
    serde_json::json!({
        "imageDataUrl": data_url,
        "label": label,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Frame {
        let mut pixels = Vec::with_capacity(12 * 8 * 3);
        for i in 0..(12 * 8) {
            pixels.extend_from_slice(&[(i % 256) as u8, 10, 200]);
        }
        Frame::from_rgb8(12, 8, pixels)
    }

    #[test]
    fn data_url_decodes_back_to_the_snapshot() {
        let frame = snapshot();
        let data_url = snapshot_data_url(&frame).unwrap();

        let encoded = data_url
            .strip_prefix("data:image/png;base64,")
            .expect("data uri prefix");
        let png = BASE64.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().into_rgb8();

        assert_eq!(decoded.dimensions(), (12, 8));
        assert_eq!(decoded.into_raw(), frame.pixels());
    }

    #[test]
    fn request_body_carries_image_and_label() {
        let body = request_body("data:image/png;base64,QUJD", "G");
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(parsed["imageDataUrl"], "data:image/png;base64,QUJD");
        assert_eq!(parsed["label"], "G");
    }

    #[test]
    fn degenerate_snapshot_fails_to_encode() {
        let frame = Frame::from_rgb8(0, 0, Vec::new());
        assert!(matches!(
            snapshot_data_url(&frame),
            Err(ReportError::Encode(_))
        ));
    }
}
