//! Camera frame sources.
//!
//! A [`CameraSource`] wraps a live capture device behind a pull-based
//! interface: `current_frame()` returns the most recent decodable frame, or
//! `None` while the device has not produced one yet. There is no buffering
//! and no history; a frame that is not pulled is simply gone.
//!
//! Backends are selected by URL scheme:
//! - `stub://` - synthetic deterministic frames (tests, demos)
//! - `http://` / `https://` - MJPEG or single-JPEG network cameras

mod http;
mod synthetic;

use std::time::Duration;

use url::Url;

use crate::error::CameraError;
use crate::frame::Frame;

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Stream URL. Supported schemes: stub://, http(s)://.
    pub url: String,
    /// Target frame rate. The source decimates to this rate; pulls between
    /// intervals return the cached latest frame.
    pub target_fps: u32,
    /// Frame width (synthetic frames only; network frames carry their own).
    pub width: u32,
    /// Frame height (synthetic frames only).
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: "stub://letterlens".to_string(),
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

/// Pull-based camera source.
pub struct CameraSource {
    backend: CameraBackend,
}

impl std::fmt::Debug for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSource").finish_non_exhaustive()
    }
}

enum CameraBackend {
    Synthetic(synthetic::SyntheticCamera),
    Http(http::HttpCamera),
}

impl CameraSource {
    /// Build a source for the configured URL. The scheme picks the backend;
    /// anything other than stub:// or http(s):// is rejected.
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        let url = Url::parse(&config.url).map_err(|e| CameraError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        let backend = match url.scheme() {
            "stub" => CameraBackend::Synthetic(synthetic::SyntheticCamera::new(
                config,
                warmup_polls(&url),
            )),
            "http" | "https" => CameraBackend::Http(http::HttpCamera::new(config)),
            other => {
                return Err(CameraError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        };

        Ok(Self { backend })
    }

    /// Request access to the capture device or stream.
    pub fn connect(&mut self) -> Result<(), CameraError> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            CameraBackend::Http(source) => source.connect(),
        }
    }

    /// The most recent decodable frame, or `None` until one exists.
    pub fn current_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.current_frame(),
            CameraBackend::Http(source) => source.current_frame(),
        }
    }

    /// Release the capture device. Idempotent; `connect()` may be called
    /// again afterwards.
    pub fn release(&mut self) {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.release(),
            CameraBackend::Http(source) => source.release(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            CameraBackend::Http(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            CameraBackend::Http(source) => source.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub url: String,
}

/// `warmup` query parameter: number of polls that report NotReady before the
/// synthetic source produces its first frame.
fn warmup_polls(url: &Url) -> u64 {
    url.query_pairs()
        .find(|(key, _)| key == "warmup")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(0)
}

pub(crate) fn frame_interval(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::from_millis(0)
    } else {
        Duration::from_millis((1000 / target_fps).max(1) as u64)
    }
}

pub(crate) fn health_grace(target_fps: u32) -> Duration {
    let base_ms = if target_fps == 0 {
        2_000
    } else {
        (1000 / target_fps).saturating_mul(6)
    };
    Duration::from_millis(base_ms.max(2_000) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config(url: &str) -> CameraConfig {
        CameraConfig {
            url: url.to_string(),
            target_fps: 0,
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn stub_source_produces_frames_after_connect() {
        let mut source = CameraSource::new(stub_config("stub://test")).unwrap();
        source.connect().unwrap();

        let frame = source.current_frame().unwrap().expect("frame");
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.byte_len(), 64 * 48 * 3);
    }

    #[test]
    fn warmup_polls_report_not_ready() {
        let mut source = CameraSource::new(stub_config("stub://test?warmup=2")).unwrap();
        source.connect().unwrap();

        assert!(source.current_frame().unwrap().is_none());
        assert!(source.current_frame().unwrap().is_none());
        assert!(source.current_frame().unwrap().is_some());
    }

    #[test]
    fn frames_vary_over_time() {
        let mut source = CameraSource::new(stub_config("stub://test")).unwrap();
        source.connect().unwrap();

        let first = source.current_frame().unwrap().expect("frame");
        let second = source.current_frame().unwrap().expect("frame");
        assert_ne!(first.pixels(), second.pixels());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = CameraSource::new(stub_config("rtsp://camera")).unwrap_err();
        assert!(matches!(err, CameraError::UnsupportedScheme { .. }));
    }

    #[test]
    fn unparseable_url_is_rejected() {
        let err = CameraSource::new(stub_config("not a url")).unwrap_err();
        assert!(matches!(err, CameraError::InvalidUrl { .. }));
    }

    #[test]
    fn poll_before_connect_is_an_error() {
        let mut source = CameraSource::new(stub_config("stub://test")).unwrap();
        assert!(matches!(
            source.current_frame(),
            Err(CameraError::NotConnected)
        ));
    }

    #[test]
    fn release_then_reconnect() {
        let mut source = CameraSource::new(stub_config("stub://test")).unwrap();
        source.connect().unwrap();
        assert!(source.current_frame().unwrap().is_some());

        source.release();
        assert!(matches!(
            source.current_frame(),
            Err(CameraError::NotConnected)
        ));

        source.connect().unwrap();
        assert!(source.current_frame().unwrap().is_some());
    }
}
