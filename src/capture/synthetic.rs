//! Synthetic camera for tests and demos (`stub://` URLs).
//!
//! Produces deterministic gradient frames that vary per frame count, so
//! consecutive pulls are distinguishable without any capture hardware.
//! A `warmup` query parameter delays the first frame by that many polls,
//! which lets callers exercise the NotReady path.

use crate::error::CameraError;
use crate::frame::Frame;

use super::{CameraConfig, CameraStats};

pub(super) struct SyntheticCamera {
    config: CameraConfig,
    warmup: u64,
    connected: bool,
    polls: u64,
    frame_count: u64,
}

impl SyntheticCamera {
    pub(super) fn new(config: CameraConfig, warmup: u64) -> Self {
        Self {
            config,
            warmup,
            connected: false,
            polls: 0,
            frame_count: 0,
        }
    }

    /// Synthetic sources are always available.
    pub(super) fn connect(&mut self) -> Result<(), CameraError> {
        self.connected = true;
        log::info!("camera: connected to {} (synthetic)", self.config.url);
        Ok(())
    }

    pub(super) fn current_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        if !self.connected {
            return Err(CameraError::NotConnected);
        }

        self.polls += 1;
        if self.polls <= self.warmup {
            return Ok(None);
        }

        self.frame_count += 1;
        Ok(Some(self.generate_frame()))
    }

    pub(super) fn release(&mut self) {
        self.connected = false;
        self.polls = 0;
    }

    pub(super) fn is_healthy(&self) -> bool {
        self.connected
    }

    pub(super) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }

    /// Deterministic gradient mixing position and frame count, so every
    /// frame differs from the previous one but replays are reproducible.
    fn generate_frame(&self) -> Frame {
        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count * 31) % 256) as u8;
        }
        Frame::from_rgb8(self.config.width, self.config.height, pixels)
    }
}
