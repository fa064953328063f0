//! HTTP camera source (`http://` / `https://` URLs).
//!
//! Supports cameras that stream multipart MJPEG and cameras that serve a
//! fresh JPEG per request. JPEG frames are decoded in memory; the most
//! recent decoded frame is cached so pulls between frame intervals still
//! observe "the current frame". A frame that fails to decode is skipped
//! and the cached frame is returned instead.

use std::io::Read;
use std::time::{Duration, Instant};

use crate::error::CameraError;
use crate::frame::Frame;

use super::{frame_interval, health_grace, CameraConfig, CameraStats};

const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;

pub(super) struct HttpCamera {
    config: CameraConfig,
    stream: Option<HttpStream>,
    latest: Option<Frame>,
    last_frame_at: Option<Instant>,
    connected_at: Option<Instant>,
    frame_count: u64,
    decode_errors: u64,
}

enum HttpStream {
    Mjpeg(MjpegStream),
    SingleJpeg,
}

impl HttpCamera {
    pub(super) fn new(config: CameraConfig) -> Self {
        Self {
            config,
            stream: None,
            latest: None,
            last_frame_at: None,
            connected_at: None,
            frame_count: 0,
            decode_errors: 0,
        }
    }

    pub(super) fn connect(&mut self) -> Result<(), CameraError> {
        let response = ureq::get(&self.config.url)
            .call()
            .map_err(|e| CameraError::Connect {
                url: self.config.url.clone(),
                reason: e.to_string(),
            })?;

        let content_type = response.header("Content-Type").unwrap_or("");
        if content_type.to_lowercase().contains("multipart") {
            let reader = response.into_reader();
            self.stream = Some(HttpStream::Mjpeg(MjpegStream::new(reader)));
        } else {
            self.stream = Some(HttpStream::SingleJpeg);
        }
        self.connected_at = Some(Instant::now());
        log::info!("camera: connected to {}", self.config.url);
        Ok(())
    }

    pub(super) fn current_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(CameraError::NotConnected);
        };

        // Decimate to target_fps: between intervals the cached frame is
        // still "the most recent frame".
        let min_interval = frame_interval(self.config.target_fps);
        if let Some(last) = self.last_frame_at {
            if last.elapsed() < min_interval {
                return Ok(self.latest.clone());
            }
        }

        let jpeg_bytes = match stream {
            HttpStream::Mjpeg(stream) => stream.read_next_jpeg(),
            HttpStream::SingleJpeg => fetch_single_jpeg(&self.config.url),
        }?;

        match decode_jpeg(&jpeg_bytes) {
            Ok(frame) => {
                self.frame_count += 1;
                self.last_frame_at = Some(Instant::now());
                self.latest = Some(frame.clone());
                Ok(Some(frame))
            }
            Err(reason) => {
                self.decode_errors += 1;
                log::warn!("camera: dropped undecodable frame: {}", reason);
                Ok(self.latest.clone())
            }
        }
    }

    pub(super) fn release(&mut self) {
        self.stream = None;
        self.latest = None;
        self.last_frame_at = None;
        self.connected_at = None;
    }

    pub(super) fn is_healthy(&self) -> bool {
        let Some(connected_at) = self.connected_at else {
            return false;
        };
        let Some(last_frame_at) = self.last_frame_at else {
            return connected_at.elapsed() <= Duration::from_secs(5);
        };
        last_frame_at.elapsed() <= health_grace(self.config.target_fps)
    }

    pub(super) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}

struct MjpegStream {
    reader: Box<dyn Read + Send + Sync>,
    buffer: Vec<u8>,
}

impl MjpegStream {
    fn new(reader: Box<dyn Read + Send + Sync>) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    fn read_next_jpeg(&mut self) -> Result<Vec<u8>, CameraError> {
        let mut chunk = vec![0u8; 8192];
        loop {
            if let Some((start, end)) = find_jpeg_bounds(&self.buffer) {
                let frame = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(frame);
            }

            let read = self
                .reader
                .read(&mut chunk)
                .map_err(|e| CameraError::Stream(format!("read mjpeg chunk: {}", e)))?;
            if read == 0 {
                return Err(CameraError::Stream("mjpeg stream ended".to_string()));
            }
            self.buffer.extend_from_slice(&chunk[..read]);

            if self.buffer.len() > MAX_JPEG_BYTES * 2 {
                let keep = 2.min(self.buffer.len());
                let drain_len = self.buffer.len() - keep;
                self.buffer.drain(..drain_len);
            }
        }
    }
}

fn fetch_single_jpeg(url: &str) -> Result<Vec<u8>, CameraError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| CameraError::Stream(format!("fetch jpeg snapshot from {}: {}", url, e)))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| CameraError::Stream(format!("read jpeg snapshot: {}", e)))?;
    if bytes.is_empty() {
        return Err(CameraError::Stream("empty jpeg snapshot".to_string()));
    }
    Ok(bytes)
}

fn decode_jpeg(bytes: &[u8]) -> Result<Frame, String> {
    let image = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgb = image.into_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::from_rgb8(width, height, rgb.into_raw()))
}

fn find_jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut start = None;
    let mut i = 0;
    while i + 1 < buffer.len() {
        if buffer[i] == 0xFF && buffer[i + 1] == 0xD8 {
            start = Some(i);
            break;
        }
        i += 1;
    }
    let start = start?;
    let mut j = start + 2;
    while j + 1 < buffer.len() {
        if buffer[j] == 0xFF && buffer[j + 1] == 0xD9 {
            return Some((start, j + 2));
        }
        j += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_bounds_found_inside_multipart_noise() {
        let mut buffer = b"--boundary\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        let payload_start = buffer.len();
        buffer.extend_from_slice(&[0xFF, 0xD8, 0x01, 0x02, 0x03, 0xFF, 0xD9]);
        buffer.extend_from_slice(b"\r\n--boundary");

        let (start, end) = find_jpeg_bounds(&buffer).expect("bounds");
        assert_eq!(start, payload_start);
        assert_eq!(&buffer[start..start + 2], &[0xFF, 0xD8]);
        assert_eq!(&buffer[end - 2..end], &[0xFF, 0xD9]);
    }

    #[test]
    fn incomplete_jpeg_yields_no_bounds() {
        let buffer = [0xFF, 0xD8, 0x01, 0x02];
        assert!(find_jpeg_bounds(&buffer).is_none());
    }

    #[test]
    fn undecodable_bytes_are_reported() {
        assert!(decode_jpeg(b"definitely not a jpeg").is_err());
    }
}
