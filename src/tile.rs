//! Tile preprocessing.
//!
//! Every loop iteration reduces the current frame to a fixed 28x28
//! single-channel tile with values in [0, 1], the only input layout the
//! classifier accepts. Resampling is nearest-neighbor so identical frames
//! always produce identical tiles. Grayscale reduction uses the `image`
//! crate's weighted luma; the choice is fixed for the whole crate.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::PreprocessError;
use crate::frame::Frame;

/// Tile edge length in pixels.
pub const TILE_SIDE: u32 = 28;

/// Number of values in a tile (28 * 28, one channel).
pub const TILE_LEN: usize = (TILE_SIDE * TILE_SIDE) as usize;

/// Fixed 28x28x1 normalized classifier input, recomputed every iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    values: Vec<f32>,
}

impl Tile {
    fn from_values(values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), TILE_LEN);
        Self { values }
    }

    /// Row-major values in [0, 1].
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at (x, y). Panics when out of the 28x28 range.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        assert!(x < TILE_SIDE && y < TILE_SIDE);
        self.values[(y * TILE_SIDE + x) as usize]
    }
}

/// Reduce a frame to a 28x28 grayscale tile.
///
/// Steps: nearest-neighbor resize to 28x28, weighted-luma grayscale,
/// scale 0-255 to [0, 1], then optional inversion (1 - v).
///
/// Fails only for degenerate input: zero width/height, or a pixel buffer
/// that does not match the declared dimensions.
pub fn preprocess(frame: &Frame, invert: bool) -> Result<Tile, PreprocessError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(PreprocessError::DegenerateFrame {
            width: frame.width(),
            height: frame.height(),
        });
    }

    let expected = (frame.width() as usize) * (frame.height() as usize) * 3;
    if frame.byte_len() != expected {
        return Err(PreprocessError::BufferMismatch {
            width: frame.width(),
            height: frame.height(),
            expected,
            actual: frame.byte_len(),
        });
    }

    let rgb: RgbImage =
        RgbImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec()).ok_or(
            PreprocessError::BufferMismatch {
                width: frame.width(),
                height: frame.height(),
                expected,
                actual: frame.byte_len(),
            },
        )?;

    let resized = imageops::resize(&rgb, TILE_SIDE, TILE_SIDE, FilterType::Nearest);
    let gray = imageops::grayscale(&resized);

    let mut values = Vec::with_capacity(TILE_LEN);
    for pixel in gray.pixels() {
        let v = pixel.0[0] as f32 / 255.0;
        values.push(if invert { 1.0 - v } else { v });
    }

    Ok(Tile::from_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 13) % 256) as u8;
                pixels.extend_from_slice(&[v, v.wrapping_add(40), v.wrapping_add(80)]);
            }
        }
        Frame::from_rgb8(width, height, pixels)
    }

    #[test]
    fn tile_is_always_28_by_28_in_unit_range() {
        for (w, h) in [(1, 1), (28, 28), (640, 480), (13, 91)] {
            let tile = preprocess(&gradient_frame(w, h), false).unwrap();
            assert_eq!(tile.values().len(), TILE_LEN);
            assert!(tile
                .values()
                .iter()
                .all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn invert_is_elementwise_complement() {
        let frame = gradient_frame(64, 48);
        let plain = preprocess(&frame, false).unwrap();
        let inverted = preprocess(&frame, true).unwrap();

        for (a, b) in plain.values().iter().zip(inverted.values()) {
            assert!((1.0 - a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn solid_frame_maps_to_uniform_tile() {
        let frame = Frame::from_rgb8(16, 16, vec![255u8; 16 * 16 * 3]);
        let tile = preprocess(&frame, false).unwrap();
        assert!(tile.values().iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let inverted = preprocess(&frame, true).unwrap();
        assert!(inverted.values().iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn degenerate_dimensions_are_rejected() {
        let frame = Frame::from_rgb8(0, 480, Vec::new());
        assert!(matches!(
            preprocess(&frame, false),
            Err(PreprocessError::DegenerateFrame { .. })
        ));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let frame = Frame::from_rgb8(10, 10, vec![0u8; 17]);
        assert!(matches!(
            preprocess(&frame, false),
            Err(PreprocessError::BufferMismatch { .. })
        ));
    }

    #[test]
    fn preprocess_is_deterministic() {
        let frame = gradient_frame(320, 240);
        assert_eq!(
            preprocess(&frame, false).unwrap(),
            preprocess(&frame, false).unwrap()
        );
    }
}
