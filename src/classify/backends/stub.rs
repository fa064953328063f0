use crate::classify::backend::ClassifierBackend;
use crate::error::InferenceError;
use crate::tile::Tile;

/// Stub classifier for tests and demos.
///
/// Always predicts the configured peak class with 0.9 probability and
/// spreads the remainder uniformly over the other classes.
pub struct StubClassifier {
    class_count: usize,
    peak: usize,
}

const PEAK_PROBABILITY: f32 = 0.9;

impl StubClassifier {
    /// `peak` is clamped into the class range.
    pub fn new(class_count: usize, peak: usize) -> Self {
        let class_count = class_count.max(1);
        Self {
            class_count,
            peak: peak.min(class_count - 1),
        }
    }
}

impl ClassifierBackend for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn class_count(&self) -> usize {
        self.class_count
    }

    fn infer(&mut self, _tile: &Tile) -> Result<Vec<f32>, InferenceError> {
        let rest = if self.class_count > 1 {
            (1.0 - PEAK_PROBABILITY) / (self.class_count - 1) as f32
        } else {
            0.0
        };

        let mut probabilities = vec![rest; self.class_count];
        probabilities[self.peak] = if self.class_count > 1 {
            PEAK_PROBABILITY
        } else {
            1.0
        };
        Ok(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::tile::preprocess;

    fn any_tile() -> Tile {
        let frame = Frame::from_rgb8(8, 8, vec![128u8; 8 * 8 * 3]);
        preprocess(&frame, false).unwrap()
    }

    #[test]
    fn stub_peaks_at_configured_class() {
        let mut backend = StubClassifier::new(26, 4);
        let probabilities = backend.infer(&any_tile()).unwrap();

        assert_eq!(probabilities.len(), 26);
        assert!((probabilities[4] - 0.9).abs() < 1e-6);
        assert!(probabilities.iter().all(|&p| p >= 0.0));

        let total: f32 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_peak_is_clamped() {
        let mut backend = StubClassifier::new(4, 99);
        let probabilities = backend.infer(&any_tile()).unwrap();
        assert!((probabilities[3] - 0.9).abs() < 1e-6);
    }
}
