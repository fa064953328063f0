use crate::error::InferenceError;
use crate::tile::Tile;

/// Classifier backend trait.
///
/// A backend is an opaque loaded inference artifact: tile in, one
/// probability per letter class out. Implementations must be deterministic
/// for a given tile and must not retain the tile beyond the `infer` call.
pub trait ClassifierBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Length of the probability vector this backend produces.
    fn class_count(&self) -> usize;

    /// Run inference on one tile.
    ///
    /// The returned vector always has exactly `class_count()` entries with
    /// non-negative values.
    fn infer(&mut self, tile: &Tile) -> Result<Vec<f32>, InferenceError>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<(), InferenceError> {
        Ok(())
    }
}
