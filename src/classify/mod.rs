mod backend;
mod backends;
mod slot;

pub use backend::ClassifierBackend;
pub use backends::StubClassifier;
pub use slot::{ClassifierSlot, SlotStatus};

#[cfg(feature = "backend-tract")]
pub use backends::TractClassifier;
