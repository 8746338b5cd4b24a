//! ML pipeline artifacts and inference

pub mod artifact;
pub mod classifier;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod reducer;
pub mod selector;

pub use classifier::RandomForestClassifier;
pub use inference::{DimensionReduction, FeatureSelection, InferenceEngine, ProbabilisticClassifier};
pub use loader::{ArtifactFiles, ModelLoader};
pub use reducer::PcaReducer;
pub use selector::FeatureSelector;
