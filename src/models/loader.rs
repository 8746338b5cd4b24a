//! Pipeline artifact loader

use crate::config::ModelsConfig;
use crate::error::ArtifactLoadError;
use crate::models::artifact::read_artifact;
use crate::models::classifier::RandomForestClassifier;
use crate::models::inference::{
    DimensionReduction, FeatureSelection, InferenceEngine, ProbabilisticClassifier,
};
use crate::models::reducer::PcaReducer;
use crate::models::selector::FeatureSelector;
use std::path::{Path, PathBuf};
use tracing::info;

/// File names of the three artifacts inside the models directory
#[derive(Debug, Clone)]
pub struct ArtifactFiles {
    pub selector: String,
    pub reducer: String,
    pub classifier: String,
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            selector: "feature_selector.json".to_string(),
            reducer: "pca_transformer.json".to_string(),
            classifier: "rf_model.json".to_string(),
        }
    }
}

/// Loader for the selector, reducer and classifier artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the pipeline described by the models configuration
    pub fn load_from_config(config: &ModelsConfig) -> Result<InferenceEngine, ArtifactLoadError> {
        let files = ArtifactFiles {
            selector: config.selector_file.clone(),
            reducer: config.reducer_file.clone(),
            classifier: config.classifier_file.clone(),
        };
        Self::with_threads(config.onnx_threads).load_pipeline(&config.models_dir, &files)
    }

    /// Load all three artifacts from a directory and check the stage chain
    pub fn load_pipeline<P: AsRef<Path>>(
        &self,
        models_dir: P,
        files: &ArtifactFiles,
    ) -> Result<InferenceEngine, ArtifactLoadError> {
        let models_dir = models_dir.as_ref();

        let selector_path = models_dir.join(&files.selector);
        info!(path = %selector_path.display(), "Loading feature selector");
        let selector: FeatureSelector = read_artifact(&selector_path)?;

        let reducer_path = models_dir.join(&files.reducer);
        info!(path = %reducer_path.display(), "Loading reducer");
        let reducer: PcaReducer = read_artifact(&reducer_path)?;
        if let Some(ratio) = reducer.explained_variance_ratio() {
            info!(
                components = reducer.n_components(),
                explained_variance = ratio.iter().sum::<f64>(),
                "Reducer variance retained"
            );
        }

        let classifier_path = models_dir.join(&files.classifier);
        info!(path = %classifier_path.display(), "Loading classifier");
        let classifier = self.load_classifier(classifier_path, reducer.output_width())?;

        info!(
            input_features = selector.input_features().len(),
            selected = selector.output_width(),
            components = reducer.n_components(),
            classifier = %classifier.name(),
            "Artifacts loaded from {}",
            models_dir.display()
        );

        InferenceEngine::new(Box::new(selector), Box::new(reducer), classifier)
    }

    #[cfg(feature = "onnx")]
    fn load_classifier(
        &self,
        path: PathBuf,
        n_features: usize,
    ) -> Result<Box<dyn ProbabilisticClassifier>, ArtifactLoadError> {
        if path.extension().is_some_and(|ext| ext == "onnx") {
            let model =
                crate::models::onnx::OnnxClassifier::load(&path, n_features, self.onnx_threads)?;
            return Ok(Box::new(model));
        }
        self.load_forest(&path)
    }

    #[cfg(not(feature = "onnx"))]
    fn load_classifier(
        &self,
        path: PathBuf,
        _n_features: usize,
    ) -> Result<Box<dyn ProbabilisticClassifier>, ArtifactLoadError> {
        if path.extension().is_some_and(|ext| ext == "onnx") {
            return Err(ArtifactLoadError::Invalid {
                path,
                reason: "ONNX classifiers need the \"onnx\" feature".to_string(),
            });
        }
        self.load_forest(&path)
    }

    fn load_forest(&self, path: &Path) -> Result<Box<dyn ProbabilisticClassifier>, ArtifactLoadError> {
        let forest: RandomForestClassifier = read_artifact(path)?;
        info!(
            trees = forest.n_trees(),
            max_depth = forest.max_depth(),
            "Random forest loaded"
        );
        Ok(Box::new(forest))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::to_artifact_json;
    use std::fs;

    fn write_pipeline(dir: &Path, reducer_width: usize) {
        let selector = FeatureSelector::new(
            crate::feature_extractor::FeatureExtractor::new().feature_names(),
            vec!["amount".to_string(), "oldbalanceOrg".to_string()],
        );
        let reducer = PcaReducer::new(vec![0.0; reducer_width], vec![vec![1.0; reducer_width]]);
        let forest = RandomForestClassifier::new(
            1,
            vec!["legit".to_string(), "fraud".to_string()],
            vec![crate::models::classifier::TreeNode::Leaf {
                value: vec![3.0, 1.0],
            }],
        );

        fs::write(dir.join("feature_selector.json"), to_artifact_json(&selector).unwrap()).unwrap();
        fs::write(dir.join("pca_transformer.json"), to_artifact_json(&reducer).unwrap()).unwrap();
        fs::write(dir.join("rf_model.json"), to_artifact_json(&forest).unwrap()).unwrap();
    }

    #[test]
    fn test_load_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        write_pipeline(dir.path(), 2);

        let engine = ModelLoader::new()
            .load_pipeline(dir.path(), &ArtifactFiles::default())
            .unwrap();
        assert_eq!(engine.selected_count(), 2);
        assert_eq!(engine.component_count(), 1);
        assert_eq!(engine.classifier_name(), "random_forest");
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_pipeline(dir.path(), 2);
        fs::remove_file(dir.path().join("pca_transformer.json")).unwrap();

        let err = ModelLoader::new()
            .load_pipeline(dir.path(), &ArtifactFiles::default())
            .err()
            .unwrap();
        assert!(matches!(err, ArtifactLoadError::Missing { .. }));
    }

    #[test]
    fn test_chain_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_pipeline(dir.path(), 4);

        let err = ModelLoader::new()
            .load_pipeline(dir.path(), &ArtifactFiles::default())
            .err()
            .unwrap();
        assert!(matches!(err, ArtifactLoadError::ChainMismatch { .. }));
    }

    #[test]
    fn test_corrupt_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_pipeline(dir.path(), 2);
        fs::write(dir.path().join("rf_model.json"), "{\"format_version\": 1,").unwrap();

        let err = ModelLoader::new()
            .load_pipeline(dir.path(), &ArtifactFiles::default())
            .err()
            .unwrap();
        assert!(matches!(err, ArtifactLoadError::Corrupt { .. }));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_classifier_needs_feature() {
        let dir = tempfile::tempdir().unwrap();
        write_pipeline(dir.path(), 2);
        let files = ArtifactFiles {
            classifier: "rf_model.onnx".to_string(),
            ..ArtifactFiles::default()
        };

        let err = ModelLoader::new()
            .load_pipeline(dir.path(), &files)
            .err()
            .unwrap();
        match err {
            ArtifactLoadError::Invalid { reason, .. } => {
                assert_eq!(reason, "ONNX classifiers need the \"onnx\" feature");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
